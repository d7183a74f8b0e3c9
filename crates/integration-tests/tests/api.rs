//! End-to-end tests against a running identity server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`ci-cli migrate`)
//! - The server running (`cargo run -p customer-identity-server`)
//! - A Cognito test user pool configured for the server
//!
//! Set `IDENTITY_BASE_URL` if the server is not on `http://localhost:3210`.

use customer_identity_integration_tests::{base_url, unique_cpf};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

fn client() -> Client {
    Client::new()
}

async fn signup(client: &Client, path: &str, cpf: &str) -> reqwest::Response {
    client
        .post(format!("{}{path}", base_url()))
        .json(&json!({
            "name": "Integration Test",
            "cpf": cpf,
            "email": format!("it-{cpf}@example.com"),
        }))
        .send()
        .await
        .expect("Failed to call signup")
}

// ============================================================================
// Local-only paths (no Cognito round trip)
// ============================================================================

#[tokio::test]
#[ignore = "Requires running identity server"]
async fn test_health_and_readiness() {
    let client = client();
    for path in ["/health", "/health/ready"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to call health");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running identity server"]
async fn test_signup_rejects_invalid_cpf() {
    let resp = signup(&client(), "/auth/signup", "111.111.111-11").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["error"], "VALIDATION");
}

#[tokio::test]
#[ignore = "Requires running identity server"]
async fn test_request_id_is_echoed() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .header("x-request-id", "it-request-1")
        .send()
        .await
        .expect("Failed to call health");

    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("it-request-1")
    );
}

// ============================================================================
// Full flows (Cognito test pool)
// ============================================================================

#[tokio::test]
#[ignore = "Requires running identity server and Cognito test pool"]
async fn test_customer_signup_login_lookup() {
    let client = client();
    let cpf = unique_cpf();

    let resp = signup(&client, "/auth/signup", &cpf).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = resp.json().await.expect("json body");
    let id = created["id"].as_i64().expect("numeric id");
    assert!(id > 0);

    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "cpf": cpf }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
    let token: Value = resp.json().await.expect("json body");
    assert!(!token["accessToken"].as_str().unwrap_or_default().is_empty());

    let resp = client
        .get(format!("{}/api/customers/{cpf}", base_url()))
        .send()
        .await
        .expect("Failed to look up customer");
    assert_eq!(resp.status(), StatusCode::OK);
    let account: Value = resp.json().await.expect("json body");
    assert_eq!(account["id"], id);
    assert_eq!(account["cpf"], cpf);
}

#[tokio::test]
#[ignore = "Requires running identity server and Cognito test pool"]
async fn test_duplicate_signup_conflicts() {
    let client = client();
    let cpf = unique_cpf();

    let first = signup(&client, "/auth/admin/signup", &cpf).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = signup(&client, "/auth/admin/signup", &cpf).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running identity server and Cognito test pool"]
async fn test_unknown_login_issues_token() {
    let resp = client()
        .post(format!("{}/auth/login/unknown", base_url()))
        .send()
        .await
        .expect("Failed to log in as guest");

    assert_eq!(resp.status(), StatusCode::OK);
    let token: Value = resp.json().await.expect("json body");
    assert!(token["accessToken"].is_string());
}
