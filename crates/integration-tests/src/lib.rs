//! Integration tests for the customer identity service.
//!
//! # Running Tests
//!
//! ```bash
//! # Store tests need a PostgreSQL database
//! export IDENTITY_DATABASE_URL=postgres://localhost/identity_test
//! cargo test -p customer-identity-integration-tests -- --ignored account_store
//!
//! # API tests need a running server wired to a Cognito test pool
//! export IDENTITY_BASE_URL=http://localhost:3210
//! cargo test -p customer-identity-integration-tests -- --ignored api
//! ```
//!
//! Every test here is `#[ignore]`d so the default test run stays hermetic.

#![allow(clippy::missing_panics_doc)]

use customer_identity_server::{config, db};
use sqlx::PgPool;
use uuid::Uuid;

/// Connect to the test database and bring its schema up to date.
pub async fn test_pool() -> PgPool {
    let url = config::database_url_from_env().expect("IDENTITY_DATABASE_URL must be set");
    let pool = db::create_pool(&url)
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Base URL of a running identity server.
#[must_use]
pub fn base_url() -> String {
    let _ = dotenvy::dotenv();
    std::env::var("IDENTITY_BASE_URL").unwrap_or_else(|_| "http://localhost:3210".to_owned())
}

/// A fresh valid CPF (digits only), so reruns never collide.
#[must_use]
pub fn unique_cpf() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let mut digits: Vec<u32> = bytes.iter().take(9).map(|b| u32::from(*b % 10)).collect();

    // All-equal digit sequences are rejected even with matching check digits.
    if digits.windows(2).all(|w| w.first() == w.last())
        && let Some(first) = digits.first_mut()
    {
        *first = (*first + 1) % 10;
    }

    digits.push(check_digit(&digits));
    digits.push(check_digit(&digits));
    digits.iter().map(ToString::to_string).collect()
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = u32::try_from(digits.len()).unwrap_or(0) + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=weight_start).rev())
        .map(|(d, w)| d * w)
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use customer_identity_core::Cpf;

    #[test]
    fn test_check_digits_match_known_cpf() {
        let base = [1, 7, 1, 0, 7, 9, 7, 2, 0];
        assert_eq!(check_digit(&base), 7);
        let mut ten = base.to_vec();
        ten.push(7);
        assert_eq!(check_digit(&ten), 3);
    }

    #[test]
    fn test_unique_cpf_is_valid() {
        for _ in 0..50 {
            let raw = unique_cpf();
            let cpf = Cpf::parse(&raw).unwrap();
            assert_eq!(cpf.as_str(), raw);
        }
    }
}
