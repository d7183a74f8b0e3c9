//! AWS Cognito user pool implementation of [`RemoteIdentity`].
//!
//! Identities are keyed by the normalized CPF. Passwords are never chosen by
//! the user: they are the CPF followed by a configured suffix, one for the
//! temporary password set at creation and one for the permanent password.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType, MessageActionType};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument};

use customer_identity_core::{CredentialToken, normalize};

use super::{IdentityError, Registration, RemoteIdentity};
use crate::config::CognitoConfig;
use crate::context::CallContext;

/// Cognito-backed identity provider.
pub struct CognitoIdentity {
    client: Client,
    config: CognitoConfig,
}

impl CognitoIdentity {
    /// Build a client for the configured region using the default AWS
    /// credential chain.
    pub async fn from_config(config: &CognitoConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        info!(
            region = %config.region,
            user_pool_id = %config.user_pool_id,
            "Initialized Cognito identity provider"
        );

        Self::new(Client::new(&sdk_config), config.clone())
    }

    /// Wrap an existing SDK client.
    #[must_use]
    pub const fn new(client: Client, config: CognitoConfig) -> Self {
        Self { client, config }
    }

    async fn initiate_password_auth(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &str,
    ) -> Result<CredentialToken, IdentityError> {
        let output = ctx
            .bound(
                self.client
                    .initiate_auth()
                    .auth_flow(AuthFlowType::UserPasswordAuth)
                    .client_id(&self.config.client_id)
                    .auth_parameters("USERNAME", username)
                    .auth_parameters("PASSWORD", password)
                    .send(),
            )
            .await?
            .map_err(|e| map_sdk_error(&e))?;

        output
            .authentication_result()
            .and_then(|result| result.access_token())
            .filter(|token| !token.is_empty())
            .map(CredentialToken::new)
            .ok_or(IdentityError::MissingToken)
    }
}

#[async_trait]
impl RemoteIdentity for CognitoIdentity {
    #[instrument(
        skip(self, ctx, registration),
        fields(cpf = %registration.cpf.masked(), role = %registration.role)
    )]
    async fn register(
        &self,
        ctx: &CallContext,
        registration: Registration<'_>,
    ) -> Result<(), IdentityError> {
        let username = registration.cpf.as_str();
        let group = self.config.group_for(registration.role);

        let attributes = [
            ("name", registration.name),
            ("email", registration.email),
            ("email_verified", "true"),
        ]
        .into_iter()
        .map(|(name, value)| {
            AttributeType::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| IdentityError::Request(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

        ctx.bound(
            self.client
                .admin_create_user()
                .user_pool_id(&self.config.user_pool_id)
                .username(username)
                .temporary_password(format!(
                    "{username}{}",
                    self.config.temp_password_suffix.expose_secret()
                ))
                .message_action(MessageActionType::Suppress)
                .set_user_attributes(Some(attributes))
                .send(),
        )
        .await?
        .map_err(|e| map_sdk_error(&e))?;
        debug!("Identity created");

        ctx.bound(
            self.client
                .admin_set_user_password()
                .user_pool_id(&self.config.user_pool_id)
                .username(username)
                .password(format!(
                    "{username}{}",
                    self.config.password_suffix.expose_secret()
                ))
                .permanent(true)
                .send(),
        )
        .await?
        .map_err(|e| map_sdk_error(&e))?;
        debug!("Permanent password set");

        ctx.bound(
            self.client
                .admin_add_user_to_group()
                .user_pool_id(&self.config.user_pool_id)
                .username(username)
                .group_name(group)
                .send(),
        )
        .await?
        .map_err(|e| map_sdk_error(&e))?;
        debug!(group = %group, "Identity added to group");

        Ok(())
    }

    #[instrument(skip(self, ctx, tax_id))]
    async fn authenticate(
        &self,
        ctx: &CallContext,
        tax_id: &str,
    ) -> Result<CredentialToken, IdentityError> {
        // Usernames are stored as bare digits; punctuation is not a credential.
        let username = normalize(tax_id);
        let password = format!("{username}{}", self.config.password_suffix.expose_secret());
        self.initiate_password_auth(ctx, &username, &password).await
    }

    #[instrument(skip(self, ctx))]
    async fn authenticate_anonymous(
        &self,
        ctx: &CallContext,
    ) -> Result<CredentialToken, IdentityError> {
        self.initiate_password_auth(
            ctx,
            &self.config.anonymous_username,
            self.config.anonymous_password.expose_secret(),
        )
        .await
    }
}

/// Sort an SDK failure into an [`IdentityError`].
fn map_sdk_error<E, R>(err: &SdkError<E, R>) -> IdentityError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::TimeoutError(_) => IdentityError::Timeout,
        SdkError::ServiceError(service) => {
            let inner = service.err();
            inner.code().map_or_else(
                || IdentityError::Service {
                    code: "Unknown".to_owned(),
                    message: DisplayErrorContext(err).to_string(),
                },
                |code| IdentityError::from_code(code, inner.message().unwrap_or_default()),
            )
        }
        SdkError::ConstructionFailure(_) => {
            IdentityError::Request(DisplayErrorContext(err).to_string())
        }
        _ => IdentityError::Transport(DisplayErrorContext(err).to_string()),
    }
}
