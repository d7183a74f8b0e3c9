//! Remote identity provider capability.
//!
//! The services only see the [`RemoteIdentity`] trait: registering an account
//! under a role, authenticating by tax id, and authenticating the shared guest
//! identity. [`CognitoIdentity`] is the production implementation; tests
//! substitute hand-written fakes.

pub mod cognito;

use async_trait::async_trait;
use thiserror::Error;

use customer_identity_core::{AccountKind, CredentialToken, Cpf};

use crate::context::{CallContext, DeadlineExceeded};

pub use cognito::CognitoIdentity;

/// Errors returned by the identity provider.
///
/// Structured provider error codes are sorted into variants here so the
/// classifier never has to know provider-specific names.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider could not be reached (DNS, connection, TLS, I/O).
    #[error("identity provider unreachable: {0}")]
    Transport(String),

    /// The call did not finish before the caller's deadline.
    #[error("identity provider call timed out")]
    Timeout,

    /// The provider refused the credentials.
    #[error("authentication rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// An identity with this username already exists.
    #[error("identity already exists: {0}")]
    Conflict(String),

    /// The provider rejected a parameter (password policy, attribute format).
    #[error("invalid parameter ({code}): {message}")]
    Invalid { code: String, message: String },

    /// The provider is throttling requests.
    #[error("identity provider throttled ({code}): {message}")]
    Throttled { code: String, message: String },

    /// Any other structured provider error.
    #[error("identity provider error ({code}): {message}")]
    Service { code: String, message: String },

    /// Authentication succeeded but no access token was issued.
    #[error("identity provider returned no access token")]
    MissingToken,

    /// The request could not be built locally.
    #[error("invalid identity provider request: {0}")]
    Request(String),
}

impl IdentityError {
    /// Sort a structured provider error code into a variant.
    ///
    /// Accepts codes with or without the `Exception` suffix.
    #[must_use]
    pub fn from_code(code: &str, message: &str) -> Self {
        let name = code.strip_suffix("Exception").unwrap_or(code);
        let (code, message) = (code.to_owned(), message.to_owned());
        match name {
            "NotAuthorized" | "UserNotFound" | "PasswordResetRequired" | "UserNotConfirmed" => {
                Self::Rejected { code, message }
            }
            "UsernameExists" | "AliasExists" => Self::Conflict(message),
            "InvalidParameter" | "InvalidPassword" => Self::Invalid { code, message },
            "TooManyRequests" | "LimitExceeded" => Self::Throttled { code, message },
            _ => Self::Service { code, message },
        }
    }
}

impl From<DeadlineExceeded> for IdentityError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::Timeout
    }
}

/// Data needed to register an account with the identity provider.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub cpf: &'a Cpf,
    pub email: &'a str,
    /// Decides the group the identity is added to.
    pub role: AccountKind,
}

/// Credential issuance capability.
#[async_trait]
pub trait RemoteIdentity: Send + Sync {
    /// Create the identity, set its permanent password and add it to the
    /// group for its role.
    async fn register(
        &self,
        ctx: &CallContext,
        registration: Registration<'_>,
    ) -> Result<(), IdentityError>;

    /// Authenticate an identity by tax id.
    async fn authenticate(
        &self,
        ctx: &CallContext,
        tax_id: &str,
    ) -> Result<CredentialToken, IdentityError>;

    /// Authenticate the well-known guest identity.
    async fn authenticate_anonymous(
        &self,
        ctx: &CallContext,
    ) -> Result<CredentialToken, IdentityError>;
}
