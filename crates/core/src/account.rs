//! Account records and the payloads exchanged with callers.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Cpf};

/// The two actor types managed by the service.
///
/// Both share the same orchestration; they differ in the identity provider
/// group they are registered under and the table that stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Customer,
    AdminUser,
}

impl AccountKind {
    /// Component name used when attributing errors.
    #[must_use]
    pub const fn service_name(self) -> &'static str {
        match self {
            Self::Customer => "CustomerService",
            Self::AdminUser => "UserAdminService",
        }
    }

    /// Lowercase label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::AdminUser => "admin_user",
        }
    }
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted account.
///
/// The tax id is always normalized and checksum-valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub cpf: Cpf,
    pub email: String,
}

/// Create/update request body.
///
/// `cpf` is raw user input and is validated by the service, so a malformed
/// tax id reaches the service as a validation failure instead of a decode
/// error. `id` is ignored on create and overridden by the path on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInput {
    #[serde(default)]
    pub id: AccountId,
    pub name: String,
    pub cpf: String,
    pub email: String,
}

impl AccountInput {
    /// Build the account this input describes once its tax id is validated.
    #[must_use]
    pub fn into_account(self, cpf: Cpf) -> Account {
        Account {
            id: self.id,
            name: self.name,
            cpf,
            email: self.email,
        }
    }
}

/// Response to a successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub id: AccountId,
}

/// Access token issued by the identity provider for one login.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredentialToken {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl CredentialToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Whether the provider issued no token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

impl core::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialToken")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Body carrying only a tax id (login, lookup by tax id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxIdForm {
    pub cpf: String,
}
