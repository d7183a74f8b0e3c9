//! Account orchestration.
//!
//! One [`AccountService`] per account kind. Every operation is a single,
//! fail-fast flow: the first failing step ends it and its error is classified
//! and attributed to the service. Nothing is retried and nothing is shared
//! between calls; concurrent creations of the same tax id are settled by the
//! store's uniqueness constraint.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use customer_identity_core::{
    Account, AccountCreated, AccountId, AccountInput, AccountKind, ClassifiedError, Cpf,
    CredentialToken,
};

use crate::classify::{Classify, attribute};
use crate::context::CallContext;
use crate::db::AccountStore;
use crate::identity::{Registration, RemoteIdentity};

/// Create, update, lookup and login flows for one account kind.
#[derive(Clone)]
pub struct AccountService {
    kind: AccountKind,
    identity: Arc<dyn RemoteIdentity>,
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        kind: AccountKind,
        identity: Arc<dyn RemoteIdentity>,
        store: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            kind,
            identity,
            store,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        self.kind
    }

    /// Check the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the classified store failure.
    pub async fn ping(&self) -> Result<(), ClassifiedError> {
        self.store.ping().await.map_err(|e| self.fail(e))
    }

    /// Register the account with the identity provider, then persist it.
    ///
    /// An invalid tax id stops the flow before any remote or store call. A
    /// failed registration stops it before the store is touched. A failed
    /// insert after a successful registration leaves the remote identity in
    /// place; it is logged so it can be reconciled.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed tax id, otherwise the
    /// classified failure of the step that failed.
    #[instrument(skip(self, ctx, input), fields(kind = %self.kind))]
    pub async fn create(
        &self,
        ctx: &CallContext,
        input: AccountInput,
    ) -> Result<AccountCreated, ClassifiedError> {
        let cpf = self.parse_cpf(&input.cpf)?;
        let account = input.into_account(cpf);

        self.identity
            .register(
                ctx,
                Registration {
                    name: &account.name,
                    cpf: &account.cpf,
                    email: &account.email,
                    role: self.kind,
                },
            )
            .await
            .map_err(|e| self.fail(e))?;

        let id = match self.store.insert(ctx, &account).await {
            Ok(id) => id,
            Err(e) => {
                // Logged here instead of in `attribute`, one event per failure.
                let classified = e.classify().attributed(self.kind.service_name());
                let kind = classified.kind();
                if kind.is_server_error() {
                    error!(
                        kind = %kind,
                        cpf = %account.cpf.masked(),
                        request_id = ctx.request_id().unwrap_or_default(),
                        error = %classified.message(),
                        "Identity registered but account insert failed; remote identity is orphaned"
                    );
                } else {
                    warn!(
                        kind = %kind,
                        cpf = %account.cpf.masked(),
                        request_id = ctx.request_id().unwrap_or_default(),
                        error = %classified.message(),
                        "Identity registered but account insert rejected; remote identity is orphaned"
                    );
                }
                return Err(classified);
            }
        };

        info!(id = %id, cpf = %account.cpf.masked(), "Account created");
        Ok(AccountCreated { id })
    }

    /// Overwrite a stored account. The identity provider profile is not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed tax id, `NotFound` when
    /// the id does not exist, `Conflict` when the tax id belongs to another
    /// account.
    #[instrument(skip(self, ctx, input), fields(kind = %self.kind, id = %input.id))]
    pub async fn update(&self, ctx: &CallContext, input: AccountInput) -> Result<(), ClassifiedError> {
        let cpf = self.parse_cpf(&input.cpf)?;
        let account = input.into_account(cpf);

        self.store
            .save(ctx, &account)
            .await
            .map_err(|e| self.fail(e))
    }

    /// # Errors
    ///
    /// Returns `NotFound` when no account has `id`.
    #[instrument(skip(self, ctx), fields(kind = %self.kind))]
    pub async fn get_by_id(&self, ctx: &CallContext, id: AccountId) -> Result<Account, ClassifiedError> {
        self.store
            .find_by_id(ctx, id)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Look up an account by tax id, with or without punctuation.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed tax id without querying
    /// the store, `NotFound` when no account has it.
    #[instrument(skip(self, ctx, tax_id), fields(kind = %self.kind))]
    pub async fn get_by_tax_id(&self, ctx: &CallContext, tax_id: &str) -> Result<Account, ClassifiedError> {
        let cpf = self.parse_cpf(tax_id)?;
        self.store
            .find_by_tax_id(ctx, &cpf)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Authenticate with the identity provider. The tax id is passed through
    /// unvalidated; the provider decides what a valid credential is.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the provider rejects the credentials.
    #[instrument(skip(self, ctx, tax_id), fields(kind = %self.kind))]
    pub async fn login(&self, ctx: &CallContext, tax_id: &str) -> Result<CredentialToken, ClassifiedError> {
        self.identity
            .authenticate(ctx, tax_id)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Authenticate the shared guest identity.
    ///
    /// # Errors
    ///
    /// Returns the classified identity provider failure.
    #[instrument(skip(self, ctx), fields(kind = %self.kind))]
    pub async fn login_anonymous(&self, ctx: &CallContext) -> Result<CredentialToken, ClassifiedError> {
        self.identity
            .authenticate_anonymous(ctx)
            .await
            .map_err(|e| self.fail(e))
    }

    fn parse_cpf(&self, raw: &str) -> Result<Cpf, ClassifiedError> {
        Cpf::parse(raw)
            .map_err(|e| self.fail(ClassifiedError::validation(format!("Invalid CPF: {e}"))))
    }

    fn fail(&self, err: impl Classify) -> ClassifiedError {
        attribute(err, self.kind.service_name())
    }
}
