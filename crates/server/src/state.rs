//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use customer_identity_core::AccountKind;

use crate::config::ServerConfig;
use crate::db::PgAccountStore;
use crate::identity::{CognitoIdentity, RemoteIdentity};
use crate::services::AccountService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// account services of both kinds.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    customers: AccountService,
    admin_users: AccountService,
    call_timeout: Duration,
}

impl AppState {
    /// Create a new application state from already-built services.
    ///
    /// # Arguments
    ///
    /// * `customers` - Service for `AccountKind::Customer`
    /// * `admin_users` - Service for `AccountKind::AdminUser`
    /// * `call_timeout` - Deadline applied to each request
    #[must_use]
    pub fn new(customers: AccountService, admin_users: AccountService, call_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                customers,
                admin_users,
                call_timeout,
            }),
        }
    }

    /// Wire the production Cognito client and `PostgreSQL` stores.
    pub async fn from_config(config: &ServerConfig, pool: PgPool) -> Self {
        let identity: Arc<dyn RemoteIdentity> =
            Arc::new(CognitoIdentity::from_config(&config.cognito).await);

        let customers = AccountService::new(
            AccountKind::Customer,
            Arc::clone(&identity),
            Arc::new(PgAccountStore::new(pool.clone(), AccountKind::Customer)),
        );
        let admin_users = AccountService::new(
            AccountKind::AdminUser,
            identity,
            Arc::new(PgAccountStore::new(pool, AccountKind::AdminUser)),
        );

        Self::new(customers, admin_users, config.call_timeout)
    }

    /// Get the customer account service.
    #[must_use]
    pub fn customers(&self) -> &AccountService {
        &self.inner.customers
    }

    /// Get the admin user account service.
    #[must_use]
    pub fn admin_users(&self) -> &AccountService {
        &self.inner.admin_users
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        self.inner.call_timeout
    }
}
