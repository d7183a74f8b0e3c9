//! `PostgreSQL` account repository.
//!
//! One repository instance serves one account kind; the kind picks the table.
//! Queries are built at runtime with `sqlx::query_as` because the table varies
//! by kind.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use customer_identity_core::{Account, AccountId, AccountKind, Cpf};

use super::{AccountStore, RepositoryError};
use crate::context::CallContext;

/// SQL for one account table.
struct Queries {
    insert: &'static str,
    update: &'static str,
    by_id: &'static str,
    by_cpf: &'static str,
}

const CUSTOMER_QUERIES: Queries = Queries {
    insert: "INSERT INTO identity.customer (name, cpf, email) VALUES ($1, $2, $3) RETURNING id",
    update: "UPDATE identity.customer SET name = $2, cpf = $3, email = $4, updated_at = now() WHERE id = $1",
    by_id: "SELECT id, name, cpf, email FROM identity.customer WHERE id = $1",
    by_cpf: "SELECT id, name, cpf, email FROM identity.customer WHERE cpf = $1",
};

const ADMIN_USER_QUERIES: Queries = Queries {
    insert: "INSERT INTO identity.admin_user (name, cpf, email) VALUES ($1, $2, $3) RETURNING id",
    update: "UPDATE identity.admin_user SET name = $2, cpf = $3, email = $4, updated_at = now() WHERE id = $1",
    by_id: "SELECT id, name, cpf, email FROM identity.admin_user WHERE id = $1",
    by_cpf: "SELECT id, name, cpf, email FROM identity.admin_user WHERE cpf = $1",
};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    cpf: String,
    email: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let cpf = Cpf::parse(&row.cpf).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cpf in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            name: row.name,
            cpf,
            email: row.email,
        })
    }
}

/// Map a write error, turning unique violations into `Conflict`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("cpf already registered".to_owned());
    }
    RepositoryError::Database(e)
}

/// Account repository backed by one `PostgreSQL` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
    kind: AccountKind,
}

impl PgAccountStore {
    /// Create a repository for accounts of `kind`.
    #[must_use]
    pub const fn new(pool: PgPool, kind: AccountKind) -> Self {
        Self { pool, kind }
    }

    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        self.kind
    }

    const fn queries(&self) -> &'static Queries {
        match self.kind {
            AccountKind::Customer => &CUSTOMER_QUERIES,
            AccountKind::AdminUser => &ADMIN_USER_QUERIES,
        }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cpf already exists.
    /// Returns `RepositoryError::Timeout` if the deadline expires.
    #[instrument(skip(self, ctx, account), fields(kind = %self.kind, cpf = %account.cpf.masked()))]
    async fn insert(
        &self,
        ctx: &CallContext,
        account: &Account,
    ) -> Result<AccountId, RepositoryError> {
        let id: i64 = ctx
            .bound(
                sqlx::query_scalar(self.queries().insert)
                    .bind(&account.name)
                    .bind(&account.cpf)
                    .bind(&account.email)
                    .fetch_one(&self.pool),
            )
            .await?
            .map_err(map_write_error)?;

        Ok(AccountId::new(id))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has `account.id`.
    /// Returns `RepositoryError::Conflict` if the new cpf belongs to another row.
    #[instrument(skip(self, ctx, account), fields(kind = %self.kind, id = %account.id))]
    async fn save(&self, ctx: &CallContext, account: &Account) -> Result<(), RepositoryError> {
        let result = ctx
            .bound(
                sqlx::query(self.queries().update)
                    .bind(account.id)
                    .bind(&account.name)
                    .bind(&account.cpf)
                    .bind(&account.email)
                    .execute(&self.pool),
            )
            .await?
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(kind = %self.kind))]
    async fn find_by_id(
        &self,
        ctx: &CallContext,
        id: AccountId,
    ) -> Result<Account, RepositoryError> {
        let row = ctx
            .bound(
                sqlx::query_as::<_, AccountRow>(self.queries().by_id)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await??;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    #[instrument(skip(self, ctx, cpf), fields(kind = %self.kind, cpf = %cpf.masked()))]
    async fn find_by_tax_id(
        &self,
        ctx: &CallContext,
        cpf: &Cpf,
    ) -> Result<Account, RepositoryError> {
        let row = ctx
            .bound(
                sqlx::query_as::<_, AccountRow>(self.queries().by_cpf)
                    .bind(cpf)
                    .fetch_optional(&self.pool),
            )
            .await??;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
