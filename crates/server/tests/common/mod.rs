//! Hand-written capability fakes shared by the server tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use customer_identity_core::{Account, AccountId, AccountKind, Cpf, CredentialToken};
use customer_identity_server::context::CallContext;
use customer_identity_server::db::{AccountStore, RepositoryError};
use customer_identity_server::identity::{IdentityError, Registration, RemoteIdentity};
use customer_identity_server::services::AccountService;
use customer_identity_server::state::AppState;

pub const VALID_CPF: &str = "171.079.720-73";
pub const VALID_CPF_DIGITS: &str = "17107972073";
pub const OTHER_VALID_CPF: &str = "07073286083";
pub const BAD_CHECKSUM_CPF: &str = "17207972073";

/// Identity provider fake: records calls, fails on demand.
pub struct FakeIdentity {
    token: String,
    register_calls: AtomicUsize,
    login_calls: AtomicUsize,
    anonymous_calls: AtomicUsize,
    register_error: Mutex<Option<IdentityError>>,
    login_error: Mutex<Option<IdentityError>>,
    registrations: Mutex<Vec<(String, AccountKind)>>,
    logins: Mutex<Vec<String>>,
    deadlines: Mutex<Vec<Option<Instant>>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            token: "TOKEN".to_owned(),
            register_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            anonymous_calls: AtomicUsize::new(0),
            register_error: Mutex::new(None),
            login_error: Mutex::new(None),
            registrations: Mutex::new(Vec::new()),
            logins: Mutex::new(Vec::new()),
            deadlines: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `register` call fails with `err`.
    pub fn fail_next_register(&self, err: IdentityError) {
        *self.register_error.lock().unwrap() = Some(err);
    }

    /// The next `authenticate` or `authenticate_anonymous` call fails with `err`.
    pub fn fail_next_login(&self, err: IdentityError) {
        *self.login_error.lock().unwrap() = Some(err);
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn anonymous_calls(&self) -> usize {
        self.anonymous_calls.load(Ordering::SeqCst)
    }

    pub fn registrations(&self) -> Vec<(String, AccountKind)> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }

    /// Deadline seen by every call, in call order.
    pub fn deadlines(&self) -> Vec<Option<Instant>> {
        self.deadlines.lock().unwrap().clone()
    }

    fn record_deadline(&self, ctx: &CallContext) {
        self.deadlines.lock().unwrap().push(ctx.deadline());
    }

    fn take_login_error(&self) -> Result<(), IdentityError> {
        self.login_error.lock().unwrap().take().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl RemoteIdentity for FakeIdentity {
    async fn register(
        &self,
        ctx: &CallContext,
        registration: Registration<'_>,
    ) -> Result<(), IdentityError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.record_deadline(ctx);
        if let Some(err) = self.register_error.lock().unwrap().take() {
            return Err(err);
        }
        self.registrations
            .lock()
            .unwrap()
            .push((registration.cpf.as_str().to_owned(), registration.role));
        Ok(())
    }

    async fn authenticate(
        &self,
        ctx: &CallContext,
        tax_id: &str,
    ) -> Result<CredentialToken, IdentityError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.record_deadline(ctx);
        self.logins.lock().unwrap().push(tax_id.to_owned());
        self.take_login_error()?;
        Ok(CredentialToken::new(self.token.clone()))
    }

    async fn authenticate_anonymous(
        &self,
        ctx: &CallContext,
    ) -> Result<CredentialToken, IdentityError> {
        self.anonymous_calls.fetch_add(1, Ordering::SeqCst);
        self.record_deadline(ctx);
        self.take_login_error()?;
        Ok(CredentialToken::new("GUEST-TOKEN"))
    }
}

/// In-memory store with a unique constraint on cpf.
pub struct FakeStore {
    rows: Mutex<BTreeMap<i64, Account>>,
    next_id: AtomicUsize,
    insert_calls: AtomicUsize,
    save_calls: AtomicUsize,
    find_calls: AtomicUsize,
    insert_error: Mutex<Option<RepositoryError>>,
    last_deadline: Mutex<Option<Instant>>,
    /// Delay applied inside `insert`, to let concurrent calls interleave.
    insert_delay: Duration,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicUsize::new(1),
            insert_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
            insert_error: Mutex::new(None),
            last_deadline: Mutex::new(None),
            insert_delay: Duration::ZERO,
        }
    }
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_insert_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            insert_delay: delay,
            ..Self::default()
        })
    }

    /// Store an account directly and return its ID.
    pub fn seed(&self, name: &str, cpf: &str, email: &str) -> AccountId {
        let id = i64::try_from(self.next_id.fetch_add(1, Ordering::SeqCst)).unwrap();
        let account = Account {
            id: AccountId::new(id),
            name: name.to_owned(),
            cpf: Cpf::parse(cpf).unwrap(),
            email: email.to_owned(),
        };
        self.rows.lock().unwrap().insert(id, account);
        AccountId::new(id)
    }

    pub fn fail_next_insert(&self, err: RepositoryError) {
        *self.insert_error.lock().unwrap() = Some(err);
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.rows.lock().unwrap().get(&id.as_i64()).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn last_deadline(&self) -> Option<Instant> {
        *self.last_deadline.lock().unwrap()
    }

    fn cpf_taken(rows: &BTreeMap<i64, Account>, cpf: &Cpf, except: Option<AccountId>) -> bool {
        rows.values()
            .any(|a| &a.cpf == cpf && Some(a.id) != except)
    }
}

#[async_trait]
impl AccountStore for FakeStore {
    async fn insert(
        &self,
        ctx: &CallContext,
        account: &Account,
    ) -> Result<AccountId, RepositoryError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_deadline.lock().unwrap() = ctx.deadline();
        if let Some(err) = self.insert_error.lock().unwrap().take() {
            return Err(err);
        }
        if !self.insert_delay.is_zero() {
            tokio::time::sleep(self.insert_delay).await;
        }

        let mut rows = self.rows.lock().unwrap();
        if Self::cpf_taken(&rows, &account.cpf, None) {
            return Err(RepositoryError::Conflict("cpf already registered".to_owned()));
        }
        let id = i64::try_from(self.next_id.fetch_add(1, Ordering::SeqCst)).unwrap();
        let mut stored = account.clone();
        stored.id = AccountId::new(id);
        rows.insert(id, stored);
        Ok(AccountId::new(id))
    }

    async fn save(&self, ctx: &CallContext, account: &Account) -> Result<(), RepositoryError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_deadline.lock().unwrap() = ctx.deadline();

        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&account.id.as_i64()) {
            return Err(RepositoryError::NotFound);
        }
        if Self::cpf_taken(&rows, &account.cpf, Some(account.id)) {
            return Err(RepositoryError::Conflict("cpf already registered".to_owned()));
        }
        rows.insert(account.id.as_i64(), account.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        ctx: &CallContext,
        id: AccountId,
    ) -> Result<Account, RepositoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_deadline.lock().unwrap() = ctx.deadline();
        self.get(id).ok_or(RepositoryError::NotFound)
    }

    async fn find_by_tax_id(
        &self,
        ctx: &CallContext,
        cpf: &Cpf,
    ) -> Result<Account, RepositoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_deadline.lock().unwrap() = ctx.deadline();
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|a| &a.cpf == cpf)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

/// Fakes wired into both services.
pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub customers: Arc<FakeStore>,
    pub admin_users: Arc<FakeStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            identity: FakeIdentity::new(),
            customers: FakeStore::new(),
            admin_users: FakeStore::new(),
        }
    }

    pub fn customer_service(&self) -> AccountService {
        AccountService::new(
            AccountKind::Customer,
            self.identity.clone(),
            self.customers.clone(),
        )
    }

    pub fn admin_user_service(&self) -> AccountService {
        AccountService::new(
            AccountKind::AdminUser,
            self.identity.clone(),
            self.admin_users.clone(),
        )
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.customer_service(),
            self.admin_user_service(),
            Duration::from_secs(10),
        )
    }
}

/// A log event seen by [`EventCapture`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Tracing layer recording every event on the current thread.
#[derive(Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}
