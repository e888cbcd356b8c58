use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::watch;

use crate::marketplace::domain::{
    BusinessId, BusinessProfile, JobId, JobPosting, SalaryUnit, WorkerId, WorkerProfile,
};
use crate::marketplace::identity::{AuthError, AuthIdentity, Credentials, IdentityProvider};
use crate::marketplace::store::{
    Documents, MarketplaceStore, ProfileSubscription, StoreError,
};
use crate::marketplace::validation::AccountRequest;
use crate::marketplace::{
    IdentityId, MarketplaceService, MemoryStore, RegisterBusinessRequest, RegisterWorkerRequest,
    RetryPolicy,
};

pub(super) type TestService = MarketplaceService<MemoryStore, MemoryIdentity>;

pub(super) fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(500),
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryStore>, Arc<MemoryIdentity>) {
    let store = Arc::new(MemoryStore::new());
    let identities = Arc::new(MemoryIdentity::default());
    let service = Arc::new(MarketplaceService::new(
        store.clone(),
        identities.clone(),
        quick_retry(),
    ));
    (service, store, identities)
}

pub(super) fn account(username: &str) -> AccountRequest {
    let email = format!("{}@example.com", username.to_lowercase());
    AccountRequest {
        email: email.clone(),
        confirm_email: email,
        username: username.to_string(),
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        password: "secret123".to_string(),
        confirm_password: "secret123".to_string(),
    }
}

pub(super) fn worker_request(username: &str) -> RegisterWorkerRequest {
    RegisterWorkerRequest {
        account: account(username),
        profile: WorkerProfile {
            headline: Some("Line cook".to_string()),
            skills: vec!["Cooking".to_string(), "Food Safety".to_string()],
            salary_min: Some(16),
            salary_max: Some(22),
            salary_unit: Some(SalaryUnit::Hour),
            ..WorkerProfile::default()
        },
    }
}

pub(super) fn business_request(username: &str) -> RegisterBusinessRequest {
    RegisterBusinessRequest {
        account: account(username),
        profile: BusinessProfile {
            name: "Harbor Diner".to_string(),
            industry: Some("Hospitality".to_string()),
            ..BusinessProfile::default()
        },
    }
}

pub(super) fn posting(title: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        description: format!("{title} wanted for the weekend shift"),
        industry: Some("Hospitality".to_string()),
        salary_min: Some(15),
        salary_max: Some(20),
        salary_unit: Some(SalaryUnit::Hour),
        ..JobPosting::default()
    }
}

pub(super) async fn register_worker(service: &TestService, username: &str) -> WorkerId {
    service
        .register_worker(worker_request(username))
        .await
        .expect("worker registers")
        .record
        .id
}

pub(super) async fn register_business(service: &TestService, username: &str) -> BusinessId {
    service
        .register_business(business_request(username))
        .await
        .expect("business registers")
        .record
        .id
}

pub(super) async fn post_job(service: &TestService, business: &BusinessId, title: &str) -> JobId {
    service
        .post_job(business, posting(title))
        .await
        .expect("job posted")
        .record
        .id
}

/// One worker, one business and one open job.
pub(super) async fn marketplace() -> (Arc<TestService>, WorkerId, BusinessId, JobId) {
    let (service, _, _) = build_service();
    let worker = register_worker(&service, "dana").await;
    let business = register_business(&service, "harbor").await;
    let job = post_job(&service, &business, "Line Cook").await;
    (service, worker, business, job)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

struct Account {
    id: IdentityId,
    password: String,
}

/// Identity provider keeping accounts in memory.
pub(super) struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    sequence: AtomicU64,
    session: watch::Sender<Option<AuthIdentity>>,
    disabled: Mutex<Vec<String>>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(1),
            session,
            disabled: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryIdentity {
    pub(super) fn disable(&self, email: &str) {
        self.disabled
            .lock()
            .expect("disabled mutex poisoned")
            .push(email.to_string());
    }

    pub(super) fn account_count(&self) -> usize {
        self.accounts.lock().expect("accounts mutex poisoned").len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError> {
        if credentials.password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().expect("accounts mutex poisoned");
        if accounts.contains_key(&credentials.email) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let id = IdentityId(format!(
            "uid-{:04}",
            self.sequence.fetch_add(1, Ordering::Relaxed)
        ));
        accounts.insert(
            credentials.email.clone(),
            Account {
                id: id.clone(),
                password: credentials.password.clone(),
            },
        );
        let identity = AuthIdentity {
            id,
            email: credentials.email.clone(),
        };
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError> {
        if self
            .disabled
            .lock()
            .expect("disabled mutex poisoned")
            .contains(&credentials.email)
        {
            return Err(AuthError::UserDisabled);
        }
        let accounts = self.accounts.lock().expect("accounts mutex poisoned");
        match accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password => {
                let identity = AuthIdentity {
                    id: account.id.clone(),
                    email: credentials.email.clone(),
                };
                self.session.send_replace(Some(identity.clone()));
                Ok(identity)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_out(&self, _identity: &IdentityId) -> Result<(), AuthError> {
        self.session.send_replace(None);
        Ok(())
    }

    fn current(&self) -> Option<AuthIdentity> {
        self.session.borrow().clone()
    }

    fn session_changes(&self) -> watch::Receiver<Option<AuthIdentity>> {
        self.session.subscribe()
    }
}

/// Store whose first `failures` transactions fail with a transient error.
pub(super) struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
    pub(super) attempts: AtomicU32,
}

impl FlakyStore {
    pub(super) fn failing(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    fn should_fail(&self) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl MarketplaceStore for FlakyStore {
    async fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Documents) -> Result<T, E> + Send + 'static,
    {
        if self.should_fail() {
            return Err(E::from(StoreError::Unavailable("backend offline".to_string())));
        }
        self.inner.transact(op).await
    }

    async fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&Documents) -> Result<T, E> + Send + 'static,
    {
        self.inner.read(op).await
    }

    fn subscribe_profile(&self, identity: &IdentityId) -> ProfileSubscription {
        self.inner.subscribe_profile(identity)
    }

    fn live_subscriptions(&self, identity: &IdentityId) -> usize {
        self.inner.live_subscriptions(identity)
    }
}
