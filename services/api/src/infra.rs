use async_trait::async_trait;
use flowjob::config::StoreConfig;
use flowjob::marketplace::validation::{is_valid_email, PASSWORD_MIN_LEN};
use flowjob::marketplace::{
    AuthError, AuthIdentity, Credentials, IdentityId, IdentityProvider, MarketplaceService,
    MemoryStore, RetryPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

pub(crate) type ApiService = MarketplaceService<MemoryStore, InMemoryIdentityProvider>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(config: &StoreConfig) -> Arc<ApiService> {
    Arc::new(MarketplaceService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(InMemoryIdentityProvider::default()),
        RetryPolicy::from_config(config),
    ))
}

struct StoredAccount {
    id: IdentityId,
    password: String,
}

/// Process-local stand-in for the hosted identity service.
pub(crate) struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    session: watch::Sender<Option<AuthIdentity>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
        }
    }
}

impl InMemoryIdentityProvider {
    fn accounts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredAccount>>, AuthError> {
        self.accounts.lock().map_err(|_| AuthError::Provider {
            code: "auth/internal-error".to_string(),
            message: "account registry unavailable".to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if credentials.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthError::WeakPassword);
        }

        let mut accounts = self.accounts()?;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let id = IdentityId(Uuid::new_v4().to_string());
        accounts.insert(
            email.clone(),
            StoredAccount {
                id: id.clone(),
                password: credentials.password.clone(),
            },
        );
        drop(accounts);

        let identity = AuthIdentity { id, email };
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        let identity = {
            let accounts = self.accounts()?;
            match accounts.get(&email) {
                Some(account) if account.password == credentials.password => AuthIdentity {
                    id: account.id.clone(),
                    email,
                },
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self, identity: &IdentityId) -> Result<(), AuthError> {
        self.session.send_if_modified(|current| {
            if current.as_ref().is_some_and(|active| &active.id == identity) {
                *current = None;
                true
            } else {
                false
            }
        });
        Ok(())
    }

    fn current(&self) -> Option<AuthIdentity> {
        self.session.borrow().clone()
    }

    fn session_changes(&self) -> watch::Receiver<Option<AuthIdentity>> {
        self.session.subscribe()
    }
}
