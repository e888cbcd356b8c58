use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use super::domain::{
    BusinessId, BusinessRecord, BusinessView, IdentityId, JobId, JobRecord, JobView, MatchRecord,
    PairState, Role, WorkerId, WorkerRecord, WorkerView,
};
use super::matching::MatchLedger;

/// Error enumeration for document store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether retrying the same call later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// The part of a profile document the navigation gate reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSnapshot {
    pub identity: IdentityId,
    pub role: Role,
    #[serde(rename = "profileComplete")]
    pub profile_complete: bool,
    pub last_updated_at: DateTime<Utc>,
}

/// Live view of one identity's profile. Dropping the handle ends the subscription.
#[derive(Debug)]
pub struct ProfileSubscription {
    receiver: watch::Receiver<Option<ProfileSnapshot>>,
}

impl ProfileSubscription {
    pub fn new(receiver: watch::Receiver<Option<ProfileSnapshot>>) -> Self {
        Self { receiver }
    }

    /// Latest snapshot seen; `None` while the profile document does not exist.
    pub fn current(&self) -> Option<ProfileSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> Result<Option<ProfileSnapshot>, StoreError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("profile feed closed".to_string()))?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

/// Document collections plus the match ledger, as seen inside one transaction.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    workers: HashMap<WorkerId, WorkerRecord>,
    businesses: HashMap<BusinessId, BusinessRecord>,
    jobs: HashMap<JobId, JobRecord>,
    ledger: MatchLedger,
    touched: BTreeSet<IdentityId>,
}

impl Documents {
    pub fn worker(&self, id: &WorkerId) -> Option<&WorkerRecord> {
        self.workers.get(id)
    }

    pub fn worker_mut(&mut self, id: &WorkerId) -> Option<&mut WorkerRecord> {
        let record = self.workers.get_mut(id)?;
        self.touched.insert(IdentityId::from(id));
        Some(record)
    }

    pub fn business(&self, id: &BusinessId) -> Option<&BusinessRecord> {
        self.businesses.get(id)
    }

    pub fn business_mut(&mut self, id: &BusinessId) -> Option<&mut BusinessRecord> {
        let record = self.businesses.get_mut(id)?;
        self.touched.insert(IdentityId::from(id));
        Some(record)
    }

    pub fn job(&self, id: &JobId) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    pub fn job_mut(&mut self, id: &JobId) -> Option<&mut JobRecord> {
        self.jobs.get_mut(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    pub fn contains_identity(&self, identity: &IdentityId) -> bool {
        self.workers.contains_key(&WorkerId::from(identity))
            || self.businesses.contains_key(&BusinessId::from(identity))
    }

    /// Case-insensitive username lookup; empty usernames never collide.
    pub fn username_taken(&self, username_lowercase: &str) -> bool {
        if username_lowercase.is_empty() {
            return false;
        }
        self.workers
            .values()
            .map(|worker| &worker.account)
            .chain(self.businesses.values().map(|business| &business.account))
            .any(|account| account.username_lowercase == username_lowercase)
    }

    pub fn insert_worker(&mut self, record: WorkerRecord) -> Result<(), StoreError> {
        if self.contains_identity(&IdentityId::from(&record.id)) {
            return Err(StoreError::Conflict(format!("identity {} exists", record.id)));
        }
        self.touched.insert(IdentityId::from(&record.id));
        self.workers.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn insert_business(&mut self, record: BusinessRecord) -> Result<(), StoreError> {
        if self.contains_identity(&IdentityId::from(&record.id)) {
            return Err(StoreError::Conflict(format!("identity {} exists", record.id)));
        }
        self.touched.insert(IdentityId::from(&record.id));
        self.businesses.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn insert_job(&mut self, record: JobRecord) -> Result<(), StoreError> {
        if self.jobs.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!("job {} exists", record.id)));
        }
        self.jobs.insert(record.id.clone(), record);
        Ok(())
    }

    /// Add a pair to the match ledger. Returns false when the pair was already matched.
    pub fn record_match(&mut self, record: MatchRecord) -> bool {
        self.touched.insert(IdentityId::from(&record.worker_id));
        self.ledger.insert(record)
    }

    pub fn pair_state(&self, worker_id: &WorkerId, job_id: &JobId) -> PairState {
        if self.ledger.contains(worker_id, job_id) {
            return PairState::Matched;
        }
        if self
            .jobs
            .get(job_id)
            .is_some_and(|job| job.rejected.contains_key(worker_id))
        {
            return PairState::Rejected;
        }
        match self.workers.get(worker_id) {
            Some(worker) if worker.disliked_jobs.contains_key(job_id) => PairState::Disliked,
            Some(worker) if worker.liked_jobs.contains(job_id) => PairState::Liked,
            _ => PairState::Untouched,
        }
    }

    pub fn worker_view(&self, id: &WorkerId) -> Option<WorkerView> {
        let record = self.workers.get(id)?.clone();
        Some(WorkerView {
            matched_jobs: self.ledger.jobs_for(id),
            role: Role::Worker,
            record,
        })
    }

    pub fn business_view(&self, id: &BusinessId) -> Option<BusinessView> {
        let record = self.businesses.get(id)?.clone();
        Some(BusinessView {
            record,
            role: Role::Business,
        })
    }

    pub fn job_view(&self, id: &JobId) -> Option<JobView> {
        let record = self.jobs.get(id)?.clone();
        Some(JobView {
            matches: self.ledger.workers_for(id),
            record,
        })
    }

    pub fn profile_snapshot(&self, identity: &IdentityId) -> Option<ProfileSnapshot> {
        if let Some(worker) = self.workers.get(&WorkerId::from(identity)) {
            return Some(ProfileSnapshot {
                identity: identity.clone(),
                role: Role::Worker,
                profile_complete: worker.profile_complete,
                last_updated_at: worker.last_updated_at,
            });
        }
        self.businesses
            .get(&BusinessId::from(identity))
            .map(|business| ProfileSnapshot {
                identity: identity.clone(),
                role: Role::Business,
                profile_complete: business.profile_complete,
                last_updated_at: business.last_updated_at,
            })
    }

    /// Identities whose profile documents were written since the last call.
    pub fn take_touched(&mut self) -> BTreeSet<IdentityId> {
        std::mem::take(&mut self.touched)
    }
}

/// Transactional document store backing the marketplace.
///
/// `transact` applies `op` to the documents and commits every write it made, or none of
/// them when `op` fails. Implementations for remote backends map this onto their native
/// multi-document transaction.
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    async fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Documents) -> Result<T, E> + Send + 'static;

    async fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&Documents) -> Result<T, E> + Send + 'static;

    fn subscribe_profile(&self, identity: &IdentityId) -> ProfileSubscription;

    /// Number of live profile subscriptions for `identity`.
    fn live_subscriptions(&self, identity: &IdentityId) -> usize;
}
