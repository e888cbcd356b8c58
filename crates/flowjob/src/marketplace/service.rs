use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{
    AccountInfo, BusinessDecision, BusinessId, BusinessProfile, BusinessRecord, BusinessView,
    DecisionOutcome, IdentityId, JobId, JobPosting, JobRecord, JobView, MatchRecord, PairState,
    Role, SwipeDirection, SwipeOutcome, WorkerId, WorkerProfile, WorkerRecord, WorkerView,
};
use super::error::{MarketplaceError, RecordKind};
use super::gate::{self, GateRoute, GateTransition};
use super::identity::{AuthIdentity, Credentials, IdentityProvider};
use super::retry::{self, RetryPolicy};
use super::store::{Documents, MarketplaceStore, ProfileSnapshot};
use super::swipes;
use super::validation::{
    validate_account, validate_business_profile, validate_job_posting, validate_worker_profile,
    AccountRequest,
};

/// Sign-up payload for a worker account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterWorkerRequest {
    #[serde(flatten)]
    pub account: AccountRequest,
    #[serde(default)]
    pub profile: WorkerProfile,
}

/// Sign-up payload for a business account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterBusinessRequest {
    #[serde(flatten)]
    pub account: AccountRequest,
    #[serde(default)]
    pub profile: BusinessProfile,
}

/// Whether [`MarketplaceService::ensure_profile_exists`] had to create a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioning {
    Created,
    Existing,
}

/// Marketplace operations over a transactional store and an identity provider.
///
/// Every store call is bounded by the configured timeout and retried on transient
/// failures. Swipes, decisions and match promotion run in one transaction each.
pub struct MarketplaceService<S, P> {
    store: Arc<S>,
    identities: Arc<P>,
    retry: RetryPolicy,
}

impl<S, P> MarketplaceService<S, P>
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identities: Arc<P>, retry: RetryPolicy) -> Self {
        Self {
            store,
            identities,
            retry,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn identities(&self) -> &Arc<P> {
        &self.identities
    }

    async fn write<T, F>(&self, operation: &'static str, op: F) -> Result<T, MarketplaceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Documents) -> Result<T, MarketplaceError> + Clone + Send + 'static,
    {
        let store = &*self.store;
        retry::run(self.retry, operation, move || store.transact(op.clone())).await
    }

    async fn read<T, F>(&self, operation: &'static str, op: F) -> Result<T, MarketplaceError>
    where
        T: Send + 'static,
        F: FnOnce(&Documents) -> Result<T, MarketplaceError> + Clone + Send + 'static,
    {
        let store = &*self.store;
        retry::run(self.retry, operation, move || store.read(op.clone())).await
    }

    async fn ensure_username_available(&self, username: &str) -> Result<(), MarketplaceError> {
        let lowercase = username.to_lowercase();
        let taken = self
            .read("username_lookup", move |documents| {
                Ok(documents.username_taken(&lowercase))
            })
            .await?;
        if taken {
            return Err(MarketplaceError::UsernameTaken(username.to_string()));
        }
        Ok(())
    }

    async fn sign_up(
        &self,
        request: &AccountRequest,
        account: &AccountInfo,
    ) -> Result<AuthIdentity, MarketplaceError> {
        validate_account(request)?;
        self.ensure_username_available(&account.username).await?;
        let credentials = Credentials::new(account.email.clone(), request.password.clone());
        Ok(self.identities.sign_up(&credentials).await?)
    }

    /// Create the auth identity and an empty worker document.
    #[instrument(skip_all, fields(username = %request.account.username))]
    pub async fn register_worker(
        &self,
        request: RegisterWorkerRequest,
    ) -> Result<WorkerView, MarketplaceError> {
        validate_worker_profile(&request.profile)?;
        let account = request.account.account_info();
        let identity = self.sign_up(&request.account, &account).await?;

        let id = WorkerId::from(&identity.id);
        let record = WorkerRecord::new(id.clone(), account, request.profile, Utc::now());
        let view_id = id.clone();
        let result = self
            .write("register_worker", move |documents| {
                if documents.username_taken(&record.account.username_lowercase) {
                    return Err(MarketplaceError::UsernameTaken(record.account.username));
                }
                documents.insert_worker(record)?;
                documents
                    .worker_view(&view_id)
                    .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, &view_id))
            })
            .await;

        match &result {
            Ok(_) => info!(worker = %id, "worker registered"),
            Err(error) => warn!(
                identity = %identity.id,
                %error,
                "worker profile not created after sign-up"
            ),
        }
        result
    }

    /// Create the auth identity and an empty business document.
    #[instrument(skip_all, fields(username = %request.account.username))]
    pub async fn register_business(
        &self,
        request: RegisterBusinessRequest,
    ) -> Result<BusinessView, MarketplaceError> {
        let account = request.account.account_info();
        let identity = self.sign_up(&request.account, &account).await?;

        let id = BusinessId::from(&identity.id);
        let record = BusinessRecord::new(id.clone(), account, request.profile, Utc::now());
        let view_id = id.clone();
        let result = self
            .write("register_business", move |documents| {
                if documents.username_taken(&record.account.username_lowercase) {
                    return Err(MarketplaceError::UsernameTaken(record.account.username));
                }
                documents.insert_business(record)?;
                documents
                    .business_view(&view_id)
                    .ok_or_else(|| MarketplaceError::not_found(RecordKind::Business, &view_id))
            })
            .await;

        match &result {
            Ok(_) => info!(business = %id, "business registered"),
            Err(error) => warn!(
                identity = %identity.id,
                %error,
                "business profile not created after sign-up"
            ),
        }
        result
    }

    /// Create an empty profile for `identity` when none exists yet.
    pub async fn ensure_profile_exists(
        &self,
        identity: &AuthIdentity,
        role: Role,
    ) -> Result<Provisioning, MarketplaceError> {
        let id = identity.id.clone();
        let account = AccountInfo {
            email: identity.email.trim().to_lowercase(),
            ..AccountInfo::default()
        };
        let at = Utc::now();

        let provisioning = self
            .write("ensure_profile_exists", move |documents| {
                if documents.contains_identity(&id) {
                    return Ok(Provisioning::Existing);
                }
                match role {
                    Role::Worker => documents.insert_worker(WorkerRecord::new(
                        WorkerId::from(&id),
                        account,
                        WorkerProfile::default(),
                        at,
                    ))?,
                    Role::Business => documents.insert_business(BusinessRecord::new(
                        BusinessId::from(&id),
                        account,
                        BusinessProfile::default(),
                        at,
                    ))?,
                }
                Ok(Provisioning::Created)
            })
            .await?;

        if provisioning == Provisioning::Created {
            info!(identity = %identity.id, role = role.label(), "default profile provisioned");
        }
        Ok(provisioning)
    }

    pub async fn update_worker_profile(
        &self,
        worker_id: &WorkerId,
        profile: WorkerProfile,
    ) -> Result<WorkerView, MarketplaceError> {
        validate_worker_profile(&profile)?;
        let id = worker_id.clone();
        let at = Utc::now();
        self.write("update_worker_profile", move |documents| {
            let worker = documents
                .worker_mut(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, &id))?;
            worker.profile = profile;
            worker.last_updated_at = at;
            documents
                .worker_view(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, &id))
        })
        .await
    }

    pub async fn update_business_profile(
        &self,
        business_id: &BusinessId,
        profile: BusinessProfile,
    ) -> Result<BusinessView, MarketplaceError> {
        validate_business_profile(&profile)?;
        let id = business_id.clone();
        let at = Utc::now();
        self.write("update_business_profile", move |documents| {
            let business = documents
                .business_mut(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Business, &id))?;
            business.profile = profile;
            business.last_updated_at = at;
            documents
                .business_view(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Business, &id))
        })
        .await
    }

    #[instrument(skip(self, posting), fields(title = %posting.title))]
    pub async fn post_job(
        &self,
        business_id: &BusinessId,
        posting: JobPosting,
    ) -> Result<JobView, MarketplaceError> {
        validate_job_posting(&posting)?;
        let business_id = business_id.clone();
        let job_id = JobId(Uuid::new_v4().to_string());
        let at = Utc::now();

        let view = self
            .write("post_job", move |documents| {
                let business = documents
                    .business_mut(&business_id)
                    .ok_or_else(|| {
                        MarketplaceError::not_found(RecordKind::Business, &business_id)
                    })?;
                business.jobs.insert(job_id.clone());
                business.last_updated_at = at;
                documents.insert_job(JobRecord::new(job_id.clone(), business_id, posting, at))?;
                documents
                    .job_view(&job_id)
                    .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, &job_id))
            })
            .await?;

        info!(job = %view.record.id, business = %view.record.business_id, "job posted");
        Ok(view)
    }

    /// Deactivate a job. Existing matches are kept; the job leaves every feed.
    pub async fn close_job(
        &self,
        business_id: &BusinessId,
        job_id: &JobId,
    ) -> Result<JobView, MarketplaceError> {
        let business_id = business_id.clone();
        let job_id = job_id.clone();
        let at = Utc::now();
        self.write("close_job", move |documents| {
            let job = documents
                .job_mut(&job_id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, &job_id))?;
            if job.business_id != business_id {
                return Err(MarketplaceError::Forbidden {
                    business_id,
                    job_id,
                });
            }
            if job.is_active {
                job.is_active = false;
                job.updated_at = at;
                info!(job = %job_id, "job closed");
            }
            documents
                .job_view(&job_id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, &job_id))
        })
        .await
    }

    pub async fn record_worker_swipe(
        &self,
        worker_id: &WorkerId,
        job_id: &JobId,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome, MarketplaceError> {
        let worker_id = worker_id.clone();
        let job_id = job_id.clone();
        let at = Utc::now();
        self.write("record_worker_swipe", move |documents| {
            swipes::record_worker_swipe(documents, &worker_id, &job_id, direction, at)
        })
        .await
    }

    pub async fn record_business_decision(
        &self,
        business_id: &BusinessId,
        job_id: &JobId,
        worker_id: &WorkerId,
        decision: BusinessDecision,
    ) -> Result<DecisionOutcome, MarketplaceError> {
        let business_id = business_id.clone();
        let job_id = job_id.clone();
        let worker_id = worker_id.clone();
        let at = Utc::now();
        self.write("record_business_decision", move |documents| {
            swipes::record_business_decision(
                documents,
                &business_id,
                &job_id,
                &worker_id,
                decision,
                at,
            )
        })
        .await
    }

    pub async fn complete_profile(
        &self,
        identity: &IdentityId,
    ) -> Result<GateTransition, MarketplaceError> {
        let id = identity.clone();
        let at = Utc::now();
        let transition = self
            .write("complete_profile", move |documents| {
                gate::complete_profile(documents, &id, at)
            })
            .await?;
        if transition == GateTransition::Completed {
            info!(%identity, "profile completed");
        }
        Ok(transition)
    }

    pub async fn profile(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<ProfileSnapshot>, MarketplaceError> {
        let id = identity.clone();
        self.read("profile", move |documents| Ok(documents.profile_snapshot(&id)))
            .await
    }

    /// Route for an authenticated identity, read from its current profile document.
    pub async fn profile_route(
        &self,
        identity: &IdentityId,
    ) -> Result<GateRoute, MarketplaceError> {
        let snapshot = self.profile(identity).await?;
        Ok(gate::route_for(true, snapshot.as_ref()))
    }

    pub async fn worker(&self, worker_id: &WorkerId) -> Result<WorkerView, MarketplaceError> {
        let id = worker_id.clone();
        self.read("worker", move |documents| {
            documents
                .worker_view(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, &id))
        })
        .await
    }

    pub async fn business(
        &self,
        business_id: &BusinessId,
    ) -> Result<BusinessView, MarketplaceError> {
        let id = business_id.clone();
        self.read("business", move |documents| {
            documents
                .business_view(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Business, &id))
        })
        .await
    }

    pub async fn job(&self, job_id: &JobId) -> Result<JobView, MarketplaceError> {
        let id = job_id.clone();
        self.read("job", move |documents| {
            documents
                .job_view(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, &id))
        })
        .await
    }

    pub async fn pair_state(
        &self,
        worker_id: &WorkerId,
        job_id: &JobId,
    ) -> Result<PairState, MarketplaceError> {
        let worker_id = worker_id.clone();
        let job_id = job_id.clone();
        self.read("pair_state", move |documents| {
            Ok(documents.pair_state(&worker_id, &job_id))
        })
        .await
    }

    /// Active jobs the worker has not swiped on and was not rejected from, oldest first.
    pub async fn job_feed(
        &self,
        worker_id: &WorkerId,
        limit: usize,
    ) -> Result<Vec<JobRecord>, MarketplaceError> {
        let id = worker_id.clone();
        self.read("job_feed", move |documents| {
            let worker = documents
                .worker(&id)
                .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, &id))?;
            let mut feed = documents
                .jobs()
                .filter(|job| job.is_active)
                .filter(|job| {
                    !worker.liked_jobs.contains(&job.id)
                        && !worker.disliked_jobs.contains_key(&job.id)
                        && !job.rejected.contains_key(&id)
                        && !documents.ledger().contains(&id, &job.id)
                })
                .cloned()
                .collect::<Vec<_>>();
            feed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            feed.truncate(limit);
            Ok(feed)
        })
        .await
    }

    pub async fn worker_matches(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Vec<MatchRecord>, MarketplaceError> {
        let id = worker_id.clone();
        self.read("worker_matches", move |documents| {
            if documents.worker(&id).is_none() {
                return Err(MarketplaceError::not_found(RecordKind::Worker, &id));
            }
            Ok(documents
                .ledger()
                .records_for_worker(&id)
                .cloned()
                .collect())
        })
        .await
    }

    pub async fn job_matches(&self, job_id: &JobId) -> Result<Vec<MatchRecord>, MarketplaceError> {
        let id = job_id.clone();
        self.read("job_matches", move |documents| {
            if documents.job(&id).is_none() {
                return Err(MarketplaceError::not_found(RecordKind::Job, &id));
            }
            Ok(documents.ledger().records_for_job(&id).cloned().collect())
        })
        .await
    }
}
