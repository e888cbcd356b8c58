//! Swipe recording for both sides of the marketplace.
//!
//! These functions run inside a store transaction. They validate the whole request
//! before writing, and every insert is keyed by identifier, so two parties swiping on
//! the same job never overwrite each other.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::{
    BusinessDecision, BusinessId, DecisionOutcome, JobId, SwipeDirection, SwipeOutcome, WorkerId,
};
use super::error::{MarketplaceError, RecordKind};
use super::matching::promote_if_eligible;
use super::store::Documents;

pub(crate) fn record_worker_swipe(
    documents: &mut Documents,
    worker_id: &WorkerId,
    job_id: &JobId,
    direction: SwipeDirection,
    at: DateTime<Utc>,
) -> Result<SwipeOutcome, MarketplaceError> {
    let worker = documents
        .worker(worker_id)
        .ok_or_else(|| MarketplaceError::not_found(RecordKind::Worker, worker_id))?;
    let job = documents
        .job(job_id)
        .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, job_id))?;

    let liked = worker.liked_jobs.contains(job_id);
    let disliked = worker.disliked_jobs.contains_key(job_id);

    let newly_recorded = match direction {
        SwipeDirection::Like => {
            if disliked {
                return Err(MarketplaceError::SwipeConflict {
                    worker_id: worker_id.clone(),
                    job_id: job_id.clone(),
                    existing: SwipeDirection::Dislike,
                });
            }
            if liked {
                false
            } else {
                if !job.is_active {
                    return Err(MarketplaceError::JobClosed(job_id.clone()));
                }
                let eligible_applicant = !job.rejected.contains_key(worker_id)
                    && !documents.ledger().contains(worker_id, job_id);

                if let Some(job) = documents.job_mut(job_id) {
                    if eligible_applicant {
                        job.applicants.insert(worker_id.clone());
                    }
                    job.updated_at = at;
                }
                if let Some(worker) = documents.worker_mut(worker_id) {
                    worker.liked_jobs.insert(job_id.clone());
                    worker.last_updated_at = at;
                }
                true
            }
        }
        SwipeDirection::Dislike => {
            if liked {
                return Err(MarketplaceError::SwipeConflict {
                    worker_id: worker_id.clone(),
                    job_id: job_id.clone(),
                    existing: SwipeDirection::Like,
                });
            }
            if disliked {
                false
            } else {
                if let Some(worker) = documents.worker_mut(worker_id) {
                    worker.disliked_jobs.insert(job_id.clone(), true);
                    worker.last_updated_at = at;
                }
                true
            }
        }
    };

    let promoted = match direction {
        SwipeDirection::Like => promote_if_eligible(documents, worker_id, job_id, at),
        SwipeDirection::Dislike => None,
    };

    debug!(
        worker = %worker_id,
        job = %job_id,
        %direction,
        newly_recorded,
        promoted = promoted.is_some(),
        "worker swipe applied"
    );

    Ok(SwipeOutcome {
        worker_id: worker_id.clone(),
        job_id: job_id.clone(),
        direction,
        newly_recorded,
        state: documents.pair_state(worker_id, job_id),
        promoted,
    })
}

pub(crate) fn record_business_decision(
    documents: &mut Documents,
    business_id: &BusinessId,
    job_id: &JobId,
    worker_id: &WorkerId,
    decision: BusinessDecision,
    at: DateTime<Utc>,
) -> Result<DecisionOutcome, MarketplaceError> {
    let job = documents
        .job(job_id)
        .ok_or_else(|| MarketplaceError::not_found(RecordKind::Job, job_id))?;
    if &job.business_id != business_id {
        return Err(MarketplaceError::Forbidden {
            business_id: business_id.clone(),
            job_id: job_id.clone(),
        });
    }
    if documents.worker(worker_id).is_none() {
        return Err(MarketplaceError::not_found(RecordKind::Worker, worker_id));
    }

    let conflict = |reason: &'static str| MarketplaceError::DecisionConflict {
        job_id: job_id.clone(),
        worker_id: worker_id.clone(),
        decision,
        reason,
    };

    let matched = documents.ledger().contains(worker_id, job_id);
    let rejected = job.rejected.contains_key(worker_id);
    let accepted = job.accepted.contains_key(worker_id);

    let newly_recorded = match decision {
        BusinessDecision::Reject => {
            if matched {
                return Err(conflict("pair is already matched"));
            }
            if rejected {
                false
            } else {
                if let Some(job) = documents.job_mut(job_id) {
                    job.rejected.insert(worker_id.clone(), at);
                    job.applicants.remove(worker_id);
                    job.accepted.remove(worker_id);
                    job.updated_at = at;
                }
                true
            }
        }
        BusinessDecision::AcceptApplicant => {
            if rejected {
                return Err(conflict("worker was rejected for this job"));
            }
            if accepted {
                false
            } else {
                if let Some(job) = documents.job_mut(job_id) {
                    job.accepted.insert(worker_id.clone(), at);
                    job.updated_at = at;
                }
                true
            }
        }
    };

    let promoted = match decision {
        BusinessDecision::AcceptApplicant => promote_if_eligible(documents, worker_id, job_id, at),
        BusinessDecision::Reject => None,
    };

    debug!(
        business = %business_id,
        job = %job_id,
        worker = %worker_id,
        %decision,
        newly_recorded,
        promoted = promoted.is_some(),
        "business decision applied"
    );

    Ok(DecisionOutcome {
        job_id: job_id.clone(),
        worker_id: worker_id.clone(),
        decision,
        newly_recorded,
        state: documents.pair_state(worker_id, job_id),
        promoted,
    })
}
