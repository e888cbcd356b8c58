use std::fmt;

use super::domain::{BusinessDecision, BusinessId, JobId, SwipeDirection, WorkerId};
use super::identity::AuthError;
use super::store::StoreError;
use super::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Worker,
    Business,
    Job,
    Profile,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordKind::Worker => "worker",
            RecordKind::Business => "business",
            RecordKind::Job => "job",
            RecordKind::Profile => "profile",
        };
        f.write_str(label)
    }
}

/// Error raised by marketplace operations. Every variant is scoped to the triggering call.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: String },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("worker {worker_id} already swiped {existing} on job {job_id}")]
    SwipeConflict {
        worker_id: WorkerId,
        job_id: JobId,
        existing: SwipeDirection,
    },
    #[error("cannot {decision} worker {worker_id} on job {job_id}: {reason}")]
    DecisionConflict {
        job_id: JobId,
        worker_id: WorkerId,
        decision: BusinessDecision,
        reason: &'static str,
    },
    #[error("job {0} is closed")]
    JobClosed(JobId),
    #[error("business {business_id} does not own job {job_id}")]
    Forbidden {
        business_id: BusinessId,
        job_id: JobId,
    },
    #[error("store temporarily unavailable: {0}")]
    Transient(StoreError),
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl MarketplaceError {
    pub fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, MarketplaceError::Transient(_))
    }
}

impl From<StoreError> for MarketplaceError {
    fn from(value: StoreError) -> Self {
        if value.is_transient() {
            Self::Transient(value)
        } else {
            Self::Store(value)
        }
    }
}
