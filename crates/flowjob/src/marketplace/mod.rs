//! Worker/business job matching: profiles, swipes, match promotion and the profile
//! completion gate, over a transactional document store.

pub mod domain;
pub mod error;
pub mod gate;
pub mod identity;
pub mod matching;
pub mod memory;
pub mod retry;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub(crate) mod swipes;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AccountInfo, BusinessDecision, BusinessId, BusinessProfile, BusinessRecord, BusinessView,
    DecisionOutcome, IdentityId, JobId, JobPosting, JobRecord, JobView, MatchRecord, PairState,
    Role, SalaryUnit, SwipeDirection, SwipeOutcome, WorkerId, WorkerProfile, WorkerRecord,
    WorkerView,
};
pub use error::{MarketplaceError, RecordKind};
pub use gate::{route_for, GateRoute, GateTransition};
pub use identity::{AuthError, AuthIdentity, Credentials, IdentityProvider};
pub use matching::{evaluate, Eligibility, MatchLedger};
pub use memory::MemoryStore;
pub use retry::RetryPolicy;
pub use router::marketplace_router;
pub use service::{
    MarketplaceService, Provisioning, RegisterBusinessRequest, RegisterWorkerRequest,
};
pub use session::{failure_message, SessionController};
pub use store::{Documents, MarketplaceStore, ProfileSnapshot, ProfileSubscription, StoreError};
pub use validation::{AccountRequest, FieldError, ValidationErrors};
