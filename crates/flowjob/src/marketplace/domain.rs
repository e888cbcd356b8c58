use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Authenticated identity issued by the identity provider; workers and businesses share it.
    IdentityId
);
identifier!(WorkerId);
identifier!(BusinessId);
identifier!(JobId);

impl From<&IdentityId> for WorkerId {
    fn from(value: &IdentityId) -> Self {
        Self(value.0.clone())
    }
}

impl From<&IdentityId> for BusinessId {
    fn from(value: &IdentityId) -> Self {
        Self(value.0.clone())
    }
}

impl From<&WorkerId> for IdentityId {
    fn from(value: &WorkerId) -> Self {
        Self(value.0.clone())
    }
}

impl From<&BusinessId> for IdentityId {
    fn from(value: &BusinessId) -> Self {
        Self(value.0.clone())
    }
}

/// Which side of the marketplace an identity signed up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Business,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Business => "business",
        }
    }
}

/// Direction of a worker swipe on a job card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Like,
    Dislike,
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwipeDirection::Like => f.write_str("like"),
            SwipeDirection::Dislike => f.write_str("dislike"),
        }
    }
}

/// Decision a business takes on a worker for one of its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessDecision {
    AcceptApplicant,
    Reject,
}

impl fmt::Display for BusinessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessDecision::AcceptApplicant => f.write_str("accept"),
            BusinessDecision::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryUnit {
    Hour,
    Month,
}

/// Account fields shared by both roles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub email: String,
    pub username: String,
    pub username_lowercase: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

impl AccountInfo {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Professional profile and job preferences collected by the worker setup wizard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerProfile {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub preferred_tags: Vec<String>,
    pub industry_preference: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub job_search_radius: Option<u32>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_unit: Option<SalaryUnit>,
    pub availability: Vec<String>,
    pub willing_to_relocate: bool,
    pub profile_picture_url: Option<String>,
    pub resume_url: Option<String>,
}

/// Public business profile collected by the business setup wizard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub name: String,
    pub industry: Option<String>,
    pub header: Option<String>,
    pub summary: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub size: Option<String>,
    pub founded_year: Option<u16>,
}

/// Descriptive and compensation attributes of a job posting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPosting {
    pub title: String,
    pub industry: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub experience_required: Option<String>,
    pub skills_needed: Vec<String>,
    pub availability: Option<String>,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub is_remote: bool,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_unit: Option<SalaryUnit>,
    pub minimum_age: Option<u8>,
    pub benefits: Vec<String>,
}

/// Stored worker document. `matched_jobs` is not stored here; see [`WorkerView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    #[serde(flatten)]
    pub account: AccountInfo,
    #[serde(flatten)]
    pub profile: WorkerProfile,
    pub liked_jobs: BTreeSet<JobId>,
    pub disliked_jobs: BTreeMap<JobId, bool>,
    #[serde(rename = "profileComplete")]
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl WorkerRecord {
    pub fn new(
        id: WorkerId,
        account: AccountInfo,
        profile: WorkerProfile,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account,
            profile,
            liked_jobs: BTreeSet::new(),
            disliked_jobs: BTreeMap::new(),
            profile_complete: false,
            created_at: at,
            last_updated_at: at,
        }
    }
}

/// Stored business document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: BusinessId,
    #[serde(flatten)]
    pub account: AccountInfo,
    #[serde(flatten)]
    pub profile: BusinessProfile,
    pub jobs: BTreeSet<JobId>,
    #[serde(rename = "profileComplete")]
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl BusinessRecord {
    pub fn new(
        id: BusinessId,
        account: AccountInfo,
        profile: BusinessProfile,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account,
            profile,
            jobs: BTreeSet::new(),
            profile_complete: false,
            created_at: at,
            last_updated_at: at,
        }
    }
}

/// Stored job document. `matches` is not stored here; see [`JobView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    #[serde(rename = "businessId")]
    pub business_id: BusinessId,
    #[serde(flatten)]
    pub posting: JobPosting,
    pub is_active: bool,
    pub applicants: BTreeSet<WorkerId>,
    pub rejected: BTreeMap<WorkerId, DateTime<Utc>>,
    pub accepted: BTreeMap<WorkerId, DateTime<Utc>>,
    pub posted_by_user_id: IdentityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: JobId, business_id: BusinessId, posting: JobPosting, at: DateTime<Utc>) -> Self {
        let posted_by_user_id = IdentityId::from(&business_id);
        Self {
            id,
            business_id,
            posting,
            is_active: true,
            applicants: BTreeSet::new(),
            rejected: BTreeMap::new(),
            accepted: BTreeMap::new(),
            posted_by_user_id,
            created_at: at,
            updated_at: at,
        }
    }
}

/// One row of the authoritative match relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub worker_id: WorkerId,
    pub job_id: JobId,
    #[serde(rename = "businessId")]
    pub business_id: BusinessId,
    pub matched_at: DateTime<Utc>,
}

/// Worker document as exposed to clients, with `matched_jobs` derived from the match ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerView {
    #[serde(flatten)]
    pub record: WorkerRecord,
    pub role: Role,
    pub matched_jobs: BTreeSet<JobId>,
}

/// Business document as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessView {
    #[serde(flatten)]
    pub record: BusinessRecord,
    pub role: Role,
}

/// Job document as exposed to clients, with `matches` derived from the match ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub record: JobRecord,
    pub matches: BTreeSet<WorkerId>,
}

/// Where a single worker/job pair currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    Untouched,
    Liked,
    Disliked,
    Rejected,
    Matched,
}

impl PairState {
    pub const fn label(self) -> &'static str {
        match self {
            PairState::Untouched => "untouched",
            PairState::Liked => "liked",
            PairState::Disliked => "disliked",
            PairState::Rejected => "rejected",
            PairState::Matched => "matched",
        }
    }
}

/// Result of recording a worker swipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwipeOutcome {
    pub worker_id: WorkerId,
    pub job_id: JobId,
    pub direction: SwipeDirection,
    pub newly_recorded: bool,
    pub state: PairState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<MatchRecord>,
}

/// Result of recording a business decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub decision: BusinessDecision,
    pub newly_recorded: bool,
    pub state: PairState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<MatchRecord>,
}
