use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{BusinessId, IdentityId, Role, WorkerId};
use super::error::{MarketplaceError, RecordKind};
use super::store::{Documents, ProfileSnapshot};

/// Which flow a client should show for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRoute {
    SignedOut,
    Loading,
    WorkerSetup,
    BusinessSetup,
    Home,
}

impl GateRoute {
    pub const fn label(self) -> &'static str {
        match self {
            GateRoute::SignedOut => "signed_out",
            GateRoute::Loading => "loading",
            GateRoute::WorkerSetup => "worker_setup",
            GateRoute::BusinessSetup => "business_setup",
            GateRoute::Home => "home",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateTransition {
    Completed,
    AlreadyComplete,
}

/// Route selection. A signed-in identity without a profile document yet is still loading.
pub fn route_for(authenticated: bool, snapshot: Option<&ProfileSnapshot>) -> GateRoute {
    if !authenticated {
        return GateRoute::SignedOut;
    }
    match snapshot {
        None => GateRoute::Loading,
        Some(snapshot) if snapshot.profile_complete => GateRoute::Home,
        Some(snapshot) => match snapshot.role {
            Role::Worker => GateRoute::WorkerSetup,
            Role::Business => GateRoute::BusinessSetup,
        },
    }
}

/// One-way `incomplete -> complete` transition; repeating it changes nothing.
pub(crate) fn complete_profile(
    documents: &mut Documents,
    identity: &IdentityId,
    at: DateTime<Utc>,
) -> Result<GateTransition, MarketplaceError> {
    let snapshot = documents
        .profile_snapshot(identity)
        .ok_or_else(|| MarketplaceError::not_found(RecordKind::Profile, identity))?;
    if snapshot.profile_complete {
        return Ok(GateTransition::AlreadyComplete);
    }

    if let Some(worker) = documents.worker_mut(&WorkerId::from(identity)) {
        worker.profile_complete = true;
        worker.last_updated_at = at;
    } else if let Some(business) = documents.business_mut(&BusinessId::from(identity)) {
        business.profile_complete = true;
        business.last_updated_at = at;
    }

    Ok(GateTransition::Completed)
}
