use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::domain::Role;
use super::error::MarketplaceError;
use super::gate::{route_for, GateRoute};
use super::identity::{AuthIdentity, Credentials, IdentityProvider};
use super::service::MarketplaceService;
use super::store::{MarketplaceStore, ProfileSnapshot, ProfileSubscription, StoreError};

struct ActiveSession {
    identity: AuthIdentity,
    profile: ProfileSubscription,
    auth: watch::Receiver<Option<AuthIdentity>>,
}

enum Wake {
    Profile(Result<Option<ProfileSnapshot>, StoreError>),
    /// Whether the auth feed is still open.
    Auth(bool),
}

impl ActiveSession {
    /// False once the provider reports no identity, or a different one.
    fn still_signed_in(&self) -> bool {
        matches!(&*self.auth.borrow(), Some(current) if current.id == self.identity.id)
    }
}

/// Owns the auth session and profile subscription of one signed-in identity.
///
/// Dropping the controller, calling [`SessionController::sign_out`], or the provider
/// ending the session on its own releases every subscription it opened.
pub struct SessionController<S, P> {
    service: Arc<MarketplaceService<S, P>>,
    active: Option<ActiveSession>,
}

impl<S, P> SessionController<S, P>
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    pub fn new(service: Arc<MarketplaceService<S, P>>) -> Self {
        Self {
            service,
            active: None,
        }
    }

    /// Authenticate, provision a `role` profile if the identity has none, and start
    /// following its profile document.
    pub async fn sign_in(
        &mut self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<GateRoute, MarketplaceError> {
        if self.active.is_some() {
            self.sign_out().await?;
        }

        let identity = self.service.identities().sign_in(credentials).await?;
        self.attach(identity, role).await
    }

    /// Pick up a session the provider already holds, as on a process restart.
    pub async fn resume(&mut self, role: Role) -> Result<GateRoute, MarketplaceError> {
        if self.active.is_some() {
            return Ok(self.route());
        }
        match self.service.identities().current() {
            Some(identity) => self.attach(identity, role).await,
            None => Ok(GateRoute::SignedOut),
        }
    }

    async fn attach(
        &mut self,
        identity: AuthIdentity,
        role: Role,
    ) -> Result<GateRoute, MarketplaceError> {
        self.service.ensure_profile_exists(&identity, role).await?;
        let mut auth = self.service.identities().session_changes();
        auth.borrow_and_update();
        let profile = self.service.store().subscribe_profile(&identity.id);

        info!(identity = %identity.id, "session started");
        self.active = Some(ActiveSession {
            identity,
            profile,
            auth,
        });
        Ok(self.route())
    }

    pub fn identity(&self) -> Option<&AuthIdentity> {
        self.active.as_ref().map(|session| &session.identity)
    }

    /// Route for the latest profile snapshot observed by the subscription.
    pub fn route(&mut self) -> GateRoute {
        self.release_if_ended();
        match &self.active {
            None => route_for(false, None),
            Some(session) => route_for(true, session.profile.current().as_ref()),
        }
    }

    /// Wait for the next profile or auth session change and return the resulting route.
    pub async fn next_route(&mut self) -> Result<GateRoute, MarketplaceError> {
        loop {
            if self.release_if_ended() {
                return Ok(GateRoute::SignedOut);
            }
            let Some(session) = self.active.as_mut() else {
                return Ok(GateRoute::SignedOut);
            };

            let wake = {
                let ActiveSession { profile, auth, .. } = &mut *session;
                tokio::select! {
                    snapshot = profile.changed() => Wake::Profile(snapshot),
                    result = auth.changed() => Wake::Auth(result.is_ok()),
                }
            };

            match wake {
                Wake::Profile(snapshot) => {
                    let snapshot = snapshot?;
                    if session.still_signed_in() {
                        let route = route_for(true, snapshot.as_ref());
                        debug!(
                            identity = %session.identity.id,
                            route = route.label(),
                            "gate route changed"
                        );
                        return Ok(route);
                    }
                }
                Wake::Auth(true) => {}
                Wake::Auth(false) => {
                    info!(identity = %session.identity.id, "auth session feed closed");
                    self.active = None;
                    return Ok(GateRoute::SignedOut);
                }
            }
        }
    }

    /// Release the profile subscription, then end the provider session.
    pub async fn sign_out(&mut self) -> Result<(), MarketplaceError> {
        let Some(session) = self.active.take() else {
            return Ok(());
        };
        let ActiveSession {
            identity,
            profile,
            auth,
        } = session;
        drop(profile);
        drop(auth);

        self.service.identities().sign_out(&identity.id).await?;
        info!(identity = %identity.id, "session ended");
        Ok(())
    }

    fn release_if_ended(&mut self) -> bool {
        let ended = self
            .active
            .as_ref()
            .is_some_and(|session| !session.still_signed_in());
        if ended {
            if let Some(session) = self.active.take() {
                info!(identity = %session.identity.id, "session ended by the identity provider");
            }
        }
        ended
    }
}

/// Text to show the person whose action failed.
pub fn failure_message(error: &MarketplaceError) -> String {
    match error {
        MarketplaceError::Auth(auth) => auth.user_message(),
        MarketplaceError::Transient(_) => {
            "The service is temporarily unavailable. Please try again.".to_string()
        }
        MarketplaceError::Store(_) => "Something went wrong. Please try again.".to_string(),
        other => other.to_string(),
    }
}
