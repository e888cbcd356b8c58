use super::common::*;
use crate::marketplace::domain::{IdentityId, Role};
use crate::marketplace::identity::{AuthError, Credentials, IdentityProvider};
use crate::marketplace::{
    failure_message, GateRoute, MarketplaceError, MarketplaceStore, SessionController,
};

fn credentials(username: &str) -> Credentials {
    Credentials::new(format!("{username}@example.com"), "secret123")
}

#[tokio::test]
async fn sign_in_follows_the_profile_until_sign_out() {
    let (service, store, identities) = build_service();
    let worker = register_worker(&service, "dana").await;
    let identity = IdentityId::from(&worker);

    let mut session = SessionController::new(service.clone());
    let route = session
        .sign_in(&credentials("dana"), Role::Worker)
        .await
        .expect("sign in");
    assert_eq!(route, GateRoute::WorkerSetup);
    assert_eq!(store.live_subscriptions(&identity), 1);
    assert_eq!(session.identity().map(|id| &id.id), Some(&identity));

    service.complete_profile(&identity).await.expect("complete");
    assert_eq!(session.next_route().await.expect("route"), GateRoute::Home);
    assert_eq!(session.route(), GateRoute::Home);

    session.sign_out().await.expect("sign out");
    assert_eq!(store.live_subscriptions(&identity), 0);
    assert_eq!(session.route(), GateRoute::SignedOut);
    assert!(session.identity().is_none());
    assert!(identities.current().is_none());
}

#[tokio::test]
async fn sign_in_provisions_a_missing_profile() {
    let (service, store, identities) = build_service();
    let identity = identities
        .sign_up(&credentials("fresh"))
        .await
        .expect("provider sign up");

    let mut session = SessionController::new(service.clone());
    let route = session
        .sign_in(&credentials("fresh"), Role::Business)
        .await
        .expect("sign in");

    assert_eq!(route, GateRoute::BusinessSetup);
    let business = service
        .business(&(&identity.id).into())
        .await
        .expect("business provisioned");
    assert_eq!(business.record.account.email, "fresh@example.com");
    assert!(!business.record.profile_complete);
    assert!(business.record.jobs.is_empty());
    assert_eq!(store.live_subscriptions(&identity.id), 1);
}

#[tokio::test]
async fn switching_identities_releases_the_previous_subscription() {
    let (service, store, _) = build_service();
    let first = IdentityId::from(&register_worker(&service, "dana").await);
    let second = IdentityId::from(&register_business(&service, "harbor").await);

    let mut session = SessionController::new(service.clone());
    session
        .sign_in(&credentials("dana"), Role::Worker)
        .await
        .expect("first sign in");
    session
        .sign_in(&credentials("harbor"), Role::Worker)
        .await
        .expect("second sign in");

    assert_eq!(store.live_subscriptions(&first), 0);
    assert_eq!(store.live_subscriptions(&second), 1);
    assert_eq!(session.route(), GateRoute::BusinessSetup);
}

#[tokio::test]
async fn auth_failures_carry_user_messages() {
    let (service, _, identities) = build_service();
    register_worker(&service, "dana").await;
    let mut session = SessionController::new(service.clone());

    let wrong = Credentials::new("dana@example.com", "not-the-password");
    let error = session
        .sign_in(&wrong, Role::Worker)
        .await
        .expect_err("wrong password");
    assert!(matches!(
        error,
        MarketplaceError::Auth(AuthError::InvalidCredentials)
    ));
    assert_eq!(failure_message(&error), "Invalid email or password.");

    identities.disable("dana@example.com");
    let error = session
        .sign_in(&credentials("dana"), Role::Worker)
        .await
        .expect_err("disabled");
    assert_eq!(failure_message(&error), "This account has been disabled.");
    assert_eq!(session.route(), GateRoute::SignedOut);
}

#[tokio::test]
async fn signing_out_without_a_session_is_a_no_op() {
    let (service, _, _) = build_service();
    let mut session = SessionController::new(service);
    session.sign_out().await.expect("no-op sign out");
    assert_eq!(session.next_route().await.expect("route"), GateRoute::SignedOut);
}

#[tokio::test]
async fn provider_ending_the_session_releases_the_subscription() {
    let (service, store, identities) = build_service();
    let identity = IdentityId::from(&register_worker(&service, "dana").await);
    let mut session = SessionController::new(service.clone());
    session
        .sign_in(&credentials("dana"), Role::Worker)
        .await
        .expect("sign in");
    assert_eq!(store.live_subscriptions(&identity), 1);

    identities
        .sign_out(&identity)
        .await
        .expect("provider ends the session");

    assert_eq!(session.route(), GateRoute::SignedOut);
    assert_eq!(store.live_subscriptions(&identity), 0);
    assert!(session.identity().is_none());
}

#[tokio::test]
async fn waiting_for_a_route_wakes_on_provider_sign_out() {
    let (service, store, identities) = build_service();
    let identity = IdentityId::from(&register_worker(&service, "dana").await);
    let mut session = SessionController::new(service.clone());
    session
        .sign_in(&credentials("dana"), Role::Worker)
        .await
        .expect("sign in");

    let (route, signed_out) = tokio::join!(session.next_route(), identities.sign_out(&identity));
    signed_out.expect("provider ends the session");

    assert_eq!(route.expect("route"), GateRoute::SignedOut);
    assert_eq!(store.live_subscriptions(&identity), 0);
}

#[tokio::test]
async fn resume_picks_up_the_provider_session() {
    let (service, store, identities) = build_service();
    let identity = IdentityId::from(&register_worker(&service, "dana").await);
    identities
        .sign_in(&credentials("dana"))
        .await
        .expect("provider session");

    let mut session = SessionController::new(service.clone());
    assert_eq!(
        session.resume(Role::Worker).await.expect("resume"),
        GateRoute::WorkerSetup
    );
    assert_eq!(session.identity().map(|id| &id.id), Some(&identity));
    assert_eq!(store.live_subscriptions(&identity), 1);

    let (fresh, _, _) = build_service();
    let mut idle = SessionController::new(fresh);
    assert_eq!(
        idle.resume(Role::Worker).await.expect("resume"),
        GateRoute::SignedOut
    );
}
