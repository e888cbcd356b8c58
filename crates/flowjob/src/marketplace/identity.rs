use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

use super::domain::IdentityId;

/// Email/password pair handed to the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity returned by a successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub id: IdentityId,
    pub email: String,
}

/// Failures reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("password too weak")]
    WeakPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("too many requests")]
    TooManyRequests,
    #[error("user disabled")]
    UserDisabled,
    #[error("identity provider error {code}: {message}")]
    Provider { code: String, message: String },
}

impl AuthError {
    /// Map a provider error code (`auth/...`) onto a typed error.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/email-already-in-use" => AuthError::EmailAlreadyInUse,
            "auth/weak-password" => AuthError::WeakPassword,
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/user-not-found" | "auth/wrong-password" | "auth/invalid-credential" => {
                AuthError::InvalidCredentials
            }
            "auth/too-many-requests" => AuthError::TooManyRequests,
            "auth/user-disabled" => AuthError::UserDisabled,
            other => AuthError::Provider {
                code: other.to_string(),
                message: message.into(),
            },
        }
    }

    /// Text safe to show the person who triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::EmailAlreadyInUse => "This email is already registered.".to_string(),
            AuthError::WeakPassword => "The password is too weak.".to_string(),
            AuthError::InvalidEmail => "Please enter a valid email address.".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
            AuthError::TooManyRequests => {
                "Too many attempts. Please try again later or reset your password.".to_string()
            }
            AuthError::UserDisabled => "This account has been disabled.".to_string(),
            AuthError::Provider { code, message } => {
                let detail = if message.is_empty() { code } else { message };
                format!("Request failed: {detail}")
            }
        }
    }
}

/// Hosted authentication collaborator.
///
/// Sign-in, sign-out and any session the provider ends on its own are published
/// through [`IdentityProvider::session_changes`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError>;
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthIdentity, AuthError>;
    async fn sign_out(&self, identity: &IdentityId) -> Result<(), AuthError>;
    fn current(&self) -> Option<AuthIdentity>;
    /// Notified whenever the signed-in identity changes.
    fn session_changes(&self) -> watch::Receiver<Option<AuthIdentity>>;
}
