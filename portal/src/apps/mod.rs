//! The three sub-applications and the shared state they run on.
//!
//! Life of a request:
//! 1. `dispatch` picks a sub-app from the `Host` header.
//! 2. The sub-app's auth middleware (cookie for admin, bearer for api)
//!    attaches an `Identity` to the request extensions, or answers directly.
//! 3. Handlers read the identity through `CurrentUser`.

pub mod admin;
pub mod api;
pub mod dispatch;
pub mod www;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{
    AuthError, Authenticator, BearerAuthenticator, CookieAuthenticator, CredentialError,
    CredentialStore, Identity, User,
};

pub use dispatch::{SubApp, router};

/// State shared by every sub-app.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub cookies: Arc<CookieAuthenticator>,
    pub bearer: Arc<BearerAuthenticator>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
    pub fn new(authenticator: Arc<Authenticator>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            cookies: Arc::new(CookieAuthenticator::new(Arc::clone(&authenticator))),
            bearer: Arc::new(BearerAuthenticator::new(Arc::clone(&authenticator))),
            authenticator,
            credentials,
        }
    }
}

/// The identity attached by the auth middleware, if any.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().copied()))
    }
}

/// Why a login attempt did not produce a token.
#[derive(Debug)]
pub enum LoginError {
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// The credential store failed.
    Store(CredentialError),
    /// The blocking password check panicked or was cancelled.
    Task(tokio::task::JoinError),
    /// The token could not be issued.
    Auth(AuthError),
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::Store(e) => write!(f, "credential store error: {e}"),
            Self::Task(e) => write!(f, "password check failed: {e}"),
            Self::Auth(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<CredentialError> for LoginError {
    fn from(e: CredentialError) -> Self {
        Self::Store(e)
    }
}

impl From<AuthError> for LoginError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

/// Look up `email` and check `password` off the async executor.
///
/// # Errors
/// Returns `LoginError::InvalidCredentials` for an unknown email or a wrong
/// password; other variants for store or task failures.
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
pub async fn check_credentials(
    credentials: &Arc<dyn CredentialStore>,
    email: String,
    password: String,
) -> Result<User, LoginError> {
    let store = Arc::clone(credentials);
    tokio::task::spawn_blocking(move || {
        let user = store
            .find_by_email(&email)?
            .ok_or(LoginError::InvalidCredentials)?;
        if store.verify_password(&user, &password)? {
            Ok(user)
        } else {
            Err(LoginError::InvalidCredentials)
        }
    })
    .await
    .map_err(LoginError::Task)?
}
