//! Authentication failure taxonomy.
//!
//! An absent credential is not an error, and an expired-but-renewable token
//! is recovered without surfacing anything. What remains is either the
//! client's fault (`Unauthenticated`) or the deployment's (`Configuration`).

use axum::http::StatusCode;

use super::JwtError;

/// Error returned when a request's credential cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Bad signature, malformed token, bad scheme, or expired without renewal.
    Unauthenticated(String),
    /// The server is missing key material or rejected its own key.
    Configuration(String),
}

impl AuthError {
    /// The HTTP status the calling middleware should respond with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn missing_secret() -> Self {
        Self::Configuration("token secret is not configured".to_string())
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated(reason) => write!(f, "authentication failed: {reason}"),
            Self::Configuration(reason) => write!(f, "authentication misconfigured: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::InvalidKey(reason) => Self::Configuration(reason),
            other => Self::Unauthenticated(other.to_string()),
        }
    }
}
