//! Authentication key material and lifetimes.
//!
//! # Pre-conditions
//! - If a token secret is supplied, it must be non-empty.
//! - The cookie secret must be non-empty.
//!
//! # Post-conditions
//! - `AuthConfig` instances are immutable once created.
//!
//! # Invariants
//! - A token's expiry is always exactly `TOKEN_LIFETIME_SECS` after issuance.
//! - The token secret and the cookie secret are independent values.

/// Lifetime of every issued token, in seconds (24 hours).
pub const TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Lifetime of a "remember me" session cookie, in seconds (7 days).
pub const REMEMBER_ME_LIFETIME_SECS: u64 = 7 * 24 * 60 * 60;

/// Error returned when authentication configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfigError {
    /// The token signing secret was supplied but is empty.
    EmptyTokenSecret,
    /// The cookie signing secret is empty.
    EmptyCookieSecret,
}

impl std::fmt::Display for AuthConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTokenSecret => write!(f, "token secret must not be empty"),
            Self::EmptyCookieSecret => write!(f, "cookie secret must not be empty"),
        }
    }
}

impl std::error::Error for AuthConfigError {}

/// Key material for the token authenticator.
///
/// The token secret is optional: a deployment without one still starts, and
/// every authenticated request then fails as a configuration error rather
/// than an authentication error.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 token signatures.
    token_secret: Option<Vec<u8>>,
    /// Secret for the HMAC that protects the session cookie value.
    cookie_secret: Vec<u8>,
}

impl AuthConfig {
    /// Create a new authentication configuration.
    ///
    /// # Errors
    /// Returns `AuthConfigError::EmptyTokenSecret` if `token_secret` is
    /// `Some` but empty, and `AuthConfigError::EmptyCookieSecret` if
    /// `cookie_secret` is empty.
    pub fn new(
        token_secret: Option<Vec<u8>>,
        cookie_secret: Vec<u8>,
    ) -> Result<Self, AuthConfigError> {
        if token_secret.as_ref().is_some_and(Vec::is_empty) {
            return Err(AuthConfigError::EmptyTokenSecret);
        }
        if cookie_secret.is_empty() {
            return Err(AuthConfigError::EmptyCookieSecret);
        }
        Ok(Self {
            token_secret,
            cookie_secret,
        })
    }

    /// The token signing secret, if one is configured.
    #[must_use]
    pub fn token_secret(&self) -> Option<&[u8]> {
        self.token_secret.as_deref()
    }

    /// The cookie signing secret.
    #[must_use]
    pub fn cookie_secret(&self) -> &[u8] {
        &self.cookie_secret
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("cookie_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        assert_eq!(TOKEN_LIFETIME_SECS, 86_400);
        assert_eq!(REMEMBER_ME_LIFETIME_SECS, 604_800);
    }

    #[test]
    fn test_new_valid() {
        let config = AuthConfig::new(Some(b"token-secret".to_vec()), b"cookie-secret".to_vec())
            .expect("valid config");

        assert_eq!(config.token_secret(), Some(&b"token-secret"[..]));
        assert_eq!(config.cookie_secret(), b"cookie-secret");
    }

    #[test]
    fn test_new_without_token_secret() {
        let config = AuthConfig::new(None, b"cookie-secret".to_vec()).expect("valid config");
        assert!(config.token_secret().is_none());
    }

    #[test]
    fn test_new_empty_token_secret() {
        let result = AuthConfig::new(Some(Vec::new()), b"cookie-secret".to_vec());
        assert!(matches!(result, Err(AuthConfigError::EmptyTokenSecret)));
    }

    #[test]
    fn test_new_empty_cookie_secret() {
        let result = AuthConfig::new(Some(b"token-secret".to_vec()), Vec::new());
        assert!(matches!(result, Err(AuthConfigError::EmptyCookieSecret)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::new(Some(b"token-secret".to_vec()), b"cookie-secret".to_vec())
            .expect("valid config");
        let debug = format!("{config:?}");

        assert!(!debug.contains("token-secret"));
        assert!(!debug.contains("cookie-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_auth_config_error_display() {
        assert_eq!(
            AuthConfigError::EmptyTokenSecret.to_string(),
            "token secret must not be empty"
        );
        assert_eq!(
            AuthConfigError::EmptyCookieSecret.to_string(),
            "cookie secret must not be empty"
        );
    }
}
