//! Token issuer and verifier.
//!
//! `Authenticator` owns the key material and clock. It mints tokens and
//! classifies presented tokens into one of four terminal states:
//!
//! ```text
//!             token?
//!        none /    \ some
//!      NoToken    strict verify ── ok ──▶ ValidFresh
//!                     │ expired (signature ok)
//!                     ▼
//!               relaxed verify ── err ──▶ Invalid
//!                     │ ok
//!          renewable && policy == Renew ── no ──▶ Invalid
//!                     │ yes
//!                     ▼
//!            ValidExpiredRenewable (replacement minted)
//! ```
//!
//! Any other strict-verification failure goes straight to `Invalid`.
//!
//! # Invariants
//! - The authenticator never logs; callers decide how to report outcomes.
//! - Verifying a fresh token has no side effects and is idempotent.

use std::sync::Arc;

use super::auth_config::TOKEN_LIFETIME_SECS;
use super::jwt::{self, Claims, JwtError};
use super::{AuthConfig, AuthError, Role};
use crate::time::TimeSource;

/// The verified identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Subject (user) identifier.
    pub id: u64,
    /// Role expanded from the token's role code.
    pub role: Role,
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
        }
    }
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The signed token string.
    pub token: String,
    /// Embedded expiry, unix seconds.
    pub expires_at: u64,
    /// Whether the token is renewable after expiry.
    pub renewable: bool,
}

/// Whether an expired-but-renewable token may be reissued in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalPolicy {
    /// Cookie flow: reissue renewable tokens after expiry.
    Renew,
    /// Header flow: expired tokens are always rejected.
    Reject,
}

/// Result of verifying a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// No token was presented; the request is anonymous.
    NoToken,
    /// Signature and expiry are valid.
    ValidFresh(Identity),
    /// Signature valid, expired, renewable; a replacement was minted.
    ValidExpiredRenewable {
        identity: Identity,
        renewed: IssuedToken,
    },
    /// The token must not be trusted.
    Invalid(AuthError),
}

/// Issues and verifies tokens against one process-wide secret.
pub struct Authenticator {
    config: AuthConfig,
    clock: Arc<dyn TimeSource>,
}

impl Authenticator {
    /// Create an authenticator from explicit configuration and a clock.
    #[must_use]
    pub fn new(config: AuthConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self { config, clock }
    }

    /// The authenticator's configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Current time in unix seconds, from the injected clock.
    #[must_use]
    pub fn now_secs(&self) -> u64 {
        self.clock.now_secs()
    }

    /// Whether a token secret is configured.
    #[must_use]
    pub fn has_token_secret(&self) -> bool {
        self.config.token_secret().is_some()
    }

    /// Mint a renewable-or-not token for the cookie flow.
    ///
    /// # Pre-conditions
    /// - `subject_id` refers to an existing, authenticated user.
    ///
    /// # Post-conditions
    /// - `exp == iat + 24h` and the payload's `remember` equals `remember_me`.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` if no secret is configured or
    /// signing fails.
    pub fn issue(
        &self,
        subject_id: u64,
        role: Role,
        remember_me: bool,
    ) -> Result<IssuedToken, AuthError> {
        self.mint(subject_id, role, Some(remember_me))
    }

    /// Mint a token for the header flow. The payload carries no `remember`
    /// marker, so the token is never renewable.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` if no secret is configured or
    /// signing fails.
    pub fn issue_bearer(&self, subject_id: u64, role: Role) -> Result<IssuedToken, AuthError> {
        self.mint(subject_id, role, None)
    }

    fn mint(
        &self,
        subject_id: u64,
        role: Role,
        remember: Option<bool>,
    ) -> Result<IssuedToken, AuthError> {
        let secret = self
            .config
            .token_secret()
            .ok_or_else(AuthError::missing_secret)?;

        let iat = self.clock.now_secs();
        let claims = Claims {
            id: subject_id,
            role,
            remember,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let token = jwt::sign(&claims, secret)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            renewable: claims.is_renewable(),
        })
    }

    /// Classify a presented token.
    ///
    /// `None` and the empty string both mean no token was presented.
    #[must_use]
    pub fn verify(&self, token: Option<&str>, policy: RenewalPolicy) -> VerifyOutcome {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return VerifyOutcome::NoToken;
        };

        let Some(secret) = self.config.token_secret() else {
            return VerifyOutcome::Invalid(AuthError::missing_secret());
        };

        match jwt::verify_strict(token, secret, self.clock.now_secs()) {
            Ok(claims) => VerifyOutcome::ValidFresh(Identity::from(&claims)),
            Err(JwtError::TokenExpired) => self.verify_expired(token, secret, policy),
            Err(e) => VerifyOutcome::Invalid(e.into()),
        }
    }

    fn verify_expired(&self, token: &str, secret: &[u8], policy: RenewalPolicy) -> VerifyOutcome {
        let claims = match jwt::verify_relaxed(token, secret) {
            Ok(claims) => claims,
            Err(e) => return VerifyOutcome::Invalid(e.into()),
        };

        if policy == RenewalPolicy::Reject || !claims.is_renewable() {
            return VerifyOutcome::Invalid(JwtError::TokenExpired.into());
        }

        // The old exp is discarded; role and remember carry forward.
        match self.mint(claims.id, claims.role, claims.remember) {
            Ok(renewed) => VerifyOutcome::ValidExpiredRenewable {
                identity: Identity::from(&claims),
                renewed,
            },
            Err(e) => VerifyOutcome::Invalid(e),
        }
    }
}
