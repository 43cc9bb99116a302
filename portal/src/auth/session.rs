//! Cookie-based authentication for the browser-facing admin app.
//!
//! The token travels inside the signed `portal_session` cookie. A token that
//! expired but was issued with "remember me" is replaced in place: the new
//! token is written back with a fresh 7-day cookie expiry.
//!
//! # Post-conditions
//! - On success, the context carries the verified identity (if any).
//! - On failure, the context's status is set to the error's status.

use std::sync::Arc;

use super::auth_config::REMEMBER_ME_LIFETIME_SECS;
use super::cookie::{self, CookieExpiry, SESSION_COOKIE, SetCookie};
use super::{AuthError, Authenticator, Identity, IssuedToken, RenewalPolicy, Role, VerifyOutcome};
use crate::context::RequestContext;

/// Authenticates requests from the session cookie and renews it in-band.
pub struct CookieAuthenticator {
    authenticator: Arc<Authenticator>,
}

impl CookieAuthenticator {
    #[must_use]
    pub const fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Verify the session cookie, renewing it if eligible.
    ///
    /// Returns `Ok(None)` for anonymous requests.
    ///
    /// # Errors
    /// Returns `AuthError::Unauthenticated` for a bad cookie MAC or token, and
    /// `AuthError::Configuration` when no token secret is configured.
    pub fn authenticate<C: RequestContext>(
        &self,
        ctx: &mut C,
    ) -> Result<Option<Identity>, AuthError> {
        let result = self.classify(ctx);
        if let Err(e) = &result {
            ctx.set_status(e.status());
        }
        result
    }

    fn classify<C: RequestContext>(&self, ctx: &mut C) -> Result<Option<Identity>, AuthError> {
        let Some(signed) = ctx.read_cookie(SESSION_COOKIE).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        let secret = self.authenticator.config().cookie_secret();
        let token = cookie::verify_value(&signed, secret)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))?;

        match self.authenticator.verify(Some(token), RenewalPolicy::Renew) {
            VerifyOutcome::NoToken => Ok(None),
            VerifyOutcome::ValidFresh(identity) => {
                ctx.attach_identity(identity);
                Ok(Some(identity))
            }
            VerifyOutcome::ValidExpiredRenewable { identity, renewed } => {
                ctx.write_cookie(self.session_cookie(&renewed));
                ctx.attach_identity(identity);
                Ok(Some(identity))
            }
            VerifyOutcome::Invalid(e) => Err(e),
        }
    }

    /// Issue a token after a successful login and set the session cookie.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` when no token secret is configured.
    pub fn login<C: RequestContext>(
        &self,
        ctx: &mut C,
        subject_id: u64,
        role: Role,
        remember_me: bool,
    ) -> Result<Identity, AuthError> {
        let issued = self.authenticator.issue(subject_id, role, remember_me)?;
        ctx.write_cookie(self.session_cookie(&issued));

        let identity = Identity {
            id: subject_id,
            role,
        };
        ctx.attach_identity(identity);
        Ok(identity)
    }

    /// Clear the session cookie.
    pub fn logout<C: RequestContext>(&self, ctx: &mut C) {
        ctx.write_cookie(SetCookie::clear(SESSION_COOKIE));
    }

    /// Build the signed session cookie for `issued`.
    ///
    /// Renewable tokens get a cookie that outlives the token by the
    /// remember-me window; others get a session cookie.
    fn session_cookie(&self, issued: &IssuedToken) -> SetCookie {
        let value = cookie::sign_value(&issued.token, self.authenticator.config().cookie_secret());
        let expiry = if issued.renewable {
            CookieExpiry::At(self.authenticator.now_secs() + REMEMBER_ME_LIFETIME_SECS)
        } else {
            CookieExpiry::Session
        };
        SetCookie::new(SESSION_COOKIE, value, expiry)
    }
}
