//! `Authorization: Bearer` authentication for the API app.
//!
//! Unlike the cookie flow, an expired token is never renewed here; the client
//! must call `POST /auth` again.

use std::sync::Arc;

use super::{AuthError, Authenticator, Identity, RenewalPolicy, VerifyOutcome};
use crate::context::RequestContext;

const AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// Authenticates requests from the `Authorization` header.
pub struct BearerAuthenticator {
    authenticator: Arc<Authenticator>,
}

impl BearerAuthenticator {
    #[must_use]
    pub const fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Verify the bearer token, if any.
    ///
    /// Returns `Ok(None)` when no `Authorization` header is present.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` when no token secret is configured
    /// (checked before the request is inspected), and
    /// `AuthError::Unauthenticated` for a non-`Bearer` scheme or a token that
    /// is invalid or expired.
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
        if !self.authenticator.has_token_secret() {
            return Err(AuthError::missing_secret());
        }

        let Some(header) = ctx.read_header(AUTHORIZATION) else {
            return Ok(None);
        };

        // The token follows the literal prefix; surrounding whitespace is
        // part of it and fails verification.
        let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
            AuthError::Unauthenticated("authorization scheme must be Bearer".to_string())
        })?;
        if token.is_empty() {
            return Err(AuthError::Unauthenticated("missing bearer token".to_string()));
        }

        match self.authenticator.verify(Some(token), RenewalPolicy::Reject) {
            VerifyOutcome::ValidFresh(identity) => {
                ctx.attach_identity(identity);
                Ok(Some(identity))
            }
            VerifyOutcome::Invalid(e) => Err(e),
            // Unreachable with a non-empty token and `Reject`.
            VerifyOutcome::NoToken | VerifyOutcome::ValidExpiredRenewable { .. } => Err(
                AuthError::Unauthenticated("token cannot be renewed in-band".to_string()),
            ),
        }
    }
}
