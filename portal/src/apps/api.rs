//! JSON API, authenticated by `Authorization: Bearer`.
//!
//! Tokens come from `POST /auth` and are never renewed in-band.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AppState, CurrentUser, LoginError, check_credentials};
use crate::auth::AuthError;
use crate::context::HttpContext;

#[allow(clippy::disallowed_methods)] // AppState clone is Arc clones
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(me))
        .layer(middleware::from_fn_with_state(state.clone(), bearer_auth));

    Router::new()
        .route("/auth", post(authenticate))
        .merge(protected)
        .with_state(state)
}

/// JSON error body with the status, plus `WWW-Authenticate: Basic` on 401.
fn error_response(status: StatusCode, message: &str) -> Response {
    let mut response = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
    }
    response
}

async fn bearer_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut ctx = HttpContext::new(request.headers());
    let result = state.bearer.authenticate(&mut ctx);
    let output = ctx.finish();

    match result {
        Ok(identity) => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(e) => {
            let status = output.status.unwrap_or_else(|| e.status());
            match &e {
                AuthError::Configuration(_) => tracing::error!("api request rejected: {e}"),
                AuthError::Unauthenticated(_) => tracing::warn!("api request rejected: {e}"),
            }
            let message = match e {
                AuthError::Configuration(_) => "server authentication is misconfigured",
                AuthError::Unauthenticated(_) => "invalid or expired token",
            };
            error_response(status, message)
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    /// Expiry, unix seconds.
    expires: u64,
}

async fn authenticate(State(state): State<AppState>, Json(body): Json<AuthRequest>) -> Response {
    let user = match check_credentials(&state.credentials, body.email, body.password).await {
        Ok(user) => user,
        Err(LoginError::InvalidCredentials) => {
            tracing::info!("api auth failed: invalid credentials");
            return error_response(StatusCode::UNAUTHORIZED, "invalid email or password");
        }
        Err(e) => {
            tracing::error!("api auth failed: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    match state.authenticator.issue_bearer(user.id, user.role) {
        Ok(issued) => {
            tracing::info!("issued api token for user {}", user.id);
            Json(AuthResponse {
                token: issued.token,
                expires: issued.expires_at,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("api auth failed: {e}");
            error_response(e.status(), "server authentication is misconfigured")
        }
    }
}

/// The token's identity, as long as its user still exists.
async fn me(State(state): State<AppState>, CurrentUser(identity): CurrentUser) -> Response {
    let Some(identity) = identity else {
        return error_response(StatusCode::UNAUTHORIZED, "authentication required");
    };

    match state.credentials.find_by_id(identity.id) {
        Ok(Some(_)) => Json(json!({
            "id": identity.id,
            "role": identity.role.name(),
        }))
        .into_response(),
        Ok(None) => {
            tracing::warn!("api token for unknown user {}", identity.id);
            error_response(StatusCode::UNAUTHORIZED, "authentication required")
        }
        Err(e) => {
            tracing::error!("user lookup failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
