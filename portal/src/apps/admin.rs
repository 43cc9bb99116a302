//! Admin back-office, authenticated by the signed session cookie.
//!
//! Every route runs behind `cookie_auth`, which verifies (and, for
//! remembered sessions, silently renews) the cookie. Failures clear the
//! cookie and send the browser to `/login`.

use axum::{
    Form, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;

use super::{AppState, CurrentUser, LoginError, check_credentials};
use crate::auth::{AuthError, SESSION_COOKIE, SetCookie};
use crate::context::{ContextOutput, HttpContext};

const LOGIN_PATH: &str = "/login";

#[allow(clippy::disallowed_methods)] // AppState clone is Arc clones
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/logout", get(logout))
        .layer(middleware::from_fn_with_state(state.clone(), cookie_auth))
        .with_state(state)
}

async fn cookie_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut ctx = HttpContext::new(request.headers());
    let result = state.cookies.authenticate(&mut ctx);
    let output = ctx.finish();

    match result {
        Ok(identity) => {
            if let Some(identity) = identity {
                if !output.cookies.is_empty() {
                    tracing::debug!("renewed session cookie for user {}", identity.id);
                }
                request.extensions_mut().insert(identity);
            }
            let mut response = next.run(request).await;
            // Login and logout replace the session; a renewal must not undo that.
            if !session_cookie_set(response.headers()) {
                output.apply_cookies(response.headers_mut());
            }
            response
        }
        Err(e @ AuthError::Configuration(_)) => {
            tracing::error!("admin request rejected: {e}");
            (e.status(), "Server authentication is misconfigured.").into_response()
        }
        Err(e) => {
            tracing::warn!("admin session rejected ({}): {e}", e.status());
            // Let the login form itself through anonymously so a stale cookie
            // cannot block signing in again.
            let mut response = if request.uri().path() == LOGIN_PATH {
                next.run(request).await
            } else {
                Redirect::to(LOGIN_PATH).into_response()
            };
            // A successful login in the same response already replaced it.
            if session_cookie_set(response.headers()) {
                return response;
            }
            ContextOutput {
                cookies: vec![SetCookie::clear(SESSION_COOKIE)],
                ..ContextOutput::default()
            }
            .apply_cookies(response.headers_mut());
            response
        }
    }
}

fn session_cookie_set(headers: &HeaderMap) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

async fn dashboard(CurrentUser(identity): CurrentUser) -> Response {
    match identity {
        None => Redirect::to(LOGIN_PATH).into_response(),
        Some(identity) if !identity.role.is_staff() => {
            (StatusCode::FORBIDDEN, "Admin access required.").into_response()
        }
        Some(identity) => format!(
            "Signed in as user {} ({}).",
            identity.id, identity.role
        )
        .into_response(),
    }
}

async fn login_page(CurrentUser(identity): CurrentUser) -> Response {
    if identity.is_some_and(|identity| identity.role.is_staff()) {
        return Redirect::to("/").into_response();
    }
    "POST email, password and optional remember=on to /login.".into_response()
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
    #[serde(default)]
    remember: Option<String>,
}

impl LoginForm {
    fn remember_me(&self) -> bool {
        self.remember
            .as_deref()
            .is_some_and(|value| matches!(value, "on" | "true" | "1"))
    }
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let remember_me = form.remember_me();
    let user = match check_credentials(&state.credentials, form.email, form.password).await {
        Ok(user) => user,
        Err(LoginError::InvalidCredentials) => {
            tracing::info!("admin login failed: invalid credentials");
            return (StatusCode::UNAUTHORIZED, "Invalid email or password.").into_response();
        }
        Err(e) => {
            tracing::error!("admin login failed: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let headers = HeaderMap::new();
    let mut ctx = HttpContext::new(&headers);
    if let Err(e) = state.cookies.login(&mut ctx, user.id, user.role, remember_me) {
        tracing::error!("admin login failed: {e}");
        return (e.status(), "Server authentication is misconfigured.").into_response();
    }
    tracing::info!("user {} signed in to admin (remember={remember_me})", user.id);

    let mut response = Redirect::to("/").into_response();
    ctx.finish().apply_cookies(response.headers_mut());
    response
}

async fn logout(State(state): State<AppState>, CurrentUser(identity): CurrentUser) -> Response {
    let headers = HeaderMap::new();
    let mut ctx = HttpContext::new(&headers);
    state.cookies.logout(&mut ctx);
    if let Some(identity) = identity {
        tracing::info!("user {} signed out of admin", identity.id);
    }

    let mut response = Redirect::to(LOGIN_PATH).into_response();
    ctx.finish().apply_cookies(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ADMIN_EMAIL, ADMIN_PASSWORD, DAY_SECS, GUEST_EMAIL, GUEST_PASSWORD, body_string,
        session_cookie, session_set_cookie, session_set_cookies, test_state, test_state_with,
    };
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn login_request(email: &str, password: &str, remember: bool) -> Request<Body> {
        let mut body = format!("email={email}&password={password}");
        if remember {
            body.push_str("&remember=on");
        }
        Request::post(LOGIN_PATH)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request")
    }

    fn get_with_cookie(path: &str, cookie: &str) -> Request<Body> {
        Request::get(path)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .expect("request")
    }

    async fn login_cookie(app: &Router, email: &str, password: &str, remember: bool) -> String {
        let response = app
            .clone()
            .oneshot(login_request(email, password, remember))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(response.headers()).expect("session cookie")
    }

    #[tokio::test]
    async fn test_anonymous_dashboard_redirects_to_login() {
        let (state, _clock) = test_state();
        let response = router(state)
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_login_then_dashboard() {
        let (state, _clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, false).await;
        let response = app
            .clone()
            .oneshot(get_with_cookie("/", &cookie))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(session_cookie(response.headers()).is_none());
        assert_eq!(body_string(response).await, "Signed in as user 42 (admin).");
    }

    #[tokio::test]
    async fn test_login_cookie_expiry_follows_remember() {
        let (state, _clock) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(login_request(ADMIN_EMAIL, ADMIN_PASSWORD, true))
            .await
            .expect("response");
        let set_cookie = session_set_cookie(response.headers()).expect("set-cookie");
        assert!(set_cookie.contains("Expires="));
        assert!(set_cookie.contains("HttpOnly"));

        let response = app
            .oneshot(login_request(ADMIN_EMAIL, ADMIN_PASSWORD, false))
            .await
            .expect("response");
        let set_cookie = session_set_cookie(response.headers()).expect("set-cookie");
        assert!(!set_cookie.contains("Expires="));
    }

    #[tokio::test]
    async fn test_bad_password_is_unauthorized() {
        let (state, _clock) = test_state();
        let response = router(state)
            .oneshot(login_request(ADMIN_EMAIL, "wrong", false))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(session_cookie(response.headers()).is_none());
    }

    #[tokio::test]
    async fn test_guest_is_forbidden() {
        let (state, _clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, GUEST_EMAIL, GUEST_PASSWORD, false).await;
        let response = app
            .oneshot(get_with_cookie("/", &cookie))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_remembered_session_renews_after_expiry() {
        let (state, clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, true).await;
        clock.advance_secs(DAY_SECS + 60);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/", &cookie))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let renewed = session_cookie(response.headers()).expect("renewed cookie");
        assert_ne!(renewed, cookie);
        assert!(
            session_set_cookie(response.headers())
                .expect("set-cookie")
                .contains("Expires=")
        );

        // The renewed cookie works without another renewal.
        let response = app
            .oneshot(get_with_cookie("/", &renewed))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(session_cookie(response.headers()).is_none());
    }

    #[tokio::test]
    async fn test_expired_session_cookie_redirects_and_clears() {
        let (state, clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, false).await;
        clock.advance_secs(DAY_SECS + 60);

        let response = app
            .oneshot(get_with_cookie("/", &cookie))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(
            session_set_cookie(response.headers())
                .expect("set-cookie")
                .contains("Max-Age=0")
        );
    }

    #[tokio::test]
    async fn test_stale_cookie_does_not_block_login() {
        let (state, _clock) = test_state();
        let app = router(state);

        let mut request = login_request(ADMIN_EMAIL, ADMIN_PASSWORD, false);
        request.headers_mut().insert(
            header::COOKIE,
            format!("{SESSION_COOKIE}=garbage.value").parse().expect("header"),
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        // Only the fresh session cookie is set, not a clear after it.
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 1);
        let set_cookie = session_set_cookie(response.headers()).expect("set-cookie");
        assert!(!set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let (state, _clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, true).await;
        let response = app
            .oneshot(get_with_cookie("/logout", &cookie))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert_eq!(
            session_cookie(response.headers()).as_deref(),
            Some("portal_session=")
        );
    }

    #[tokio::test]
    async fn test_logout_with_expired_remembered_cookie() {
        let (state, clock) = test_state();
        let app = router(state);

        let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, true).await;
        clock.advance_secs(DAY_SECS + 60);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/logout", &cookie))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        // The clear is the only session cookie; no renewal follows it.
        let cookies = session_set_cookies(response.headers());
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Max-Age=0"));

        let cleared = session_cookie(response.headers()).expect("cleared cookie");
        assert_eq!(cleared, "portal_session=");
        let response = app
            .oneshot(get_with_cookie("/", &cleared))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_login_replaces_renewable_session_of_other_user() {
        let (state, clock) = test_state();
        let app = router(state);

        let admin_cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD, true).await;
        clock.advance_secs(DAY_SECS + 60);

        let mut request = login_request(GUEST_EMAIL, GUEST_PASSWORD, false);
        request
            .headers_mut()
            .insert(header::COOKIE, admin_cookie.parse().expect("header"));
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(session_set_cookies(response.headers()).len(), 1);

        // The browser now holds the guest's session, not a renewed admin one.
        let guest_cookie = session_cookie(response.headers()).expect("guest cookie");
        let response = app
            .oneshot(get_with_cookie("/", &guest_cookie))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_secret_is_server_error() {
        let (state, _clock) = test_state_with(None);
        let app = router(state);

        let response = app
            .clone()
            .oneshot(login_request(ADMIN_EMAIL, ADMIN_PASSWORD, true))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let signed = crate::auth::cookie::sign_value("a.b.c", crate::testing::COOKIE_SECRET);
        let response = app
            .oneshot(get_with_cookie("/", &format!("{SESSION_COOKIE}={signed}")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
