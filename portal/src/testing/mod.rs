//! Shared fixtures for router-level tests.

#![cfg(test)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Response, header};

use crate::apps::AppState;
use crate::auth::{AuthConfig, Authenticator, InMemoryCredentialStore, Role, SESSION_COOKIE};
use crate::time::{SimulatedTimeSource, TimeSource};

pub const TOKEN_SECRET: &[u8] = b"test-token-secret";
pub const COOKIE_SECRET: &[u8] = b"test-cookie-secret";
pub const DAY_SECS: u64 = 86_400;

pub const ADMIN_ID: u64 = 42;
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub const GUEST_ID: u64 = 7;
pub const GUEST_EMAIL: &str = "guest@example.com";
pub const GUEST_PASSWORD: &str = "guest-pass";

/// App state over a simulated clock, seeded with one admin and one guest.
#[allow(clippy::disallowed_methods)]
pub fn test_state_with(token_secret: Option<&[u8]>) -> (AppState, Arc<SimulatedTimeSource>) {
    let clock = Arc::new(SimulatedTimeSource::default_start());
    let config = AuthConfig::new(token_secret.map(<[u8]>::to_vec), COOKIE_SECRET.to_vec())
        .expect("valid auth config");
    let authenticator = Arc::new(Authenticator::new(
        config,
        Arc::clone(&clock) as Arc<dyn TimeSource>,
    ));

    let store = InMemoryCredentialStore::new();
    store
        .insert(ADMIN_ID, ADMIN_EMAIL, Role::Admin, ADMIN_PASSWORD)
        .expect("seed admin");
    store
        .insert(GUEST_ID, GUEST_EMAIL, Role::Guest, GUEST_PASSWORD)
        .expect("seed guest");

    (AppState::new(authenticator, Arc::new(store)), clock)
}

pub fn test_state() -> (AppState, Arc<SimulatedTimeSource>) {
    test_state_with(Some(TOKEN_SECRET))
}

/// Every `Set-Cookie` header for the session cookie, in response order.
pub fn session_set_cookies(headers: &HeaderMap) -> Vec<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// The full `Set-Cookie` header a browser would keep for the session
/// cookie: the last one wins.
pub fn session_set_cookie(headers: &HeaderMap) -> Option<String> {
    session_set_cookies(headers).pop()
}

/// The session cookie a browser would send next, as `name=value`.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    session_set_cookie(headers)
        .and_then(|v| v.split(';').next().map(str::to_string))
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
