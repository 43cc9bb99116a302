//! Host-based dispatch across the three sub-apps.
//!
//! Pre-conditions:
//! - `base_domain` is the bare domain the server answers for, without a port.
//!
//! Post-conditions:
//! - Every request is handled by exactly one sub-app router.
//! - Requests whose host is missing, unparseable, or not one of the known
//!   subdomains go to the public site.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::header,
    response::Response,
};
use tower::ServiceExt;

use super::{AppState, admin, api, www};

/// Which sub-app a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubApp {
    Www,
    Admin,
    Api,
}

impl SubApp {
    /// Pick the sub-app for a `Host` value.
    ///
    /// The port is ignored, as is letter case. The bare `base_domain`
    /// itself is the public site even if its first label reads `admin`
    /// or `api`.
    #[must_use]
    pub fn resolve(host: Option<&str>, base_domain: &str) -> Self {
        let Some(host) = host.map(strip_port).filter(|h| !h.is_empty()) else {
            return Self::Www;
        };
        let host = host.to_ascii_lowercase();
        if host == base_domain.to_ascii_lowercase() {
            return Self::Www;
        }
        match host.split('.').next() {
            Some("admin") => Self::Admin,
            Some("api") => Self::Api,
            _ => Self::Www,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Www => "www",
            Self::Admin => "admin",
            Self::Api => "api",
        }
    }
}

/// `host[:port]` or `[v6]:port` without the port.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.rsplit_once(':').map_or(host, |(name, _port)| name)
}

struct Sites {
    base_domain: String,
    www: Router,
    admin: Router,
    api: Router,
}

/// The top-level router: every path on every host goes through dispatch.
#[allow(clippy::disallowed_methods)] // AppState clone is Arc clones
pub fn router(state: AppState, base_domain: impl Into<String>) -> Router {
    let sites = Arc::new(Sites {
        base_domain: base_domain.into(),
        www: www::router(),
        admin: admin::router(state.clone()),
        api: api::router(state),
    });
    Router::new().fallback(dispatch).with_state(sites)
}

#[allow(clippy::disallowed_methods)] // Router clone is an Arc clone
async fn dispatch(State(sites): State<Arc<Sites>>, request: Request) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host());
    let site = SubApp::resolve(host, &sites.base_domain);
    tracing::debug!(
        "{} {} -> {}",
        request.method(),
        request.uri().path(),
        site.name()
    );

    let target = match site {
        SubApp::Www => sites.www.clone(),
        SubApp::Admin => sites.admin.clone(),
        SubApp::Api => sites.api.clone(),
    };
    match target.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
