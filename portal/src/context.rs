//! Narrow request/response interface used by the authenticators.
//!
//! The cookie and bearer flows only ever read a cookie, write a cookie, read
//! a header, set a status, and attach an identity. `RequestContext` exposes
//! exactly that, so neither flow depends on a particular HTTP framework.

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};

use crate::auth::{Identity, SetCookie};

/// What an authenticator may see and change about a request.
pub trait RequestContext {
    /// Value of the named request cookie, if present.
    fn read_cookie(&self, name: &str) -> Option<String>;

    /// Queue a cookie to be set on the response.
    fn write_cookie(&mut self, cookie: SetCookie);

    /// Value of the named request header, if present and valid UTF-8.
    fn read_header(&self, name: &str) -> Option<String>;

    /// Record the response status the authenticator decided on.
    fn set_status(&mut self, status: StatusCode);

    /// Identity attached to this request so far.
    fn identity(&self) -> Option<Identity>;

    /// Attach a verified identity to this request.
    fn attach_identity(&mut self, identity: Identity);
}

/// `RequestContext` over an axum request's headers.
///
/// Collects writes so the middleware can apply them to the response once the
/// request's borrow has ended.
#[derive(Debug)]
pub struct HttpContext<'a> {
    headers: &'a HeaderMap,
    cookies: Vec<SetCookie>,
    status: Option<StatusCode>,
    identity: Option<Identity>,
}

/// Writes collected by an `HttpContext`.
#[derive(Debug, Default)]
pub struct ContextOutput {
    pub cookies: Vec<SetCookie>,
    pub status: Option<StatusCode>,
    pub identity: Option<Identity>,
}

impl ContextOutput {
    /// Append the queued cookies to a response's headers.
    pub fn apply_cookies(&self, headers: &mut HeaderMap) {
        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_header_value()) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("dropping unencodable cookie {}: {e}", cookie.name),
            }
        }
    }
}

impl<'a> HttpContext<'a> {
    #[must_use]
    pub const fn new(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            cookies: Vec::new(),
            status: None,
            identity: None,
        }
    }

    /// Release the request borrow, keeping what the authenticator wrote.
    #[must_use]
    pub fn finish(self) -> ContextOutput {
        ContextOutput {
            cookies: self.cookies,
            status: self.status,
            identity: self.identity,
        }
    }
}

impl RequestContext for HttpContext<'_> {
    fn read_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    fn write_cookie(&mut self, cookie: SetCookie) {
        self.cookies.push(cookie);
    }

    fn read_header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn identity(&self) -> Option<Identity> {
        self.identity
    }

    fn attach_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }
}
