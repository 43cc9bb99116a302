//! Session cookie signing and `Set-Cookie` formatting.
//!
//! The cookie value is `<token>.<mac>`, where `mac` is the base64url (no
//! padding) HMAC-SHA256 of the token under the cookie secret. The cookie MAC
//! is independent of the token's own signature.

use base64::engine::{Engine, general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "portal_session";

/// Error returned when a signed cookie value cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// The value has no `.<mac>` suffix.
    MissingSignature,
    /// The MAC does not match the value.
    BadSignature,
}

impl std::fmt::Display for CookieError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSignature => write!(f, "cookie is not signed"),
            Self::BadSignature => write!(f, "cookie signature mismatch"),
        }
    }
}

impl std::error::Error for CookieError {}

fn mac_for(value: &str, secret: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret).unwrap_or_else(|_| unreachable!());
    mac.update(value.as_bytes());
    mac
}

/// Append an HMAC to `value`.
#[must_use]
pub fn sign_value(value: &str, secret: &[u8]) -> String {
    let tag = mac_for(value, secret).finalize().into_bytes();
    format!("{value}.{}", URL_SAFE_NO_PAD.encode(tag))
}

/// Check and strip the HMAC appended by [`sign_value`].
///
/// # Errors
/// Returns `CookieError` if the MAC is missing, undecodable, or wrong.
pub fn verify_value<'a>(signed: &'a str, secret: &[u8]) -> Result<&'a str, CookieError> {
    let (value, tag) = signed
        .rsplit_once('.')
        .ok_or(CookieError::MissingSignature)?;
    let tag = URL_SAFE_NO_PAD
        .decode(tag)
        .map_err(|_| CookieError::BadSignature)?;

    mac_for(value, secret)
        .verify_slice(&tag)
        .map_err(|_| CookieError::BadSignature)?;

    Ok(value)
}

/// When a cookie written to the client should expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieExpiry {
    /// No `Expires` attribute; the browser drops it at session end.
    Session,
    /// Absolute expiry, unix seconds.
    At(u64),
    /// Remove the cookie immediately.
    Clear,
}

/// A cookie to be sent in a `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expiry: CookieExpiry,
}

impl SetCookie {
    #[must_use]
    pub fn new(name: &str, value: String, expiry: CookieExpiry) -> Self {
        Self {
            name: name.to_string(),
            value,
            expiry,
        }
    }

    /// A cookie that removes `name` from the client.
    #[must_use]
    pub fn clear(name: &str) -> Self {
        Self::new(name, String::new(), CookieExpiry::Clear)
    }

    /// Render as a `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.name, self.value
        );
        match self.expiry {
            CookieExpiry::Session => {}
            CookieExpiry::At(secs) => {
                header.push_str("; Expires=");
                header.push_str(&http_date(secs));
            }
            CookieExpiry::Clear => {
                header.push_str("; Max-Age=0; Expires=");
                header.push_str(&http_date(0));
            }
        }
        header
    }
}

/// Format unix seconds as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(secs: u64) -> String {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
