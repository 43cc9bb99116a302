//! JWT signing and verification.
//!
//! Provides HS256 signing of `Claims` and two verification modes:
//! strict (signature, structure, and expiry) and relaxed (signature and
//! structure only).
//!
//! # Pre-conditions
//! - The secret must be non-empty.
//! - `now` is supplied by the caller's clock, in unix seconds.
//!
//! # Post-conditions
//! - On success, returns the decoded claims.
//! - On failure, returns a descriptive error indicating what went wrong.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.
//! - The same inputs always produce the same outputs.
//! - Expiry is never checked against the system clock, only against `now`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::Role;

/// Claims carried in a token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user) identifier.
    pub id: u64,
    /// Role, serialized as a single-character code.
    pub role: Role,
    /// Renewable ("remember me") marker. Only cookie-flow tokens carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
    /// Issued-at, unix seconds.
    pub iat: u64,
    /// Expiry, unix seconds.
    pub exp: u64,
}

impl Claims {
    /// Whether the token may be silently reissued after expiry.
    #[must_use]
    pub fn is_renewable(&self) -> bool {
        self.remember == Some(true)
    }

    /// Whether the token has expired at `now` (unix seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: u64) -> bool {
        now >= self.exp
    }
}

/// Error returned when JWT signing or verification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT signature is valid but the token has expired.
    TokenExpired,
    /// The JWT is malformed or its payload cannot be parsed.
    MalformedToken,
    /// The key material was rejected.
    InvalidKey(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::InvalidKey(reason) => write!(f, "invalid key: {reason}"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Signs claims with HS256.
///
/// # Errors
/// Returns `JwtError::InvalidKey` if the secret is empty or encoding fails.
pub fn sign(claims: &Claims, secret: &[u8]) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidKey("secret must be non-empty".to_string()));
    }

    let header = Header::new(Algorithm::HS256);
    encode(&header, claims, &EncodingKey::from_secret(secret))
        .map_err(|e| JwtError::InvalidKey(e.to_string()))
}

/// Verifies signature, structure, and expiry.
///
/// # Errors
/// Returns `JwtError::TokenExpired` only when the signature is valid and the
/// token has expired at `now`; any other failure maps to its own variant.
pub fn verify_strict(token: &str, secret: &[u8], now: u64) -> Result<Claims, JwtError> {
    let claims = verify_relaxed(token, secret)?;
    if claims.is_expired_at(now) {
        return Err(JwtError::TokenExpired);
    }
    Ok(claims)
}

/// Verifies signature and structure, ignoring expiry.
///
/// # Errors
/// Returns `JwtError` if the signature or structure is invalid.
pub fn verify_relaxed(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidKey("secret must be non-empty".to_string()));
    }

    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked by the caller against an injected clock.
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::InvalidKeyFormat => JwtError::InvalidKey(error.to_string()),
        _ => JwtError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::{Engine, general_purpose::URL_SAFE_NO_PAD};

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";
    const NOW: u64 = 1_700_000_000;

    fn claims(remember: Option<bool>) -> Claims {
        Claims {
            id: 42,
            role: Role::Admin,
            remember,
            iat: NOW,
            exp: NOW + 86_400,
        }
    }

    fn payload_json(token: &str) -> serde_json::Value {
        let payload = token.split('.').nth(1).expect("payload segment");
        let bytes = URL_SAFE_NO_PAD.decode(payload).expect("base64url payload");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[test]
    fn test_sign_and_verify() {
        let token = sign(&claims(Some(true)), SECRET).expect("signed token");

        assert_eq!(token.split('.').count(), 3);
        let verified = verify_strict(&token, SECRET, NOW).expect("verified token");
        assert_eq!(verified, claims(Some(true)));
    }

    #[test]
    fn test_payload_field_names() {
        let token = sign(&claims(Some(false)), SECRET).expect("signed token");
        let payload = payload_json(&token);

        assert_eq!(payload["id"], 42);
        assert_eq!(payload["role"], "a");
        assert_eq!(payload["remember"], false);
        assert_eq!(payload["iat"], NOW);
        assert_eq!(payload["exp"], NOW + 86_400);
    }

    #[test]
    fn test_remember_omitted_when_absent() {
        let token = sign(&claims(None), SECRET).expect("signed token");
        let payload = payload_json(&token);

        assert!(payload.get("remember").is_none());
        let verified = verify_strict(&token, SECRET, NOW).expect("verified token");
        assert!(!verified.is_renewable());
    }

    #[test]
    fn test_strict_rejects_expired() {
        let token = sign(&claims(Some(true)), SECRET).expect("signed token");

        let result = verify_strict(&token, SECRET, NOW + 86_400);
        assert_eq!(result, Err(JwtError::TokenExpired));

        // One second earlier is still valid.
        assert!(verify_strict(&token, SECRET, NOW + 86_399).is_ok());
    }

    #[test]
    fn test_relaxed_ignores_expiry() {
        let token = sign(&claims(Some(true)), SECRET).expect("signed token");

        let verified = verify_relaxed(&token, SECRET).expect("verified token");
        assert!(verified.is_expired_at(NOW + 30 * 86_400));
        assert!(verified.is_renewable());
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign(&claims(None), SECRET).expect("signed token");

        let result = verify_strict(&token, b"wrong-secret-key-that-is-different", NOW);
        assert_eq!(result, Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_wrong_secret_wins_over_expiry() {
        let token = sign(&claims(Some(true)), SECRET).expect("signed token");

        let result = verify_strict(&token, b"wrong-secret", NOW + 90 * 86_400);
        assert_eq!(result, Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(
            verify_strict("not-a-valid-jwt", SECRET, NOW),
            Err(JwtError::MalformedToken)
        );
        assert_eq!(verify_strict("", SECRET, NOW), Err(JwtError::MalformedToken));
    }

    #[test]
    fn test_unknown_role_code_is_malformed() {
        let header = Header::new(Algorithm::HS256);
        let payload = serde_json::json!({ "id": 1, "role": "x", "iat": NOW, "exp": NOW + 10 });
        let token = encode(&header, &payload, &EncodingKey::from_secret(SECRET))
            .expect("signed token");

        assert_eq!(verify_relaxed(&token, SECRET), Err(JwtError::MalformedToken));
    }

    #[test]
    fn test_empty_secret() {
        assert!(matches!(
            sign(&claims(None), b""),
            Err(JwtError::InvalidKey(_))
        ));
        assert!(matches!(
            verify_relaxed("some.jwt.token", b""),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(
            JwtError::InvalidSignature.to_string(),
            "invalid JWT signature"
        );
        assert_eq!(JwtError::TokenExpired.to_string(), "JWT has expired");
        assert_eq!(JwtError::MalformedToken.to_string(), "malformed JWT");
        assert_eq!(
            JwtError::InvalidKey("bad key".to_string()).to_string(),
            "invalid key: bad key"
        );
    }
}
