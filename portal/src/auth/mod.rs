//! Authentication module.
//!
//! Token issuance and verification shared by the admin (cookie) and API
//! (bearer) apps, plus the credential store the login endpoints use.
//!
//! # Pre-conditions
//! - An `Authenticator` is built once at startup from an explicit
//!   `AuthConfig` and clock.
//!
//! # Post-conditions
//! - Authentication configuration is immutable once loaded.
//!
//! # Invariants
//! - Nothing in this module logs; callers report outcomes.

pub mod auth_config;
pub mod authenticator;
pub mod bearer;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod role;
pub mod session;

pub use auth_config::AuthConfig;
pub use authenticator::{Authenticator, Identity, IssuedToken, RenewalPolicy, VerifyOutcome};
pub use bearer::BearerAuthenticator;
pub use cookie::{CookieExpiry, SESSION_COOKIE, SetCookie};
pub use credentials::{CredentialError, CredentialStore, InMemoryCredentialStore, User};
pub use error::AuthError;
pub use jwt::JwtError;
pub use role::Role;
pub use session::CookieAuthenticator;
