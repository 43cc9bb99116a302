//! Credential store.
//!
//! Provides the `CredentialStore` trait the login endpoints depend on, and an
//! in-memory implementation keyed by user id with argon2 password hashes.
//!
//! # Pre-conditions
//! - Emails are compared case-insensitively.
//! - Passwords are hashed before they are stored; plaintext is never kept.
//!
//! # Post-conditions
//! - Lookups are thread-safe and non-blocking for reads.
//!
//! # Invariants
//! - No two users share an email (case-insensitively).
//! - Stored entries are never partially constructed.

use std::collections::HashMap;
use std::sync::RwLock;

use super::Role;

/// Associated data mixed into every password hash.
const HASH_AD: &[u8] = b"portal";

/// A user known to the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub role: Role,
    /// Encoded argon2 hash.
    pub password_hash: String,
}

/// Errors that can occur when reading or writing credentials.
#[derive(Debug)]
pub enum CredentialError {
    /// Hashing or verifying a password failed.
    Hash(argon2::Error),
    /// The store's lock was poisoned by a panicking writer.
    LockPoisoned,
    /// A user with this email already exists.
    DuplicateEmail(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(e) => write!(f, "password hash error: {e}"),
            Self::LockPoisoned => write!(f, "credential store lock poisoned"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
        }
    }
}

impl std::error::Error for CredentialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hash(e) => Some(e),
            Self::LockPoisoned | Self::DuplicateEmail(_) => None,
        }
    }
}

impl From<argon2::Error> for CredentialError {
    fn from(e: argon2::Error) -> Self {
        Self::Hash(e)
    }
}

/// User lookup and password verification.
pub trait CredentialStore: Send + Sync {
    /// Find a user by email, case-insensitively.
    ///
    /// # Errors
    /// Returns `CredentialError::LockPoisoned` if the store is unusable.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError>;

    /// Find a user by id.
    ///
    /// # Errors
    /// Returns `CredentialError::LockPoisoned` if the store is unusable.
    fn find_by_id(&self, id: u64) -> Result<Option<User>, CredentialError>;

    /// Check `password` against the user's stored hash. CPU-heavy; call from
    /// a blocking context.
    ///
    /// # Errors
    /// Returns `CredentialError::Hash` if the stored hash cannot be decoded.
    fn verify_password(&self, user: &User, password: &str) -> Result<bool, CredentialError>;
}

/// argon2 parameters for password hashes.
#[must_use]
pub fn hash_config() -> argon2::Config<'static> {
    let mut config = argon2::Config::default();

    config.ad = HASH_AD;
    config.variant = argon2::Variant::Argon2id;
    config.lanes = 1;
    config.mem_cost = 4096;
    config.time_cost = 3;
    config.hash_length = 32;

    config
}

/// Hash a password with a fresh random salt.
///
/// # Errors
/// Returns `CredentialError::Hash` if argon2 rejects the parameters.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt: [u8; 16] = rand::random();
    Ok(argon2::hash_encoded(password.as_bytes(), &salt, &hash_config())?)
}

/// An in-memory credential store.
///
/// # Thread Safety
///
/// Uses `RwLock`, allowing concurrent readers with exclusive access for
/// inserts.
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<u64, User>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Hash `password` and add a user.
    ///
    /// # Errors
    /// Returns `CredentialError::DuplicateEmail` if the email is taken, or
    /// `CredentialError::Hash` if hashing fails.
    pub fn insert(
        &self,
        id: u64,
        email: &str,
        role: Role,
        password: &str,
    ) -> Result<User, CredentialError> {
        let password_hash = hash_password(password)?;
        let user = User {
            id,
            email: email.to_string(),
            role,
            password_hash,
        };

        let mut users = self
            .users
            .write()
            .map_err(|_| CredentialError::LockPoisoned)?;
        if users
            .values()
            .any(|existing| existing.id != id && existing.email.eq_ignore_ascii_case(email))
        {
            return Err(CredentialError::DuplicateEmail(email.to_string()));
        }
        users.insert(id, user.clone());

        Ok(user)
    }

    /// Number of users in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().map_or(0, |users| users.len())
    }

    /// Whether the store has no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        let users = self
            .users
            .read()
            .map_err(|_| CredentialError::LockPoisoned)?;
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<User>, CredentialError> {
        let users = self
            .users
            .read()
            .map_err(|_| CredentialError::LockPoisoned)?;
        Ok(users.get(&id).cloned())
    }

    fn verify_password(&self, user: &User, password: &str) -> Result<bool, CredentialError> {
        let config = hash_config();
        Ok(argon2::verify_encoded_ext(
            &user.password_hash,
            password.as_bytes(),
            config.secret,
            config.ad,
        )?)
    }
}
