//! Server configuration module.
//!
//! This module provides configuration loading for the portal server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `PORTAL_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `PORTAL_BASE_DOMAIN`: Domain the `www`/`admin`/`api` subdomains hang off (default: `localhost`)
//! - `PORTAL_JWT_SECRET`: Token signing secret (optional; without it every authenticated request fails with 500)
//! - `PORTAL_COOKIE_SECRET`: Session cookie signing secret (optional; random per process if unset)
//! - `PORTAL_ADMIN_EMAIL` / `PORTAL_ADMIN_PASSWORD`: Seed superuser (optional, both or neither)
//!
//! # Invariants
//!
//! - `listen_port` is always a valid port number (1-65535)
//! - Secrets, when present, are non-empty

use crate::auth::{AuthConfig, auth_config::AuthConfigError};

/// Seed account created at startup.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
/// - `jwt_secret` and `cookie_secret` are `None` or non-empty
#[derive(Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub listen_port: u16,
    /// Base domain; `admin.<base>` and `api.<base>` select the sub-apps.
    pub base_domain: String,
    /// Token signing secret.
    pub jwt_secret: Option<Vec<u8>>,
    /// Session cookie signing secret.
    pub cookie_secret: Option<Vec<u8>>,
    /// Optional superuser created at startup.
    pub seed_admin: Option<SeedAdmin>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("listen_port", &self.listen_port)
            .field("base_domain", &self.base_domain)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("cookie_secret", &self.cookie_secret.as_ref().map(|_| "<redacted>"))
            .field("seed_admin", &self.seed_admin)
            .finish()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default base domain.
    pub const DEFAULT_BASE_DOMAIN: &'static str = "localhost";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PORTAL_LISTEN_PORT` is set but not a valid port number
    /// - a secret is set but empty
    /// - only one of `PORTAL_ADMIN_EMAIL` / `PORTAL_ADMIN_PASSWORD` is set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_port = Self::load_listen_port(&lookup)?;
        let base_domain = lookup("PORTAL_BASE_DOMAIN")
            .filter(|domain| !domain.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_BASE_DOMAIN.to_string())
            .to_ascii_lowercase();
        let jwt_secret = Self::load_secret(&lookup, "PORTAL_JWT_SECRET")?;
        let cookie_secret = Self::load_secret(&lookup, "PORTAL_COOKIE_SECRET")?;
        let seed_admin = Self::load_seed_admin(&lookup)?;

        Ok(Self {
            listen_port,
            base_domain,
            jwt_secret,
            cookie_secret,
            seed_admin,
        })
    }

    /// Build the authenticator configuration.
    ///
    /// Without a configured cookie secret, a random one is generated; admin
    /// sessions then do not survive a restart.
    ///
    /// # Errors
    ///
    /// Propagates `AuthConfigError` for empty secrets.
    pub fn auth_config(&self) -> Result<AuthConfig, AuthConfigError> {
        let cookie_secret = self
            .cookie_secret
            .clone()
            .unwrap_or_else(|| rand::random::<[u8; 32]>().to_vec());
        AuthConfig::new(self.jwt_secret.clone(), cookie_secret)
    }

    /// Load the listen port.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("PORTAL_LISTEN_PORT") {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port != 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: "PORTAL_LISTEN_PORT".to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    /// Load an optional secret; set-but-empty is an error.
    fn load_secret<F>(lookup: &F, name: &str) -> Result<Option<Vec<u8>>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(name) {
            Some(value) if value.is_empty() => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: "must not be empty".to_string(),
            }),
            Some(value) => Ok(Some(value.into_bytes())),
            None => Ok(None),
        }
    }

    /// Load the seed superuser; both variables or neither.
    fn load_seed_admin<F>(lookup: &F) -> Result<Option<SeedAdmin>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (lookup("PORTAL_ADMIN_EMAIL"), lookup("PORTAL_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                if !email.contains('@') {
                    return Err(ConfigError::InvalidValue {
                        name: "PORTAL_ADMIN_EMAIL".to_string(),
                        message: format!("'{email}' is not an email address"),
                    });
                }
                Ok(Some(SeedAdmin { email, password }))
            }
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "PORTAL_ADMIN_PASSWORD".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("PORTAL_ADMIN_EMAIL".to_string())),
            (None, None) => Ok(None),
        }
    }
}
