#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code; a bad secret or port should exit cleanly.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use portal::{
    apps::{self, AppState},
    auth::{Authenticator, InMemoryCredentialStore, Role},
    config::ServerConfig,
    time::SystemTimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Id given to the seed superuser.
const SEED_ADMIN_ID: u64 = 1;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: base_domain={}, listen_port={}",
        config.base_domain,
        config.listen_port
    );
    if config.jwt_secret.is_none() {
        tracing::warn!("PORTAL_JWT_SECRET is not set; authenticated requests will fail with 500");
    }
    if config.cookie_secret.is_none() {
        tracing::warn!("PORTAL_COOKIE_SECRET is not set; sessions will not survive a restart");
    }

    let auth_config = match config.auth_config() {
        Ok(auth_config) => auth_config,
        Err(e) => {
            tracing::error!("Invalid authentication configuration: {e}");
            std::process::exit(1);
        }
    };
    let authenticator = Arc::new(Authenticator::new(auth_config, Arc::new(SystemTimeSource)));

    let credentials = InMemoryCredentialStore::new();
    if let Some(seed) = &config.seed_admin {
        if let Err(e) = credentials.insert(SEED_ADMIN_ID, &seed.email, Role::Superuser, &seed.password) {
            tracing::error!("Failed to create seed admin: {e}");
            std::process::exit(1);
        }
        tracing::info!("Seed superuser created: {}", seed.email);
    }

    let state = AppState::new(authenticator, Arc::new(credentials));
    let app = apps::router(state, config.base_domain.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
