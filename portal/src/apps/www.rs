//! Public marketing site. No authentication.

use axum::{Router, routing::get};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> &'static str {
    "Welcome to Portal."
}
