// src/profile/routes.rs

use axum::{routing::get, Router};

use super::handlers::profile;

pub fn profile_routes() -> Router {
    Router::new().route(
        "/api/profile",
        get(profile::profile_handler).put(profile::update_profile_handler),
    )
}
