// src/applications/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{applications, import};

pub fn application_routes() -> Router {
    Router::new()
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/api/applications/import",
            post(import::import_applications),
        )
        .route(
            "/api/applications/export",
            get(applications::export_applications),
        )
        .route(
            "/api/applications/:id",
            get(applications::get_application)
                .put(applications::update_application)
                .delete(applications::delete_application),
        )
}
