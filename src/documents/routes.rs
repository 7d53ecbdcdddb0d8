// src/documents/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{documents, extraction, review};

pub fn document_routes() -> Router {
    Router::new()
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route(
            "/api/documents/:id",
            axum::routing::delete(documents::delete_document),
        )
        .route(
            "/api/documents/:id/extract",
            post(extraction::extract_document),
        )
        .route("/api/documents/:id/review", post(review::review_document))
}
