// src/mentor/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn mentor_routes() -> Router {
    Router::new()
        .route("/api/mentor/chat", post(handlers::chat))
        .route("/api/mentor/history", get(handlers::history))
        .route("/api/mentor/interview", post(handlers::interview_questions))
}
