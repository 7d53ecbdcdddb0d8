// src/documents/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod scoring;

pub use models::*;
pub use routes::document_routes;
