// src/documents/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Document Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub original_filename: String,
    pub kind: String,
    pub mime_type: String,
    pub status: String,
    pub uploaded_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub job_description: String,
}
