// src/applications/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Application Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct JobApplication {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub company: String,
    pub applied_at: Option<String>,
    pub via: String,
    pub status: String,
    pub notes: Option<String>,
    pub link: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub role: String,
    pub company: String,
    pub applied_at: Option<String>,
    pub via: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    pub role: Option<String>,
    pub company: Option<String>,
    pub applied_at: Option<String>,
    pub via: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub link: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ApplicationListResponse {
    pub applications: Vec<JobApplication>,
    pub total: usize,
}

/// Result of a bulk import, echoed back to the client as
/// "N imported, M skipped".
#[derive(Serialize, Debug)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}
