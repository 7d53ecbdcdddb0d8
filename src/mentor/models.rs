// src/mentor/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Mentor Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct MentorMessage {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize, Debug)]
pub struct HistoryResponse {
    pub messages: Vec<MentorMessage>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct InterviewRequest {
    pub role: String,
    pub company: Option<String>,
    pub seniority: Option<String>,
}
