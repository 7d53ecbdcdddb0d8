// src/mentor/handlers.rs

use axum::extract::{Extension, Json};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::{ChatRequest, ChatResponse, HistoryResponse, InterviewRequest, MentorMessage};
use crate::auth::AuthedUser;
use crate::common::{generate_message_id, ApiError, AppState};
use crate::services::openai::{extract_json_block, TextGenerationPurpose};

/// How many past messages ride along as chat context.
const HISTORY_WINDOW: i64 = 10;

/// POST /api/mentor/chat - Send a message to the career mentor
///
/// The user's message and the mentor's reply are both persisted, and the
/// last few turns are replayed into the prompt so the conversation has
/// continuity.
pub async fn chat(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Mentor chat message received");

    // Recent turns, oldest first, fetched before the new message lands
    let mut recent = sqlx::query_as::<_, MentorMessage>(
        "SELECT * FROM mentor_messages WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(&authed.id)
    .bind(HISTORY_WINDOW)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;
    recent.reverse();

    persist_message(&state.db, &authed.id, "user", message).await?;

    let prompt = build_chat_prompt(&recent, message);

    let reply = state
        .openai_service
        .generate_text(TextGenerationPurpose::MentorChat, &prompt, None)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %authed.id, "Mentor chat generation failed");
            ApiError::from_openai(
                e,
                ApiError::InternalServer("mentor is unavailable right now".to_string()),
            )
        })?;

    persist_message(&state.db, &authed.id, "assistant", &reply).await?;

    Ok(Json(ChatResponse { reply }))
}

/// GET /api/mentor/history - Full chat history, oldest first
pub async fn history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<HistoryResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let messages = sqlx::query_as::<_, MentorMessage>(
        "SELECT * FROM mentor_messages WHERE user_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let total = messages.len();
    Ok(Json(HistoryResponse { messages, total }))
}

/// POST /api/mentor/interview - Generate mock-interview questions
pub async fn interview_questions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(body): Json<InterviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.role.trim().is_empty() {
        return Err(ApiError::BadRequest("role is required".to_string()));
    }

    let state = state_lock.read().await.clone();

    let mut prompt = format!(
        r#"Generate 8 mock interview questions for a candidate applying for the role of "{}""#,
        body.role.trim()
    );
    if let Some(company) = body.company.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(r#" at "{}""#, company.trim()));
    }
    if let Some(seniority) = body.seniority.as_deref().filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!(" ({} level)", seniority.trim()));
    }
    prompt.push_str(
        r#".

Return a JSON object:
{"questions": [{"question": "...", "category": "technical|behavioral|role-specific", "hint": "what a strong answer covers"}]}

Return ONLY the JSON object."#,
    );

    let raw = state
        .openai_service
        .generate_text(TextGenerationPurpose::InterviewQuestions, &prompt, None)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %authed.id, "Interview question generation failed");
            ApiError::from_openai(
                e,
                ApiError::InternalServer(
                    "question generation is unavailable right now".to_string(),
                ),
            )
        })?;

    let json_text = extract_json_block(&raw);
    let questions: serde_json::Value = serde_json::from_str(&json_text).map_err(|e| {
        error!(error = %e, "Interview question output not parseable as JSON");
        ApiError::InternalServer("question generation returned malformed output".to_string())
    })?;

    info!(user_id = %authed.id, role = %body.role, "Interview questions generated");
    Ok(Json(questions))
}

// ---- Helper Functions ----

async fn persist_message(
    pool: &SqlitePool,
    user_id: &str,
    role: &str,
    content: &str,
) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO mentor_messages (id, user_id, role, content) VALUES (?, ?, ?, ?)")
        .bind(generate_message_id())
        .bind(user_id)
        .bind(role)
        .bind(content)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error persisting mentor message");
            ApiError::DatabaseError(e)
        })?;

    Ok(())
}

/// Replay recent turns ahead of the new message so the model sees the
/// conversation, not an isolated question.
pub(crate) fn build_chat_prompt(recent: &[MentorMessage], message: &str) -> String {
    if recent.is_empty() {
        return message.to_string();
    }

    let mut prompt = String::from("Conversation so far:\n");
    for turn in recent {
        let speaker = if turn.role == "user" { "Candidate" } else { "Mentor" };
        prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
    }
    prompt.push_str("\nCandidate: ");
    prompt.push_str(message);
    prompt
}
