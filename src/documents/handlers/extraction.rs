// src/documents/handlers/extraction.rs

use axum::{
    extract::{Extension, Path},
    response::Json,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::documents::fetch_owned_document;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::profile::handlers::profile::{load_or_create_profile, persist_profile_fields};
use crate::profile::merge_profile;
use crate::services::document_text;

/// POST /api/documents/:id/extract - Extract profile fields from a document
///
/// Pipeline: read stored file, parse to plain text, run the LLM structured
/// extraction, merge the result into the stored profile. Only non-empty
/// extracted values replace stored data. The document's status tracks the
/// attempt so a failed extraction is visible to the client.
pub async fn extract_document(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let document = fetch_owned_document(&state, &id, &authed.id).await?;

    info!(
        document_id = %id,
        user_id = %authed.id,
        mime_type = %document.mime_type,
        "Starting profile extraction from document"
    );

    set_document_status(&state.db, &id, "extracting").await?;

    let result = run_extraction(&state, &authed.id, &document).await;

    match result {
        Ok(profile) => {
            set_document_status(&state.db, &id, "extracted").await?;
            info!(document_id = %id, user_id = %authed.id, "Profile extraction completed");
            Ok(Json(serde_json::json!({
                "status": "extracted",
                "profile": profile,
            })))
        }
        Err(e) => {
            // Best effort; the original error is the one worth returning
            if let Err(status_err) = set_document_status(&state.db, &id, "failed").await {
                error!(
                    error = %status_err,
                    document_id = %id,
                    "Failed to mark document as failed after extraction error"
                );
            }
            Err(e)
        }
    }
}

async fn run_extraction(
    state: &AppState,
    user_id: &str,
    document: &super::super::models::Document,
) -> Result<crate::profile::models::Profile, ApiError> {
    let file_path = state.documents_dir.join(user_id).join(&document.filename);

    let bytes = tokio_fs::read(&file_path).await.map_err(|e| {
        error!(
            error = %e,
            file_path = %file_path.display(),
            "Failed to read stored document for extraction"
        );
        ApiError::ExtractionError("stored document could not be read".to_string())
    })?;

    let text =
        document_text::extract_text(&bytes, &document.mime_type).map_err(|e| match e {
            document_text::DocumentTextError::UnsupportedFormat(m) => {
                ApiError::UnsupportedFormat(m)
            }
            document_text::DocumentTextError::Parse(m) => {
                error!(
                    document_id = %document.id,
                    error = %m,
                    "Document text extraction failed"
                );
                ApiError::ExtractionError(format!("document could not be parsed: {}", m))
            }
        })?;

    if text.trim().is_empty() {
        return Err(ApiError::ExtractionError(
            "document contains no extractable text".to_string(),
        ));
    }

    let extracted = state
        .openai_service
        .extract_profile_fields(&text)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                document_id = %document.id,
                "LLM profile extraction failed"
            );
            ApiError::from_openai(
                e,
                ApiError::ExtractionError("profile extraction failed".to_string()),
            )
        })?;

    // Merge into the stored profile: non-empty wins, skills/experience
    // replace, languages re-rendered from the extraction
    let existing = load_or_create_profile(&state.db, user_id).await?;
    let merged = merge_profile(Some(&existing.fields()), &extracted);
    persist_profile_fields(&state.db, user_id, &merged).await?;

    load_or_create_profile(&state.db, user_id).await
}

async fn set_document_status(
    pool: &SqlitePool,
    document_id: &str,
    status: &str,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE documents SET status = ? WHERE id = ?")
        .bind(status)
        .bind(document_id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                document_id = %document_id,
                status = %status,
                "Database error updating document status"
            );
            ApiError::DatabaseError(e)
        })?;

    Ok(())
}
