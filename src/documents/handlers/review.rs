// src/documents/handlers/review.rs

use axum::{
    extract::{Extension, Path},
    response::Json,
};
use std::sync::Arc;
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::super::models::ReviewRequest;
use super::super::scoring;
use super::documents::fetch_owned_document;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::services::document_text;

/// POST /api/documents/:id/review - Score a document against a job description
///
/// The LLM's raw sub-scores are never trusted for the overall number;
/// the weighted overall score is recomputed deterministically before the
/// response leaves the server.
pub async fn review_document(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.job_description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "job_description is required".to_string(),
        ));
    }

    let state = state_lock.read().await.clone();
    let document = fetch_owned_document(&state, &id, &authed.id).await?;

    let file_path = state
        .documents_dir
        .join(&authed.id)
        .join(&document.filename);
    let bytes = tokio_fs::read(&file_path).await.map_err(|e| {
        error!(
            error = %e,
            file_path = %file_path.display(),
            "Failed to read stored document for review"
        );
        ApiError::ExtractionError("stored document could not be read".to_string())
    })?;

    let text = document_text::extract_text(&bytes, &document.mime_type).map_err(|e| {
        error!(document_id = %id, error = %e, "Document text extraction failed during review");
        ApiError::ExtractionError("document could not be parsed".to_string())
    })?;

    let mut review = state
        .openai_service
        .review_document(&text, &body.job_description)
        .await
        .map_err(|e| {
            error!(error = %e, document_id = %id, "LLM review failed");
            ApiError::from_openai(
                e,
                ApiError::ExtractionError("document review failed".to_string()),
            )
        })?;

    scoring::apply_overall_score(&mut review);

    info!(
        document_id = %id,
        user_id = %authed.id,
        overall_score = %review["overall_score"],
        "Document review completed"
    );

    Ok(Json(review))
}
