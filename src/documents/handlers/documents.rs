// src/documents/handlers/documents.rs

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::super::models::{Document, DocumentListResponse};
use crate::auth::AuthedUser;
use crate::common::{generate_document_id, ApiError, AppState};
use crate::services::document_text::{MIME_DOCX, MIME_PDF};

/// POST /api/documents - Upload a CV or cover letter
///
/// Multipart fields: `file` (required, PDF or DOCX) and `kind`
/// ("cv" default, or "cover_letter"). The real file type is sniffed
/// from the bytes; the client's content type is ignored.
pub async fn upload_document(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Document upload request received");

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_filename = String::from("document");
    let mut kind = String::from("cv");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart body".to_string()))?
    {
        match field.name() {
            Some("file") => {
                original_filename = field.file_name().unwrap_or("document").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("invalid file".to_string()))?;
                file_bytes = Some(data.to_vec());
            }
            Some("kind") => {
                kind = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("invalid kind field".to_string()))?;
            }
            _ => {}
        }
    }

    let bytes = file_bytes
        .ok_or_else(|| ApiError::BadRequest("missing 'file' field in upload".to_string()))?;

    if kind != "cv" && kind != "cover_letter" {
        return Err(ApiError::BadRequest(
            "kind must be 'cv' or 'cover_letter'".to_string(),
        ));
    }

    // Sniff the real type from the bytes
    let mime_type = match infer::get(&bytes).map(|info| info.mime_type()) {
        Some(MIME_PDF) => MIME_PDF,
        // DOCX is a zip container; infer reports the container or the
        // office type depending on the file, accept both
        Some(MIME_DOCX) | Some("application/zip") => MIME_DOCX,
        other => {
            warn!(
                user_id = %authed.id,
                detected = ?other,
                filename = %original_filename,
                "Rejected upload with unsupported file type"
            );
            return Err(ApiError::UnsupportedFormat(
                "only PDF and DOCX documents are supported".to_string(),
            ));
        }
    };

    let id = generate_document_id();
    let extension = if mime_type == MIME_PDF { "pdf" } else { "docx" };
    let filename = format!("{}.{}", id, extension);

    // Store under a per-user directory
    let user_dir = state.documents_dir.join(&authed.id);
    tokio_fs::create_dir_all(&user_dir).await.map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Failed to create user document directory");
        ApiError::InternalServer("failed to store document".to_string())
    })?;

    let file_path = user_dir.join(&filename);
    tokio_fs::write(&file_path, &bytes).await.map_err(|e| {
        error!(
            error = %e,
            file_path = %file_path.display(),
            "Failed to write uploaded document"
        );
        ApiError::InternalServer("failed to store document".to_string())
    })?;

    sqlx::query(
        r#"INSERT INTO documents (id, user_id, filename, original_filename, kind, mime_type, status)
           VALUES (?, ?, ?, ?, ?, ?, 'uploaded')"#,
    )
    .bind(&id)
    .bind(&authed.id)
    .bind(&filename)
    .bind(&original_filename)
    .bind(&kind)
    .bind(mime_type)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, document_id = %id, "Database error inserting document");
        ApiError::DatabaseError(e)
    })?;

    let document = fetch_owned_document(&state, &id, &authed.id).await?;

    info!(
        document_id = %id,
        user_id = %authed.id,
        kind = %kind,
        mime_type = %mime_type,
        "Document uploaded"
    );

    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/documents - List the user's documents
pub async fn list_documents(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let documents = sqlx::query_as::<_, Document>(
        "SELECT * FROM documents WHERE user_id = ? ORDER BY uploaded_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let total = documents.len();
    Ok(Json(DocumentListResponse { documents, total }))
}

/// DELETE /api/documents/:id - Delete a document and its file
pub async fn delete_document(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let document = fetch_owned_document(&state, &id, &authed.id).await?;

    let file_path = state
        .documents_dir
        .join(&authed.id)
        .join(&document.filename);
    if let Err(e) = tokio_fs::remove_file(&file_path).await {
        // The DB row is the source of truth; a missing file is not fatal
        warn!(
            error = %e,
            file_path = %file_path.display(),
            "Failed to remove document file during delete"
        );
    }

    sqlx::query("DELETE FROM documents WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(document_id = %id, user_id = %authed.id, "Document deleted");
    Ok(Json(serde_json::json!({ "message": "Document deleted" })))
}

// ---- Helper Functions ----

pub(super) async fn fetch_owned_document(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<Document, ApiError> {
    sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("document not found".to_string()))
}
