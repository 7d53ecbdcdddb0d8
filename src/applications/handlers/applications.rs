// src/applications/handlers/applications.rs

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::super::models::{
    ApplicationListResponse, CreateApplicationRequest, JobApplication, UpdateApplicationRequest,
};
use super::super::validators::ApplicationValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_application_id, ApiError, AppState, Validator};

/// GET /api/applications - List the user's applications
pub async fn list_applications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<ApplicationListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let applications = sqlx::query_as::<_, JobApplication>(
        "SELECT * FROM applications WHERE user_id = ? ORDER BY applied_at DESC, created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing applications");
        ApiError::DatabaseError(e)
    })?;

    let total = applications.len();
    Ok(Json(ApplicationListResponse {
        applications,
        total,
    }))
}

/// POST /api/applications - Create an application
pub async fn create_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(body): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let validation = ApplicationValidator.validate(&body);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();
    let id = generate_application_id();

    sqlx::query(
        r#"INSERT INTO applications (id, user_id, role, company, applied_at, via, status, notes, link)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&authed.id)
    .bind(body.role.trim())
    .bind(body.company.trim())
    .bind(body.applied_at.as_deref())
    .bind(body.via.as_deref().unwrap_or("Other"))
    .bind(body.status.as_deref().unwrap_or("No Response"))
    .bind(body.notes.as_deref())
    .bind(body.link.as_deref())
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            application_id = %id,
            user_id = %authed.id,
            "Database error creating application"
        );
        ApiError::DatabaseError(e)
    })?;

    let application = fetch_owned_application(&state, &id, &authed.id).await?;

    info!(application_id = %id, user_id = %authed.id, "Application created");
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/:id - Get a single application
pub async fn get_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<JobApplication>, ApiError> {
    let state = state_lock.read().await.clone();
    let application = fetch_owned_application(&state, &id, &authed.id).await?;
    Ok(Json(application))
}

/// PUT /api/applications/:id - Update an application
pub async fn update_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateApplicationRequest>,
) -> Result<Json<JobApplication>, ApiError> {
    let validation = ApplicationValidator.validate(&body);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();

    // Ownership check before mutating
    let existing = fetch_owned_application(&state, &id, &authed.id).await?;

    sqlx::query(
        r#"UPDATE applications SET
            role = ?, company = ?, applied_at = ?, via = ?, status = ?,
            notes = ?, link = ?, updated_at = datetime('now')
           WHERE id = ? AND user_id = ?"#,
    )
    .bind(body.role.as_deref().map(str::trim).unwrap_or(&existing.role))
    .bind(
        body.company
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.company),
    )
    .bind(body.applied_at.as_deref().or(existing.applied_at.as_deref()))
    .bind(body.via.as_deref().unwrap_or(&existing.via))
    .bind(body.status.as_deref().unwrap_or(&existing.status))
    .bind(body.notes.as_deref().or(existing.notes.as_deref()))
    .bind(body.link.as_deref().or(existing.link.as_deref()))
    .bind(&id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            application_id = %id,
            user_id = %authed.id,
            "Database error updating application"
        );
        ApiError::DatabaseError(e)
    })?;

    let application = fetch_owned_application(&state, &id, &authed.id).await?;

    info!(application_id = %id, user_id = %authed.id, "Application updated");
    Ok(Json(application))
}

/// DELETE /api/applications/:id - Delete an application
pub async fn delete_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM applications WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                application_id = %id,
                user_id = %authed.id,
                "Database error deleting application"
            );
            ApiError::DatabaseError(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("application not found".to_string()));
    }

    info!(application_id = %id, user_id = %authed.id, "Application deleted");
    Ok(Json(serde_json::json!({ "message": "Application deleted" })))
}

/// GET /api/applications/export - Export the user's applications as CSV
///
/// Columns mirror the import schema so a round trip through
/// export-then-import is lossless.
pub async fn export_applications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let applications = sqlx::query_as::<_, JobApplication>(
        "SELECT * FROM applications WHERE user_id = ? ORDER BY applied_at DESC, created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(["Role", "Company", "Applied Date", "Via", "Status", "Notes", "Link"])
        .map_err(|e| {
            error!(error = %e, "CSV write error during export");
            ApiError::InternalServer("failed to build CSV export".to_string())
        })?;

    for app in &applications {
        writer
            .write_record([
                app.role.as_str(),
                app.company.as_str(),
                app.applied_at.as_deref().unwrap_or(""),
                app.via.as_str(),
                app.status.as_str(),
                app.notes.as_deref().unwrap_or(""),
                app.link.as_deref().unwrap_or(""),
            ])
            .map_err(|e| {
                error!(error = %e, "CSV write error during export");
                ApiError::InternalServer("failed to build CSV export".to_string())
            })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| {
            error!(error = %e, "CSV flush error during export");
            ApiError::InternalServer("failed to build CSV export".to_string())
        })?;

    info!(
        user_id = %authed.id,
        count = applications.len(),
        "Applications exported as CSV"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"applications.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

// ---- Helper Functions ----

async fn fetch_owned_application(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<JobApplication, ApiError> {
    sqlx::query_as::<_, JobApplication>("SELECT * FROM applications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("application not found".to_string()))
}
