// src/admin/handlers/invitations.rs

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::admin::models::{CreateInvitationRequest, Invitation};
use crate::auth::AuthedUser;
use crate::common::{generate_invitation_id, generate_raw_id, ApiError, AppState};

/// POST /api/admin/invitations - Issue an invitation code
///
/// The code may optionally be bound to an email and given an expiry.
/// No email is sent; the admin shares the code out of band.
pub async fn create_invitation(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<Invitation>), ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "Invitation creation denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    if let Some(days) = body.expires_in_days {
        if days <= 0 {
            return Err(ApiError::BadRequest(
                "expires_in_days must be positive".to_string(),
            ));
        }
    }

    let state = state_lock.read().await.clone();

    let id = generate_invitation_id();
    let code = generate_raw_id(10);
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let expires_at = body.expires_in_days.map(|days| {
        (chrono::Utc::now() + chrono::Duration::days(days))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    });

    sqlx::query(
        r#"INSERT INTO invitations (id, code, email, created_by, expires_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&code)
    .bind(email)
    .bind(&authed.id)
    .bind(expires_at.as_deref())
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, invitation_id = %id, "Database error creating invitation");
        ApiError::DatabaseError(e)
    })?;

    let invitation = sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        admin_user_id = %authed.id,
        invitation_id = %id,
        "Invitation created"
    );

    Ok((StatusCode::CREATED, Json(invitation)))
}

/// GET /api/admin/invitations - List all invitations, newest first
pub async fn list_invitations(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "Invitation listing denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let state = state_lock.read().await.clone();

    let invitations = sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(serde_json::json!({
        "invitations": invitations,
        "total": invitations.len(),
    })))
}

/// DELETE /api/admin/invitations/:id - Revoke an unredeemed invitation
pub async fn revoke_invitation(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "Invitation revocation denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let state = state_lock.read().await.clone();

    // Redeemed invitations stay on record
    let result = sqlx::query("DELETE FROM invitations WHERE id = ? AND redeemed_by IS NULL")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "invitation not found or already redeemed".to_string(),
        ));
    }

    info!(
        admin_user_id = %authed.id,
        invitation_id = %id,
        "Invitation revoked"
    );

    Ok(Json(serde_json::json!({ "message": "Invitation revoked" })))
}
