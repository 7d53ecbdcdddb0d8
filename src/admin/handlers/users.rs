// src/admin/handlers/users.rs

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::{AuthedUser, User};
use crate::common::{ApiError, AppState};

/// GET /api/admin/users - List all users
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "User listing denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let state = state_lock.read().await.clone();

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        admin_user_id = %authed.id,
        total = users.len(),
        "User list fetched"
    );

    Ok(Json(serde_json::json!({
        "users": users,
        "total": users.len(),
    })))
}

/// DELETE /api/admin/users/:id - Delete a user and, via cascade, all their
/// profile, document, application, and mentor data
pub async fn delete_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "User deletion denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    if id == authed.id {
        return Err(ApiError::BadRequest(
            "admins cannot delete their own account".to_string(),
        ));
    }

    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, target_user_id = %id, "Database error deleting user");
            ApiError::DatabaseError(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("user not found".to_string()));
    }

    info!(
        admin_user_id = %authed.id,
        target_user_id = %id,
        "User deleted by admin"
    );

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
