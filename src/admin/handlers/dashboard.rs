// src/admin/handlers/dashboard.rs

use axum::{extract::Extension, Json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::admin::models::DashboardStats;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/admin/dashboard - Aggregate platform statistics
pub async fn dashboard_stats(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<DashboardStats>, ApiError> {
    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "Dashboard access denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let state = state_lock.read().await.clone();

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let total_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let total_applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let status_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
    let applications_by_status: HashMap<String, i64> = status_rows.into_iter().collect();

    let pending_invitations: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM invitations
           WHERE redeemed_by IS NULL
             AND (expires_at IS NULL OR expires_at > datetime('now'))"#,
    )
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(admin_user_id = %authed.id, "Dashboard statistics fetched");

    Ok(Json(DashboardStats {
        total_users,
        total_documents,
        total_applications,
        applications_by_status,
        pending_invitations,
    }))
}
