// src/admin/handlers/settings.rs

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::admin::models::UpdateSystemSettingsRequest;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::services::settings::SettingsError;

/// Keys whose values are encrypted at rest and masked on read.
const SENSITIVE_KEYS: &[&str] = &["openai_api_key", "sentry_dsn"];

/// GET /api/admin/settings - Get all system settings
///
/// Sensitive values are masked down to their last four characters so an
/// admin can verify which key is configured without re-exposing it.
pub async fn get_system_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "System settings access denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let mut settings_map = state
        .settings_service
        .get_all_settings()
        .await
        .map_err(|e| {
            error!(error = %e, "Error fetching system settings");
            ApiError::InternalServer(format!("Failed to fetch settings: {}", e))
        })?;

    for (key, value) in settings_map.iter_mut() {
        if SENSITIVE_KEYS.contains(&key.as_str()) {
            *value = mask_value(value);
        }
    }

    info!(
        admin_user_id = %authed.id,
        settings_count = settings_map.len(),
        "System settings fetched"
    );

    Ok(Json(settings_map))
}

/// PUT /api/admin/settings - Update system settings
pub async fn update_system_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpdateSystemSettingsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "System settings update denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    info!(
        admin_user_id = %authed.id,
        settings_count = request.settings.len(),
        "Updating system settings"
    );

    if !state.settings_service.is_encryption_available() {
        let needs_encryption = request.settings.iter().any(|(key, update)| {
            update
                .encrypt
                .unwrap_or_else(|| SENSITIVE_KEYS.contains(&key.as_str()))
        });
        if needs_encryption {
            warn!(
                admin_user_id = %authed.id,
                "Encryption requested but not available"
            );
            return Err(ApiError::BadRequest(
                "Encryption not configured. Set ENCRYPTION_MASTER_KEY environment variable."
                    .to_string(),
            ));
        }
    }

    let mut updated_count = 0;
    let mut errors = Vec::new();

    for (key, setting_update) in request.settings.iter() {
        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            errors.push(format!("Invalid setting key: {}", key));
            continue;
        }

        let should_encrypt = setting_update
            .encrypt
            .unwrap_or_else(|| SENSITIVE_KEYS.contains(&key.as_str()));

        let result = state
            .settings_service
            .set_setting(key, &setting_update.value, should_encrypt, Some(&authed.id))
            .await;

        match result {
            Ok(_) => {
                updated_count += 1;
                debug!(
                    admin_user_id = %authed.id,
                    setting_key = %key,
                    encrypted = should_encrypt,
                    "System setting updated successfully"
                );
            }
            Err(e) => {
                error!(
                    error = %e,
                    setting_key = %key,
                    "Error updating system setting"
                );
                errors.push(format!("Failed to update {}: {}", key, e));
            }
        }
    }

    if !errors.is_empty() && updated_count == 0 {
        error!(
            admin_user_id = %authed.id,
            errors = ?errors,
            "All system settings updates failed"
        );
        return Err(ApiError::BadRequest(format!(
            "Failed to update settings: {}",
            errors.join(", ")
        )));
    }

    info!(
        admin_user_id = %authed.id,
        updated_count = updated_count,
        error_count = errors.len(),
        "System settings update completed"
    );

    Ok(Json(serde_json::json!({
        "message": "Settings updated successfully",
        "updated_count": updated_count,
        "errors": errors
    })))
}

/// DELETE /api/admin/settings/:key - Remove a system setting
///
/// The key falls back to its environment-variable default (if any) on the
/// next read.
pub async fn delete_system_setting(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            "System setting delete denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    state
        .settings_service
        .delete_setting(&key)
        .await
        .map_err(|e| match e {
            SettingsError::NotFound(_) => {
                ApiError::NotFound(format!("Setting not found: {}", key))
            }
            other => {
                error!(error = %other, setting_key = %key, "Error deleting system setting");
                ApiError::InternalServer(format!("Failed to delete setting: {}", other))
            }
        })?;

    info!(
        admin_user_id = %authed.id,
        setting_key = %key,
        "System setting deleted"
    );

    Ok(Json(serde_json::json!({ "message": "Setting deleted" })))
}

// ---- Helper Functions ----

fn mask_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if value.len() <= 4 {
        return "••••".to_string();
    }
    let tail: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("••••{}", tail)
}

#[cfg(test)]
mod tests {
    use super::mask_value;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_value("sk-abcdef123456"), "••••3456");
    }

    #[test]
    fn short_values_are_fully_masked() {
        assert_eq!(mask_value("abcd"), "••••");
        assert_eq!(mask_value("ab"), "••••");
    }

    #[test]
    fn empty_value_stays_empty() {
        assert_eq!(mask_value(""), "");
    }
}
