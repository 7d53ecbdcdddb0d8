// src/profile/handlers/profile.rs

use axum::extract::{Extension, Json};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::super::merger::{merge_profile, ExtractedProfileFields, LanguagesField, ProfileFields};
use super::super::models::{Profile, UpdateProfileRequest};
use super::super::validators::ProfileValidator;
use crate::auth::{AuthedUser, User};
use crate::common::{generate_profile_id, ApiError, AppState, Validator};

/// GET /api/profile - Get user profile
pub async fn profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = load_or_create_profile(&state.db, &authed.id).await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let response = serde_json::json!({
        "user": user,
        "is_admin": authed.is_admin,
        "profile": profile,
    });

    Ok(Json(response))
}

/// PUT /api/profile - Update user profile
///
/// Manual edits go through the same merge policy as CV extraction:
/// only non-empty values replace stored data, skills and experience
/// replace outright when supplied.
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Profile update request received");

    let validation = ProfileValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let existing = load_or_create_profile(&state.db, &authed.id).await?;
    let stored = existing.fields();

    let languages_provided = request.languages.is_some();
    let extracted = ExtractedProfileFields {
        name: request.name,
        email: request.email,
        phone: request.phone,
        position: request.position,
        skills: request.skills,
        experience: request.experience,
        languages: request.languages.map(LanguagesField::Text),
    };

    let mut merged = merge_profile(Some(&stored), &extracted);
    // The merge always re-renders languages, which would stamp the
    // "not found" sentinel over an untouched field. Manual edits keep
    // the stored value unless the payload carries languages.
    if !languages_provided {
        merged.languages = stored.languages.clone();
    }

    persist_profile_fields(&state.db, &authed.id, &merged).await?;

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %authed.id,
                "Database error fetching updated profile"
            );
            ApiError::DatabaseError(e)
        })?;

    info!(user_id = %authed.id, "Profile updated successfully");

    Ok(Json(profile))
}

// ---- Helper Functions ----

/// Fetch the user's profile row, creating an empty one on first access.
pub async fn load_or_create_profile(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Profile, ApiError> {
    sqlx::query("INSERT OR IGNORE INTO profiles (id, user_id) VALUES (?, ?)")
        .bind(generate_profile_id())
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error loading profile");
            ApiError::DatabaseError(e)
        })
}

/// Write a merged field set back to the profile row.
pub async fn persist_profile_fields(
    pool: &SqlitePool,
    user_id: &str,
    fields: &ProfileFields,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE profiles SET
            name = ?,
            email = ?,
            phone = ?,
            position = ?,
            skills = ?,
            experience = ?,
            languages = ?,
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.phone)
    .bind(&fields.position)
    .bind(&fields.skills)
    .bind(&fields.experience)
    .bind(&fields.languages)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "Database error persisting profile fields");
        ApiError::DatabaseError(e)
    })?;

    Ok(())
}
