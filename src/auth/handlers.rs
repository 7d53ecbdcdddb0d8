//! Authentication handlers

use axum::extract::{Extension, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{Claims, GoogleIdTokenPayload, User};
use crate::common::{generate_profile_id, generate_user_id, safe_email_log, ApiError, AppState};

/// POST /api/auth/google
/// Authenticates a user via Google OAuth ID token
///
/// # Request Body
/// ```json
/// {
///   "id_token": "<google id token>",
///   "invite_code": "optional"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "user": { ... }
/// }
/// ```
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleIdTokenPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("🔐 Received Google auth request");
    let state = state_lock.read().await.clone();

    // Verify token with Google's tokeninfo endpoint
    // Docs: https://developers.google.com/identity/sign-in/web/backend-auth
    let tokeninfo_url = format!(
        "https://oauth2.googleapis.com/tokeninfo?id_token={}",
        payload.id_token
    );

    debug!("Initiating Google token validation with tokeninfo endpoint");

    let resp = state.http.get(&tokeninfo_url).send().await;
    let body = match resp {
        Ok(r) => {
            let status = r.status();
            debug!(http_status = %status, "Received response from Google tokeninfo endpoint");

            if status.is_success() {
                match r.json::<serde_json::Value>().await {
                    Ok(j) => j,
                    Err(e) => {
                        error!(
                            error = %e,
                            "Failed to parse Google tokeninfo JSON response - malformed token"
                        );
                        return Err(ApiError::BadRequest("malformed id_token".to_string()));
                    }
                }
            } else {
                match status.as_u16() {
                    400 => {
                        warn!(
                            http_status = %status,
                            "Google tokeninfo returned 400 - invalid or malformed token"
                        );
                        return Err(ApiError::BadRequest(
                            "invalid or malformed id_token".to_string(),
                        ));
                    }
                    401 => {
                        warn!(
                            http_status = %status,
                            "Google tokeninfo returned 401 - expired or invalid token"
                        );
                        return Err(ApiError::Unauthorized(
                            "expired or invalid id_token".to_string(),
                        ));
                    }
                    _ => {
                        warn!(
                            http_status = %status,
                            "Google tokeninfo returned error status"
                        );
                        return Err(ApiError::BadRequest(
                            "id_token validation failed".to_string(),
                        ));
                    }
                }
            }
        }
        Err(e) => {
            error!(
                error = %e,
                endpoint = "https://oauth2.googleapis.com/tokeninfo",
                "HTTP error contacting Google tokeninfo endpoint"
            );
            return Err(ApiError::InternalServer(
                "google token validation service unavailable".to_string(),
            ));
        }
    };

    // Extract required fields: email, sub, email_verified
    let email = body
        .get("email")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let sub = body.get("sub").and_then(|v| v.as_str()).map(str::to_string);
    let name = body
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let picture = body
        .get("picture")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let (email, sub) = match (email, sub) {
        (Some(e), Some(s)) => (e, s),
        (email, sub) => {
            warn!(
                has_email = email.is_some(),
                has_sub = sub.is_some(),
                "Google token missing required fields (email/sub)"
            );
            return Err(ApiError::BadRequest(
                "token missing required fields".to_string(),
            ));
        }
    };

    if let Some(email_verified) = body.get("email_verified").and_then(|v| v.as_bool()) {
        if !email_verified {
            warn!("Google token contains unverified email address");
        }
    }

    // Check token expiration
    if let Some(exp) = body.get("exp").and_then(|v| v.as_i64()) {
        let current_time = Utc::now().timestamp();
        if exp < current_time {
            warn!(
                token_exp = exp,
                current_time = current_time,
                "Google token has expired"
            );
            return Err(ApiError::Unauthorized("token has expired".to_string()));
        }
    }

    // Validate audience (client id) when configured
    if let Some(client_id) = &state.google_client_id {
        match body.get("aud").and_then(|v| v.as_str()) {
            Some(aud_val) => {
                if aud_val != client_id {
                    warn!(
                        token_audience = %aud_val,
                        expected_client_id = %client_id,
                        "Google token audience validation failed - rejecting token"
                    );
                    return Err(ApiError::Unauthorized(
                        "token audience mismatch".to_string(),
                    ));
                }
            }
            None => {
                warn!(
                    expected_client_id = %client_id,
                    "Google token missing audience field - rejecting token"
                );
                return Err(ApiError::Unauthorized("token missing audience".to_string()));
            }
        }
    }

    debug!(
        email = %safe_email_log(&email),
        provider = "google",
        provider_id = %sub,
        "Google token validation successful, proceeding with user lookup"
    );

    // Create or find user in DB
    let existing: Option<User> = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE provider = ? AND provider_id = ?",
    )
    .bind("google")
    .bind(&sub)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            provider = "google",
            provider_id = %sub,
            "Database error checking existing user during OAuth flow"
        );
        ApiError::DatabaseError(e)
    })?;

    let user = match existing {
        Some(u) => u,
        None => {
            // New accounts need a valid invitation when invite-only mode is on.
            // Admin emails are always allowed in.
            if state.invite_only && !state.admin_emails.contains(&email.to_lowercase()) {
                let code = payload.invite_code.as_deref().unwrap_or("").trim();
                if code.is_empty() {
                    warn!(
                        email = %safe_email_log(&email),
                        "Registration rejected: invite-only mode and no invitation code supplied"
                    );
                    return Err(ApiError::Forbidden(
                        "an invitation code is required to register".to_string(),
                    ));
                }
                redeem_invitation(&state.db, code, &email).await?;
            }

            let id = generate_user_id();
            info!(
                user_id = %id,
                email = %safe_email_log(&email),
                provider = "google",
                "Creating new user account via Google OAuth"
            );

            if let Err(e) = sqlx::query(
                "INSERT OR IGNORE INTO users (id, email, name, avatar, provider, provider_id) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&email)
            .bind(name.as_deref())
            .bind(picture.as_deref())
            .bind("google")
            .bind(&sub)
            .execute(&state.db)
            .await
            {
                error!(
                    error = %e,
                    user_id = %id,
                    email = %safe_email_log(&email),
                    provider = "google",
                    "Database error inserting new user during OAuth flow"
                );
                return Err(ApiError::DatabaseError(e));
            }

            match sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(&id)
                .fetch_one(&state.db)
                .await
            {
                Ok(row) => {
                    info!(
                        user_id = %id,
                        email = %safe_email_log(&email),
                        "New user account created successfully via Google OAuth"
                    );
                    row
                }
                Err(e) => {
                    error!(
                        error = %e,
                        user_id = %id,
                        "Database error fetching newly created user during OAuth flow"
                    );
                    return Err(ApiError::DatabaseError(e));
                }
            }
        }
    };

    // Make sure a profile row exists so GET /api/profile never 404s.
    // Not critical for the OAuth flow itself, so failures are logged only.
    if let Err(e) = ensure_profile_row(&state.db, &user.id).await {
        error!(error = %e, user_id = %user.id, "Failed to ensure profile row during login");
    }

    // create JWT
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        exp,
    };
    let token = match encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(
                error = %e,
                user_id = %user.id,
                "JWT encoding error during authentication"
            );
            return Err(ApiError::InternalServer("jwt error".to_string()));
        }
    };

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        provider = "google",
        "User authentication successful via Google OAuth"
    );

    let is_admin = state.admin_emails.contains(&user.email.to_lowercase());

    let resp = serde_json::json!({
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "avatar": user.avatar,
            "is_admin": is_admin,
        },
    });

    Ok(Json(resp))
}

/// POST /api/auth/dev-login
/// Issues a JWT for the configured dev user. Only available when dev mode
/// is enabled; always 404-equivalent otherwise.
pub async fn dev_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !state.dev_mode.is_enabled() {
        return Err(ApiError::NotFound("not found".to_string()));
    }

    let dev_user = state.dev_mode.create_dev_user();

    // Upsert the dev user so FK-bound rows (profile, documents) work
    sqlx::query(
        "INSERT OR IGNORE INTO users (id, email, name, avatar, provider, provider_id) VALUES (?, ?, ?, NULL, 'dev', ?)",
    )
    .bind(&dev_user.id)
    .bind(&dev_user.email)
    .bind(&dev_user.name)
    .bind(&dev_user.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if let Err(e) = ensure_profile_row(&state.db, &dev_user.id).await {
        error!(error = %e, user_id = %dev_user.id, "Failed to ensure profile row for dev user");
    }

    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: dev_user.id.clone(),
        exp,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, "JWT encoding error during dev login");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(user_id = %dev_user.id, "DEV MODE: Issued dev login token");

    let is_admin =
        state.dev_mode.user_is_admin || state.admin_emails.contains(&dev_user.email.to_lowercase());

    Ok(Json(serde_json::json!({
        "token": token,
        "user": {
            "id": dev_user.id,
            "email": dev_user.email,
            "name": dev_user.name,
            "avatar": serde_json::Value::Null,
            "is_admin": is_admin,
        },
    })))
}

/// GET /api/me
/// Returns the current authenticated user's information
#[axum::debug_handler]
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    // In dev mode, return the dev user directly without database lookup
    if state.dev_mode.is_enabled() {
        let dev_user = state.dev_mode.create_dev_user();
        let resp = serde_json::json!({
            "user": dev_user,
            "is_admin": authed.is_admin
        });
        return Ok(Json(resp));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let resp = serde_json::json!({
        "user": user,
        "is_admin": authed.is_admin
    });
    Ok(Json(resp))
}

/// POST /api/auth/logout
/// Logout is handled client-side with JWT tokens; this endpoint just
/// confirms the request.
pub async fn logout_handler(_authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!("User logout successful");
    let resp = serde_json::json!({
        "message": "Logout successful"
    });
    Ok(Json(resp))
}

// ---- Helper Functions ----

/// Atomically claim an unredeemed, unexpired invitation code.
/// The UPDATE's WHERE clause is the guard, so two concurrent
/// registrations cannot redeem the same code.
async fn redeem_invitation(pool: &SqlitePool, code: &str, email: &str) -> Result<(), ApiError> {
    let result = sqlx::query(
        r#"
        UPDATE invitations
        SET redeemed_by = ?, redeemed_at = datetime('now')
        WHERE code = ?
          AND redeemed_by IS NULL
          AND (expires_at IS NULL OR expires_at > datetime('now'))
          AND (email IS NULL OR email = '' OR lower(email) = lower(?))
        "#,
    )
    .bind(email)
    .bind(code)
    .bind(email)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Database error redeeming invitation code");
        ApiError::DatabaseError(e)
    })?;

    if result.rows_affected() == 0 {
        warn!(
            email = %safe_email_log(email),
            "Invitation redemption failed: code invalid, expired, redeemed, or bound to another email"
        );
        return Err(ApiError::Forbidden(
            "invitation code is invalid or has already been used".to_string(),
        ));
    }

    info!(email = %safe_email_log(email), "Invitation code redeemed");
    Ok(())
}

async fn ensure_profile_row(pool: &SqlitePool, user_id: &str) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT OR IGNORE INTO profiles (id, user_id) VALUES (?, ?)",
    )
    .bind(generate_profile_id())
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(())
}
