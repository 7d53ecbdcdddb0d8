// src/services/settings.rs
use crate::services::encryption::{EncryptionError, EncryptionService};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Setting not found: {0}")]
    NotFound(String),

    #[error("Encryption error: {0}")]
    EncryptionError(#[from] EncryptionError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
struct CachedSetting {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Runtime settings backed by the system_settings table, with a short TTL
/// cache and optional AES-GCM encryption of sensitive keys. Falls back to
/// environment variables for keys absent from the database.
#[derive(Debug)]
pub struct SettingsService {
    db: SqlitePool,
    cache: Arc<RwLock<HashMap<String, CachedSetting>>>,
    encryption: Option<EncryptionService>,
    cache_ttl: Duration,
}

impl SettingsService {
    pub fn new(db: SqlitePool) -> Self {
        let encryption = match EncryptionService::from_env() {
            Ok(service) => {
                info!("Encryption service initialized successfully");
                Some(service)
            }
            Err(e) => {
                warn!(
                    "Encryption service not available: {}. Sensitive settings will not be encrypted.",
                    e
                );
                None
            }
        };

        Self {
            db,
            cache: Arc::new(RwLock::new(HashMap::new())),
            encryption,
            cache_ttl: Duration::minutes(5),
        }
    }

    /// Look up a setting. Resolution order: cache, database, then the
    /// upper-cased key as an environment variable.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, SettingsError> {
        if let Some(cached) = self.cached_value(key).await {
            return Ok(Some(cached));
        }

        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT value, encrypted FROM system_settings WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        let Some((stored, encrypted)) = row else {
            if let Ok(env_value) = env::var(key.to_uppercase()) {
                debug!(key = %key, "Setting retrieved from environment variable");
                return Ok(Some(env_value));
            }
            debug!(key = %key, "Setting not found");
            return Ok(None);
        };

        let value = self
            .decode_stored(key, stored, encrypted)?
            .ok_or_else(|| SettingsError::InvalidConfig(
                "Encryption service not configured".to_string(),
            ))?;

        self.cache_value(key, &value).await;
        debug!(key = %key, "Setting retrieved from database");
        Ok(Some(value))
    }

    /// Write a setting, optionally encrypting the stored value.
    pub async fn set_setting(
        &self,
        key: &str,
        value: &str,
        encrypt: bool,
        updated_by: Option<&str>,
    ) -> Result<(), SettingsError> {
        let stored_value = if encrypt {
            match &self.encryption {
                Some(service) => service.encrypt(value).map_err(|e| {
                    error!(key = %key, error = %e, "Failed to encrypt setting");
                    SettingsError::EncryptionError(e)
                })?,
                None => {
                    return Err(SettingsError::InvalidConfig(
                        "Cannot encrypt setting: encryption service not configured".to_string(),
                    ));
                }
            }
        } else {
            value.to_string()
        };

        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, encrypted, updated_at, updated_by)
            VALUES (?, ?, ?, datetime('now'), ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                encrypted = excluded.encrypted,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(&stored_value)
        .bind(if encrypt { 1 } else { 0 })
        .bind(updated_by)
        .execute(&self.db)
        .await?;

        self.invalidate_cache_key(key).await;

        info!(key = %key, encrypted = encrypt, "Setting updated successfully");
        Ok(())
    }

    /// All settings with encrypted values decrypted. Encrypted rows are
    /// skipped with a warning when no encryption key is configured.
    pub async fn get_all_settings(&self) -> Result<HashMap<String, String>, SettingsError> {
        let rows = sqlx::query_as::<_, (String, String, Option<i64>)>(
            "SELECT key, value, encrypted FROM system_settings ORDER BY key",
        )
        .fetch_all(&self.db)
        .await?;

        let mut settings = HashMap::new();
        for (key, stored, encrypted) in rows {
            match self.decode_stored(&key, stored, encrypted)? {
                Some(value) => {
                    settings.insert(key, value);
                }
                None => {
                    warn!(key = %key, "Skipping encrypted setting: encryption service not available");
                }
            }
        }

        Ok(settings)
    }

    pub async fn delete_setting(&self, key: &str) -> Result<(), SettingsError> {
        let result = sqlx::query("DELETE FROM system_settings WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SettingsError::NotFound(key.to_string()));
        }

        self.invalidate_cache_key(key).await;

        info!(key = %key, "Setting deleted");
        Ok(())
    }

    pub fn is_encryption_available(&self) -> bool {
        self.encryption.is_some()
    }

    /// Decrypt a stored value when its row is flagged encrypted. Returns
    /// Ok(None) when decryption is impossible because no key is configured.
    fn decode_stored(
        &self,
        key: &str,
        stored: String,
        encrypted: Option<i64>,
    ) -> Result<Option<String>, SettingsError> {
        if encrypted.unwrap_or(0) != 1 {
            return Ok(Some(stored));
        }

        match &self.encryption {
            Some(service) => {
                let value = service.decrypt(&stored).map_err(|e| {
                    error!(key = %key, error = %e, "Failed to decrypt setting");
                    SettingsError::EncryptionError(e)
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn cached_value(&self, key: &str) -> Option<String> {
        let cache = self.cache.read().await;
        let cached = cache.get(key)?;
        if cached.expires_at > Utc::now() {
            debug!(key = %key, "Setting retrieved from cache");
            Some(cached.value.clone())
        } else {
            None
        }
    }

    async fn cache_value(&self, key: &str, value: &str) {
        let mut cache = self.cache.write().await;
        cache.insert(
            key.to_string(),
            CachedSetting {
                value: value.to_string(),
                expires_at: Utc::now() + self.cache_ttl,
            },
        );
    }

    async fn invalidate_cache_key(&self, key: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(key);
        debug!(key = %key, "Cache entry invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE system_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                encrypted INTEGER DEFAULT 0,
                updated_at TEXT DEFAULT (datetime('now')),
                updated_by TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_set_and_get_plaintext_setting() {
        let pool = setup_test_db().await;
        let service = SettingsService::new(pool);

        service
            .set_setting("ai_calls_per_hour", "20", false, Some("test"))
            .await
            .unwrap();

        let value = service.get_setting("ai_calls_per_hour").await.unwrap();
        assert_eq!(value, Some("20".to_string()));
    }

    #[tokio::test]
    async fn test_missing_setting_returns_none() {
        let pool = setup_test_db().await;
        let service = SettingsService::new(pool);

        let value = service
            .get_setting("definitely_not_configured_anywhere")
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_overwrite_invalidates_cache() {
        let pool = setup_test_db().await;
        let service = SettingsService::new(pool);

        service
            .set_setting("openai_base_url", "https://a.example", false, None)
            .await
            .unwrap();
        // Prime the cache.
        service.get_setting("openai_base_url").await.unwrap();

        service
            .set_setting("openai_base_url", "https://b.example", false, None)
            .await
            .unwrap();

        let value = service.get_setting("openai_base_url").await.unwrap();
        assert_eq!(value, Some("https://b.example".to_string()));
    }

    #[tokio::test]
    async fn test_delete_setting() {
        let pool = setup_test_db().await;
        let service = SettingsService::new(pool);

        service
            .set_setting("sentry_dsn", "https://dsn.example", false, None)
            .await
            .unwrap();
        service.delete_setting("sentry_dsn").await.unwrap();

        let value = service.get_setting("sentry_dsn").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_missing_setting_errors() {
        let pool = setup_test_db().await;
        let service = SettingsService::new(pool);

        let result = service.delete_setting("never_set").await;
        assert!(matches!(result, Err(SettingsError::NotFound(_))));
    }
}
