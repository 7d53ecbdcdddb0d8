// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing; existing data is preserved unless
/// RESET_DB=true is set, in which case the schema is dropped and rebuilt.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    }

    create_user_tables(pool).await?;
    create_document_tables(pool).await?;
    create_application_tables(pool).await?;
    create_mentor_tables(pool).await?;
    create_admin_tables(pool).await?;
    create_system_tables(pool).await?;
    create_indexes(pool).await?;

    // Seed default settings from environment variables
    init_default_settings(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let tables = [
        "mentor_messages",
        "invitations",
        "applications",
        "documents",
        "profiles",
        "users",
        "system_settings",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            avatar TEXT,
            provider TEXT,
            provider_id TEXT,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            position TEXT NOT NULL DEFAULT '',
            skills TEXT NOT NULL DEFAULT '',
            experience TEXT NOT NULL DEFAULT '',
            languages TEXT NOT NULL DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_document_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'cv'
                CHECK (kind IN ('cv', 'cover_letter')),
            mime_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'uploaded'
                CHECK (status IN ('uploaded', 'extracting', 'extracted', 'failed')),
            uploaded_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_application_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            company TEXT NOT NULL,
            applied_at TEXT,
            via TEXT NOT NULL DEFAULT 'Other',
            status TEXT NOT NULL DEFAULT 'No Response',
            notes TEXT,
            link TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_mentor_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mentor_messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_admin_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invitations (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            email TEXT,
            created_by TEXT NOT NULL,
            expires_at TEXT,
            redeemed_by TEXT,
            redeemed_at TEXT,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_system_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            encrypted INTEGER DEFAULT 0,
            updated_at TEXT DEFAULT (datetime('now')),
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_profiles_user_id ON profiles(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_documents_user_id ON documents(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_user_id ON applications(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status)",
        "CREATE INDEX IF NOT EXISTS idx_mentor_messages_user_id ON mentor_messages(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_invitations_code ON invitations(code)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Initialize default system settings from environment variables
/// Only sets values if they don't already exist in the database
async fn init_default_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let settings = vec![
        ("openai_api_key", "OPENAI_API_KEY"),
        ("openai_base_url", "OPENAI_BASE_URL"),
        ("openai_model_extraction", "OPENAI_MODEL_EXTRACTION"),
        ("openai_model_review", "OPENAI_MODEL_REVIEW"),
        ("openai_model_mentor", "OPENAI_MODEL_MENTOR"),
        ("sentry_dsn", "SENTRY_DSN"),
        ("ai_calls_per_hour", "AI_CALLS_PER_HOUR"),
    ];

    for (db_key, env_key) in settings {
        if let Ok(value) = env::var(env_key) {
            if !value.is_empty() {
                let existing: Option<(String,)> =
                    sqlx::query_as("SELECT value FROM system_settings WHERE key = ?")
                        .bind(db_key)
                        .fetch_optional(pool)
                        .await?;

                if existing.is_none() {
                    sqlx::query(
                        r#"
                        INSERT INTO system_settings (key, value, encrypted, updated_at, updated_by)
                        VALUES (?, ?, 0, datetime('now'), 'system')
                        "#,
                    )
                    .bind(db_key)
                    .bind(&value)
                    .execute(pool)
                    .await?;

                    info!(key = %db_key, "Seeded setting from environment");
                }
            }
        }
    }

    Ok(())
}
