// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::dev_mode::DevModeConfig;
use crate::services::{OpenAIService, RateLimitService, SettingsService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub documents_dir: PathBuf,
    pub http: Client,
    pub jwt_secret: String,
    pub google_client_id: Option<String>,
    pub admin_emails: HashSet<String>,
    pub invite_only: bool,
    pub dev_mode: DevModeConfig,
    pub settings_service: Arc<SettingsService>,
    pub openai_service: Arc<OpenAIService>,
    pub rate_limit_service: Arc<RateLimitService>,
}
