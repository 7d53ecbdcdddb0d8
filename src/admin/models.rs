// src/admin/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

// ============================================================================
// Dashboard Models
// ============================================================================

#[derive(Serialize, Debug)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_documents: i64,
    pub total_applications: i64,
    pub applications_by_status: HashMap<String, i64>,
    pub pending_invitations: i64,
}

// ============================================================================
// Invitation Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Invitation {
    pub id: String,
    pub code: String,
    pub email: Option<String>,
    pub created_by: String,
    pub expires_at: Option<String>,
    pub redeemed_by: Option<String>,
    pub redeemed_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: Option<String>,
    pub expires_in_days: Option<i64>,
}

// ============================================================================
// Settings Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
    pub encrypt: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSystemSettingsRequest {
    pub settings: HashMap<String, SettingUpdate>,
}
