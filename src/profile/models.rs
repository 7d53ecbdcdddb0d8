// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::merger::ProfileFields;

// ============================================================================
// Profile Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub skills: String,
    pub experience: String,
    pub languages: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Profile {
    /// The mergeable slice of the profile row.
    pub fn fields(&self) -> ProfileFields {
        ProfileFields {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            position: self.position.clone(),
            skills: self.skills.clone(),
            experience: self.experience.clone(),
            languages: self.languages.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub languages: Option<String>,
}
