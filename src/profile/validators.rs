// src/profile/validators.rs

use super::models::UpdateProfileRequest;
use crate::common::{ValidationResult, Validator};

pub struct ProfileValidator;

impl Validator<UpdateProfileRequest> for ProfileValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Check if at least one field is provided
        if data.name.is_none()
            && data.email.is_none()
            && data.phone.is_none()
            && data.position.is_none()
            && data.skills.is_none()
            && data.experience.is_none()
            && data.languages.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        result.check_optional_text("name", data.name.as_ref(), 255);

        // Email is free-form elsewhere in the app; only sanity-check shape
        // when a non-empty value is supplied
        if let Some(email) = &data.email {
            let trimmed = email.trim();
            if !trimmed.is_empty() && (!trimmed.contains('@') || trimmed.len() > 320) {
                result.add_error("email", "Email address is not valid");
            }
        }

        result.check_optional_text("phone", data.phone.as_ref(), 64);
        result.check_optional_text("position", data.position.as_ref(), 255);
        result.check_optional_text("skills", data.skills.as_ref(), 4000);
        result.check_optional_text("experience", data.experience.as_ref(), 8000);
        result.check_optional_text("languages", data.languages.as_ref(), 2000);

        result
    }
}
