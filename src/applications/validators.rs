// src/applications/validators.rs

use super::models::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::common::{ValidationResult, Validator};

pub struct ApplicationValidator;

impl Validator<CreateApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &CreateApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_required_text("role", &data.role, 255);
        result.check_required_text("company", &data.company, 255);
        result.check_optional_text("notes", data.notes.as_ref(), 4000);
        result.check_optional_text("link", data.link.as_ref(), 2000);

        result
    }
}

impl Validator<UpdateApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &UpdateApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Check if at least one field is provided
        if data.role.is_none()
            && data.company.is_none()
            && data.applied_at.is_none()
            && data.via.is_none()
            && data.status.is_none()
            && data.notes.is_none()
            && data.link.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        // Role and company may be updated but never blanked out
        result.check_optional_non_blank("role", data.role.as_ref(), 255);
        result.check_optional_non_blank("company", data.company.as_ref(), 255);
        result.check_optional_text("notes", data.notes.as_ref(), 4000);
        result.check_optional_text("link", data.link.as_ref(), 2000);

        result
    }
}
