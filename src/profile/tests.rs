//! Tests for profile module
//!
//! The merge semantics themselves are covered in merger.rs; these tests
//! cover the request validation and row/field conversion around them.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::Validator;

    fn empty_request() -> models::UpdateProfileRequest {
        models::UpdateProfileRequest {
            name: None,
            email: None,
            phone: None,
            position: None,
            skills: None,
            experience: None,
            languages: None,
        }
    }

    #[test]
    fn test_update_requires_at_least_one_field() {
        let result = validators::ProfileValidator.validate(&empty_request());
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "general");
    }

    #[test]
    fn test_update_accepts_single_field() {
        let request = models::UpdateProfileRequest {
            name: Some("Dana Smith".to_string()),
            ..empty_request()
        };
        let result = validators::ProfileValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_update_rejects_malformed_email() {
        let request = models::UpdateProfileRequest {
            email: Some("not-an-email".to_string()),
            ..empty_request()
        };
        let result = validators::ProfileValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "email");
    }

    #[test]
    fn test_update_allows_blank_email() {
        // Blank means "no new data" under the merge policy, not an error
        let request = models::UpdateProfileRequest {
            email: Some("  ".to_string()),
            name: Some("Dana".to_string()),
            ..empty_request()
        };
        let result = validators::ProfileValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_update_rejects_overlong_name() {
        let request = models::UpdateProfileRequest {
            name: Some("x".repeat(300)),
            ..empty_request()
        };
        let result = validators::ProfileValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "name");
    }

    #[test]
    fn test_profile_row_to_fields() {
        let row = models::Profile {
            id: "P_TEST".to_string(),
            user_id: "U_TEST".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            phone: "".to_string(),
            position: "Engineer".to_string(),
            skills: "Rust, SQL".to_string(),
            experience: "5 years".to_string(),
            languages: "English (Fluent)".to_string(),
            created_at: None,
            updated_at: None,
        };

        let fields = row.fields();
        assert_eq!(fields.name, "Dana");
        assert_eq!(fields.phone, "");
        assert_eq!(fields.languages, "English (Fluent)");
    }
}
