// src/applications/tests/validators_tests.rs

#[cfg(test)]
mod tests {
    use crate::applications::models::*;
    use crate::applications::validators::*;
    use crate::common::Validator;

    fn empty_update() -> UpdateApplicationRequest {
        UpdateApplicationRequest {
            role: None,
            company: None,
            applied_at: None,
            via: None,
            status: None,
            notes: None,
            link: None,
        }
    }

    #[test]
    fn test_application_validator_valid_data() {
        let validator = ApplicationValidator;
        let request = CreateApplicationRequest {
            role: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            applied_at: Some("2024-03-01".to_string()),
            via: Some("LinkedIn".to_string()),
            status: Some("Open".to_string()),
            notes: None,
            link: Some("https://example.com/posting".to_string()),
        };

        let result = validator.validate(&request);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_application_validator_requires_role() {
        let validator = ApplicationValidator;
        let request = CreateApplicationRequest {
            role: "   ".to_string(),
            company: "Acme".to_string(),
            applied_at: None,
            via: None,
            status: None,
            notes: None,
            link: None,
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "role");
    }

    #[test]
    fn test_application_validator_requires_company() {
        let validator = ApplicationValidator;
        let request = CreateApplicationRequest {
            role: "Backend Engineer".to_string(),
            company: "".to_string(),
            applied_at: None,
            via: None,
            status: None,
            notes: None,
            link: None,
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "company");
    }

    #[test]
    fn test_update_validator_requires_some_field() {
        let validator = ApplicationValidator;
        let result = validator.validate(&empty_update());
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "general");
    }

    #[test]
    fn test_update_validator_rejects_blank_role() {
        let validator = ApplicationValidator;
        let request = UpdateApplicationRequest {
            role: Some("".to_string()),
            ..empty_update()
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "role");
    }

    #[test]
    fn test_update_validator_accepts_status_only() {
        let validator = ApplicationValidator;
        let request = UpdateApplicationRequest {
            status: Some("Offer".to_string()),
            ..empty_update()
        };

        let result = validator.validate(&request);
        assert!(result.is_valid);
    }
}
