// Common validation types and traits

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Required text field: must be non-blank and within the length cap.
    pub fn check_required_text(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.add_error(field, &format!("{} is required", title_case(field)));
        } else if value.len() > max_len {
            self.add_length_error(field, max_len);
        }
    }

    /// Optional text field: length cap applies only when a value is given.
    pub fn check_optional_text(&mut self, field: &str, value: Option<&String>, max_len: usize) {
        if let Some(v) = value {
            if v.len() > max_len {
                self.add_length_error(field, max_len);
            }
        }
    }

    /// Optional text field that may not be blanked out by an update.
    pub fn check_optional_non_blank(&mut self, field: &str, value: Option<&String>, max_len: usize) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.add_error(field, &format!("{} cannot be empty", title_case(field)));
            } else if v.len() > max_len {
                self.add_length_error(field, max_len);
            }
        }
    }

    fn add_length_error(&mut self, field: &str, max_len: usize) {
        self.add_error(
            field,
            &format!(
                "{} must be less than {} characters",
                title_case(field),
                max_len
            ),
        );
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

fn title_case(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_rejects_blank() {
        let mut result = ValidationResult::new();
        result.check_required_text("role", "   ", 255);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].message, "Role is required");
    }

    #[test]
    fn test_optional_text_allows_absence() {
        let mut result = ValidationResult::new();
        result.check_optional_text("notes", None, 10);
        assert!(result.is_valid);
    }

    #[test]
    fn test_length_cap_applies() {
        let mut result = ValidationResult::new();
        let long = "x".repeat(11);
        result.check_optional_text("notes", Some(&long), 10);
        assert!(!result.is_valid);
        assert_eq!(
            result.errors[0].message,
            "Notes must be less than 10 characters"
        );
    }

    #[test]
    fn test_optional_non_blank_rejects_blanking() {
        let mut result = ValidationResult::new();
        result.check_optional_non_blank("company", Some(&"  ".to_string()), 255);
        assert!(!result.is_valid);
    }
}
