use std::collections::HashMap;

use super::error::ServiceError;

/// Collects per-field problems and reports them together.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(field, format!("must be at most {} characters", max));
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    fn add(&mut self, field: &str, message: impl Into<String>) {
        // first problem per field wins
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let mut fields: Vec<_> = self.errors.keys().cloned().collect();
        fields.sort();
        Err(ServiceError::ValidationFailed {
            message: format!("Invalid fields: {}", fields.join(", ")),
            field_errors: std::mem::take(&mut self.errors),
        })
    }
}

pub fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_field() {
        let err = FieldErrors::new()
            .required("name", " ")
            .max_len("title", "abcdef", 3)
            .max_len("path", "ok", 3)
            .finish()
            .unwrap_err();
        match err {
            ServiceError::ValidationFailed { message, field_errors } => {
                assert_eq!(message, "Invalid fields: name, title");
                assert_eq!(field_errors.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn required_wins_over_later_checks() {
        let err = FieldErrors::new().required("name", "").check("name", false, "other").finish().unwrap_err();
        if let ServiceError::ValidationFailed { field_errors, .. } = err {
            assert_eq!(field_errors["name"], "This field is required");
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_email("a@b.io"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.io"));
        assert!(!is_email("a b@c.io"));
    }
}
