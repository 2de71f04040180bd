use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::{ApiError, FieldErrors};

/// Loose RFC 5322 style address check
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap_or_else(|e| panic!("invalid email pattern: {}", e))
});

/// Collects per-field validation failures; only the first message per field is kept
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when nothing failed, otherwise a 422 carrying every field error
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed(self.errors))
        }
    }
}

pub fn matches_email(value: &str) -> bool {
    EMAIL_RX.is_match(value)
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_error_per_field() {
        let mut v = Validator::new();
        v.check(false, "email", "must be provided");
        v.check(false, "email", "must be a valid email address");
        assert_eq!(v.errors().get("email").map(String::as_str), Some("must be provided"));
        assert!(!v.valid());
    }

    #[test]
    fn finish_reports_validation_failure() {
        let mut v = Validator::new();
        v.check(true, "name", "must be provided");
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        assert!(matches!(v.finish(), Err(ApiError::ValidationFailed(fields)) if fields.len() == 1));
    }

    #[test]
    fn email_pattern() {
        assert!(matches_email("alice@example.com"));
        assert!(matches_email("bob.smith+tag@mail.example.org"));
        assert!(!matches_email("alice"));
        assert!(!matches_email("alice@"));
        assert!(!matches_email("@example.com"));
    }

    #[test]
    fn unique_values() {
        assert!(unique(&["drama", "comedy"]));
        assert!(!unique(&["drama", "drama"]));
    }
}
