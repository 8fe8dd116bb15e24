//! Local form validation, run before any store call

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{0} is required")]
    #[diagnostic(code(sawtrack::validation::required))]
    Required(&'static str),

    #[error("invalid {field}: {message}")]
    #[diagnostic(code(sawtrack::validation::invalid))]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Trim a required text field, failing when nothing is left
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Unwrap a required selection
pub fn selected<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Required(field))
}

/// Trim an optional text field; blank becomes `None`
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("code", "  SN-1 ").unwrap(), "SN-1");
        assert_eq!(required("code", "   "), Err(ValidationError::Required("code")));
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" ok ")).as_deref(), Some("ok"));
        assert_eq!(optional(None), None);
    }
}
