pub mod audit;
pub mod handlers;
pub mod upgrade;

use crate::errors::AppError;

/// A mandatory justification (rejection reason, hide reason) must be present
/// and non-blank before the transition runs.
pub fn require_reason<'a>(reason: Option<&'a str>, what: &str) -> Result<&'a str, AppError> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r),
        _ => Err(AppError::MissingReason(format!(
            "A reason is required to {what}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reason_present() {
        assert_eq!(require_reason(Some("spam"), "hide a review").unwrap(), "spam");
    }

    #[test]
    fn test_require_reason_trims() {
        assert_eq!(require_reason(Some("  spam  "), "x").unwrap(), "spam");
    }

    #[test]
    fn test_require_reason_missing() {
        assert!(matches!(
            require_reason(None, "reject a listing"),
            Err(AppError::MissingReason(_))
        ));
    }

    #[test]
    fn test_require_reason_blank() {
        assert!(matches!(
            require_reason(Some("   "), "reject a listing"),
            Err(AppError::MissingReason(_))
        ));
    }
}
