use serde_json::Value;

use crate::errors::AppError;

/// Maximum length of review content, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Validates a new review before any storage work happens.
///
/// Overall rating is an integer 1-5; each sub-rating (if present) is an
/// integer 1-5 keyed by aspect name; content is bounded and non-empty.
pub fn validate_new_review(
    rating: i16,
    sub_ratings: Option<&Value>,
    content: &str,
) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Review content must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "Review content must be at most {MAX_CONTENT_CHARS} characters"
        )));
    }

    if let Some(subs) = sub_ratings {
        let map = subs.as_object().ok_or_else(|| {
            AppError::Validation("Sub-ratings must be an object of aspect: rating".to_string())
        })?;
        for (aspect, value) in map {
            match value.as_i64() {
                Some(v) if (1..=5).contains(&v) => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "Sub-rating '{aspect}' must be an integer between 1 and 5"
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_minimal_review() {
        assert!(validate_new_review(5, None, "Great pitch, clean facilities").is_ok());
    }

    #[test]
    fn test_valid_with_sub_ratings() {
        let subs = json!({ "cleanliness": 4, "location": 5 });
        assert!(validate_new_review(4, Some(&subs), "Lovely spot").is_ok());
    }

    #[test]
    fn test_rating_out_of_bounds() {
        assert!(validate_new_review(0, None, "x").is_err());
        assert!(validate_new_review(6, None, "x").is_err());
        assert!(validate_new_review(-1, None, "x").is_err());
    }

    #[test]
    fn test_empty_content() {
        assert!(matches!(
            validate_new_review(3, None, "   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_content_too_long() {
        let long = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert!(validate_new_review(3, None, &long).is_err());
        let at_limit = "a".repeat(MAX_CONTENT_CHARS);
        assert!(validate_new_review(3, None, &at_limit).is_ok());
    }

    #[test]
    fn test_sub_rating_out_of_bounds() {
        let subs = json!({ "cleanliness": 6 });
        assert!(validate_new_review(4, Some(&subs), "x").is_err());
        let subs = json!({ "cleanliness": 0 });
        assert!(validate_new_review(4, Some(&subs), "x").is_err());
    }

    #[test]
    fn test_sub_rating_wrong_shape() {
        let subs = json!([4, 5]);
        assert!(validate_new_review(4, Some(&subs), "x").is_err());
        let subs = json!({ "cleanliness": "four" });
        assert!(validate_new_review(4, Some(&subs), "x").is_err());
        let subs = json!({ "cleanliness": 4.5 });
        assert!(validate_new_review(4, Some(&subs), "x").is_err());
    }
}
