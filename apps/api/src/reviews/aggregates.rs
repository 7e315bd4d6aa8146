use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

/// Derived rating numbers for a listing, computed from its currently-visible
/// reviews only. This is the single place the aggregation rule lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub visible_review_count: i32,
}

impl RatingSummary {
    /// Mean of the visible overall ratings, rounded half-up to one decimal.
    /// `0.0` / `0` is the sentinel for the empty set.
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return RatingSummary {
                average_rating: 0.0,
                visible_review_count: 0,
            };
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let mean = sum as f64 / ratings.len() as f64;
        RatingSummary {
            average_rating: round_to_tenth(mean),
            visible_review_count: ratings.len() as i32,
        }
    }
}

/// Standard half-up rounding to one decimal place. Every aggregate the
/// system stores or returns goes through this function.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Recomputes and stores a listing's derived rating fields from the set of
/// currently-visible reviews.
///
/// Runs on the caller's open transaction so the flag change and the new
/// aggregate commit together; no reader can observe a stale aggregate after
/// the operation commits. The listing row is locked first so concurrent
/// recomputations for the same listing serialize instead of overwriting each
/// other with stale sums.
pub async fn recompute_listing_rating(
    conn: &mut PgConnection,
    listing_id: Uuid,
) -> Result<RatingSummary, sqlx::Error> {
    sqlx::query("SELECT 1 FROM listings WHERE id = $1 FOR UPDATE")
        .bind(listing_id)
        .execute(&mut *conn)
        .await?;

    let ratings: Vec<i16> =
        sqlx::query_scalar("SELECT rating FROM reviews WHERE listing_id = $1 AND hidden = FALSE")
            .bind(listing_id)
            .fetch_all(&mut *conn)
            .await?;

    let summary = RatingSummary::from_ratings(&ratings);

    sqlx::query(
        r#"
        UPDATE listings
        SET average_rating = $2, visible_review_count = $3, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(listing_id)
    .bind(summary.average_rating)
    .bind(summary.visible_review_count)
    .execute(&mut *conn)
    .await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_sentinel() {
        let s = RatingSummary::from_ratings(&[]);
        assert_eq!(s.average_rating, 0.0);
        assert_eq!(s.visible_review_count, 0);
    }

    #[test]
    fn test_single_review() {
        let s = RatingSummary::from_ratings(&[4]);
        assert_eq!(s.average_rating, 4.0);
        assert_eq!(s.visible_review_count, 1);
    }

    #[test]
    fn test_three_reviews_rounds_down() {
        // 5, 4, 1 -> 10/3 = 3.333... -> 3.3
        let s = RatingSummary::from_ratings(&[5, 4, 1]);
        assert_eq!(s.average_rating, 3.3);
        assert_eq!(s.visible_review_count, 3);
    }

    #[test]
    fn test_half_up_at_midpoint() {
        // 5, 4 -> 4.5 stays 4.5; 4, 3 -> 3.5 stays 3.5
        assert_eq!(RatingSummary::from_ratings(&[5, 4]).average_rating, 4.5);
        assert_eq!(RatingSummary::from_ratings(&[4, 3]).average_rating, 3.5);
    }

    #[test]
    fn test_hide_unhide_round_trip() {
        // Hiding the rating-1 review and unhiding it restores the exact
        // pre-hide aggregate.
        let all = RatingSummary::from_ratings(&[5, 4, 1]);
        let after_hide = RatingSummary::from_ratings(&[5, 4]);
        let after_unhide = RatingSummary::from_ratings(&[5, 4, 1]);

        assert_eq!(all.average_rating, 3.3);
        assert_eq!(after_hide.average_rating, 4.5);
        assert_eq!(after_hide.visible_review_count, 2);
        assert_eq!(after_unhide, all);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(3.333_333), 3.3);
        assert_eq!(round_to_tenth(3.35), 3.4);
        assert_eq!(round_to_tenth(4.449), 4.4);
        assert_eq!(round_to_tenth(0.0), 0.0);
        assert_eq!(round_to_tenth(5.0), 5.0);
    }

    #[test]
    fn test_bounds_hold_for_valid_ratings() {
        let s = RatingSummary::from_ratings(&[1, 1, 1]);
        assert_eq!(s.average_rating, 1.0);
        let s = RatingSummary::from_ratings(&[5, 5, 5, 5]);
        assert_eq!(s.average_rating, 5.0);
    }
}
