//! # Ratings
//!
//! A rating is a whole number of stars from 1 to 5. The per-document
//! aggregate ([`RatingSummary`]) is recomputed from all rating rows after
//! each insert and written back to the document.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A 1–5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Create a rating, validating the range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRating`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::InvalidRating(value))
        }
    }

    /// Number of stars.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i64 {
    fn from(r: RatingValue) -> Self {
        i64::from(r.0)
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate rating fields written back to a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating, 0 when there are none.
    pub average_rating: f64,
    /// Number of ratings.
    pub total_ratings: u32,
}

impl RatingSummary {
    /// Summarize a set of ratings.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = RatingValue>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), r| (sum + u64::from(r.get()), count + 1));
        let average_rating = if count > 0 {
            sum as f64 / f64::from(count)
        } else {
            0.0
        };
        Self {
            average_rating,
            total_ratings: count,
        }
    }
}

/// Whole stars shown for an average: rounded half away from zero, clamped
/// to 0-5.
pub fn display_stars(average: f64) -> u8 {
    if !average.is_finite() {
        return 0;
    }
    average.round().clamp(0.0, f64::from(RatingValue::MAX)) as u8
}
