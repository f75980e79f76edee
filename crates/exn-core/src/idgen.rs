//! # User Identifier Generation
//!
//! New accounts get a random 9-digit [`UserId`]. Uniqueness is checked by
//! looking the candidate up in the `users` table; the loop tries at most
//! [`MAX_ID_ATTEMPTS`] candidates.
//!
//! A lookup that fails (rather than answering "taken" or "free") counts as a
//! spent attempt. The check is advisory: another signup can claim the same id
//! between the lookup and the insert.

use std::future::Future;

use rand_core::RngCore;

use crate::error::IdGenerationError;
use crate::identity::{UserId, USER_ID_MIN};

/// Maximum number of candidates tried before giving up.
pub const MAX_ID_ATTEMPTS: u32 = 10;

const SPAN: u32 = 900_000_000;
// Largest multiple of SPAN that fits in u32; draws at or above it are
// rejected so every id is equally likely.
const ACCEPT_BELOW: u32 = u32::MAX - (u32::MAX % SPAN);

/// Draw a uniformly distributed 9-digit user id.
pub fn random_user_id<R: RngCore + ?Sized>(rng: &mut R) -> UserId {
    loop {
        let draw = rng.next_u32();
        if draw < ACCEPT_BELOW {
            // USER_ID_MIN + (draw % SPAN) is always within the 9-digit range.
            if let Ok(id) = UserId::new(u64::from(USER_ID_MIN + draw % SPAN)) {
                return id;
            }
        }
    }
}

/// Generate an id that `is_taken` reports as free.
///
/// `is_taken` resolves to `Ok(true)` when the id already exists, `Ok(false)`
/// when it is free, and `Err` when the lookup itself failed.
///
/// # Errors
///
/// Returns [`IdGenerationError::Exhausted`] after [`MAX_ID_ATTEMPTS`]
/// candidates without a confirmed free id.
pub async fn generate_unique_user_id<R, F, Fut, E>(
    rng: &mut R,
    mut is_taken: F,
) -> Result<UserId, IdGenerationError>
where
    R: RngCore + ?Sized,
    F: FnMut(UserId) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::fmt::Display,
{
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = random_user_id(rng);
        match is_taken(candidate).await {
            Ok(false) => {
                tracing::debug!(user_id = %candidate, attempt, "generated unique user id");
                return Ok(candidate);
            }
            Ok(true) => {
                tracing::warn!(user_id = %candidate, attempt, "user id exists, trying again");
            }
            Err(e) => {
                tracing::warn!(user_id = %candidate, attempt, "user id lookup failed: {e}");
            }
        }
    }
    Err(IdGenerationError::Exhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}
