//! # Identifier Newtypes
//!
//! - [`UserId`]: the portal's own 9-digit user number, generated locally and
//!   stored in the `users` table and in the auth service's user metadata.
//! - [`AuthUserId`]: the UUID the auth service assigns to an account.
//! - [`DocumentId`]: primary key of a row in the `pdfs` table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Smallest valid [`UserId`].
pub const USER_ID_MIN: u32 = 100_000_000;

/// Largest valid [`UserId`].
pub const USER_ID_MAX: u32 = 999_999_999;

/// A portal user number: always exactly nine decimal digits.
///
/// Serialized as a JSON integer (the `users.user_id` column). The auth
/// service metadata carries it as a string; see
/// [`SignupMetadata`](crate::account::SignupMetadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UserId(u32);

impl UserId {
    /// Create a user identifier, validating the 9-digit range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUserId`] outside
    /// `100000000..=999999999`.
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if (u64::from(USER_ID_MIN)..=u64::from(USER_ID_MAX)).contains(&value) {
            Ok(Self(value as u32))
        } else {
            Err(ValidationError::InvalidUserId(value))
        }
    }

    /// The numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u64> for UserId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        u64::from(id.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 9 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidUserId(trimmed.parse().unwrap_or(0)));
        }
        // Nine ASCII digits always fit in u64.
        Self::new(trimmed.parse().unwrap_or(0))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned by the external auth service to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUserId(Uuid);

impl AuthUserId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for AuthUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of a catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Wrap a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw row id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
