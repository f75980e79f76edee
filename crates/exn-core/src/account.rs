//! # Account Records
//!
//! [`UserProfile`] is a row of the `users` table. [`SignupMetadata`] is the
//! payload attached to an auth-service signup; the service copies it into the
//! profile row on its side.

use serde::{Deserialize, Serialize};

use crate::exam::ExamType;
use crate::identity::UserId;

/// Profile row stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Portal user number.
    pub user_id: UserId,
    /// Display name.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// 10-digit mobile number.
    #[serde(default)]
    pub mobile: String,
    /// Exam category chosen at signup.
    #[serde(default)]
    pub exam_type: ExamType,
}

/// User metadata sent with a signup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupMetadata {
    /// Portal user number, as a decimal string.
    #[serde(with = "user_id_string")]
    pub user_id: UserId,
    /// Display name.
    pub full_name: String,
    /// 10-digit mobile number.
    pub mobile: String,
    /// Exam category.
    pub exam_type: ExamType,
}

mod user_id_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::identity::UserId;

    pub fn serialize<S: Serializer>(id: &UserId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<UserId, D::Error> {
        // Older accounts stored the number unquoted.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }
        match Raw::deserialize(d)? {
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
            Raw::Number(n) => UserId::new(n).map_err(de::Error::custom),
        }
    }
}
