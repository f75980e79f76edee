//! # Error Hierarchy
//!
//! Structured error types for the portal, built with `thiserror`.
//!
//! Each variant carries the offending input so that a caller can show the
//! user what was rejected without re-deriving it.

use thiserror::Error;

/// Top-level error type for portal domain logic.
#[derive(Error, Debug)]
pub enum ExnError {
    /// Domain primitive or form validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The unique identifier loop gave up.
    #[error("identifier generation error: {0}")]
    IdGeneration(#[from] IdGenerationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain newtypes and catalog drafts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// User identifiers are 9-digit numbers.
    #[error("invalid user id: {0} (expected a 9-digit number)")]
    InvalidUserId(u64),

    /// Rating values are whole stars from 1 to 5.
    #[error("invalid rating: {0} (expected 1-5)")]
    InvalidRating(i64),

    /// Unknown exam type label.
    #[error("unknown exam type: \"{0}\"")]
    UnknownExamType(String),

    /// A required document field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Document size must be a positive, finite number of megabytes.
    #[error("invalid size: {0} MB (expected a positive number)")]
    InvalidSize(f64),

    /// Tag is not part of the catalog vocabulary.
    #[error("unknown tag: \"{0}\"")]
    UnknownTag(String),
}

/// Failure to obtain a user identifier that is not already taken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdGenerationError {
    /// Every attempt either collided or could not be confirmed unique.
    #[error("could not generate unique user ID after {attempts} attempts")]
    Exhausted {
        /// Number of candidates tried.
        attempts: u32,
    },
}
