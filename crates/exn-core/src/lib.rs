#![deny(missing_docs)]

//! # exn-core: Foundational Types for the ExamNation portal
//!
//! This crate defines the types and pure logic that every other crate in the
//! workspace builds on. It performs no I/O: the HTTP client lives in
//! `exn-client`, local state and presentation in `exn-cli`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`UserId`] (the portal's
//!    locally generated 9-digit number) cannot be passed where a
//!    [`DocumentId`] is expected.
//!
//! 2. **Validation returns every failing field.** [`validate_form`] reports
//!    one message per field for the requested [`FormMode`], so a caller can
//!    render all problems at once.
//!
//! 3. **Read-then-write invariants are not atomic.** "A user rates a document
//!    at most once" is checked by the data-access layer with a lookup before
//!    the insert. Two concurrent requests from the same user can both pass.
//!
//! 4. **[`ExnError`] hierarchy.** Structured errors with `thiserror`. Outside
//!    tests the only `expect` compiles a literal regex.

pub mod account;
pub mod admin;
pub mod document;
pub mod error;
pub mod exam;
pub mod filter;
pub mod identity;
pub mod idgen;
pub mod notice;
pub mod rating;
pub mod sample;
pub mod validation;

// Re-export primary types at crate root for ergonomic imports.
pub use account::{SignupMetadata, UserProfile};
pub use admin::{AdminCredentials, AdminSession, ADMIN_SESSION_TTL_MS, ADMIN_TOKEN};
pub use document::{detail_path, slugify, title_from_slug, Document, DocumentDraft};
pub use error::{ExnError, IdGenerationError, ValidationError};
pub use exam::{is_catalog_tag, ExamType, CATALOG_TAGS};
pub use filter::{distinct_tags, TagFilter};
pub use identity::{AuthUserId, DocumentId, UserId};
pub use idgen::{generate_unique_user_id, random_user_id, MAX_ID_ATTEMPTS};
pub use notice::{AuthOperation, Notice, NoticeKind};
pub use rating::{display_stars, RatingSummary, RatingValue};
pub use sample::sample_catalog;
pub use validation::{validate_form, AccountForm, FieldErrors, FormField, FormMode};
