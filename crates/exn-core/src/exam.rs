//! # Exam Types and Catalog Tags
//!
//! [`ExamType`] is the exam category a user picks at signup. The catalog tag
//! vocabulary ([`CATALOG_TAGS`]) is what the admin form offers when tagging a
//! document.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Exam category chosen at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExamType {
    /// Probationary officer.
    #[default]
    #[serde(rename = "PO")]
    Po,
    /// Clerical cadre.
    #[serde(rename = "CLERK")]
    Clerk,
    /// Specialist officer.
    #[serde(rename = "SO")]
    So,
    /// RBI Grade B.
    #[serde(rename = "GRADE B")]
    GradeB,
    /// Insurance sector exams.
    #[serde(rename = "INSURANCE")]
    Insurance,
    /// Anything else. Also absorbs labels this build does not know.
    #[serde(rename = "OTHER", other)]
    Other,
}

impl ExamType {
    /// All exam types in display order.
    pub const ALL: [ExamType; 6] = [
        ExamType::Po,
        ExamType::Clerk,
        ExamType::So,
        ExamType::GradeB,
        ExamType::Insurance,
        ExamType::Other,
    ];

    /// The label stored by the service.
    pub fn as_str(self) -> &'static str {
        match self {
            ExamType::Po => "PO",
            ExamType::Clerk => "CLERK",
            ExamType::So => "SO",
            ExamType::GradeB => "GRADE B",
            ExamType::Insurance => "INSURANCE",
            ExamType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExamType {
    type Err = ValidationError;

    /// Case-insensitive; `GRADE_B` and `GRADEB` are accepted for `GRADE B`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "PO" => Ok(ExamType::Po),
            "CLERK" => Ok(ExamType::Clerk),
            "SO" => Ok(ExamType::So),
            "GRADE B" | "GRADEB" => Ok(ExamType::GradeB),
            "INSURANCE" => Ok(ExamType::Insurance),
            "OTHER" => Ok(ExamType::Other),
            _ => Err(ValidationError::UnknownExamType(s.to_string())),
        }
    }
}

/// Tags an admin may attach to a catalog document.
pub const CATALOG_TAGS: [&str; 19] = [
    "practice sets",
    "PYQs",
    "notes",
    "quant",
    "reasoning",
    "english",
    "general awareness",
    "hindi",
    "computer",
    "sbi po",
    "sbi clerk",
    "ibps po",
    "ibps clerk",
    "rrb po",
    "rrb clerk",
    "insurance",
    "RBI grade B",
    "NABARD",
    "others",
];

/// Whether `tag` is in the catalog vocabulary (exact match).
pub fn is_catalog_tag(tag: &str) -> bool {
    CATALOG_TAGS.contains(&tag)
}
