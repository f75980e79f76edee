//! # Account Form Validation
//!
//! One [`AccountForm`] backs every account screen. Which fields are checked
//! depends on the [`FormMode`]:
//!
//! | Field | login | signup | forgot | reset |
//! |-------|:-----:|:------:|:------:|:-----:|
//! | full name | | ✓ | | |
//! | email | ✓ | ✓ | ✓ | |
//! | mobile | | ✓ | | |
//! | exam type | | ✓ | | |
//! | password | ✓ | ✓ | | ✓ |
//! | confirm password | | ✓ | | ✓ |
//! | accept terms | | ✓ | | |
//!
//! Rules run in a fixed order and a later failing rule replaces an earlier
//! message for the same field: a blank email reports "Email is invalid".

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::exam::ExamType;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

const EMAIL_PATTERN: &str = r"\S+@\S+\.\S+";

// Literal pattern, compiled once; checked by `email_pattern_compiles`.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

/// Which account screen is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormMode {
    /// Email + password sign-in.
    Login,
    /// New account registration.
    Signup,
    /// Password reset request.
    Forgot,
    /// Setting a new password from a reset link.
    Reset,
}

/// A form field that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    /// Full name.
    FullName,
    /// Email address.
    Email,
    /// Mobile number.
    Mobile,
    /// Exam category.
    ExamType,
    /// Password.
    Password,
    /// Password confirmation.
    ConfirmPassword,
    /// Terms and conditions consent.
    AcceptTerms,
}

impl FormField {
    /// Field name as used in the form.
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::FullName => "fullName",
            FormField::Email => "email",
            FormField::Mobile => "mobile",
            FormField::ExamType => "examType",
            FormField::Password => "password",
            FormField::ConfirmPassword => "confirmPassword",
            FormField::AcceptTerms => "agreeToTerms",
        }
    }
}

/// Values entered on an account screen.
#[derive(Debug, Clone, Default)]
pub struct AccountForm {
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Mobile number.
    pub mobile: String,
    /// Selected exam category, if any.
    pub exam_type: Option<ExamType>,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
    /// Whether the terms and conditions box is ticked.
    pub accept_terms: bool,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, &'static str>);

impl FieldErrors {
    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: FormField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    /// Iterate failing fields in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &'static str)> + '_ {
        self.0.iter().map(|(f, m)| (*f, *m))
    }

    fn reject(&mut self, field: FormField, message: &'static str) {
        self.0.insert(field, message);
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Whether `email` looks like `something@something.something`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether `mobile` is exactly ten ASCII digits.
pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == 10 && mobile.bytes().all(|b| b.is_ascii_digit())
}

/// Validate `form` for `mode`.
///
/// # Errors
///
/// Returns every failing field with its message.
pub fn validate_form(form: &AccountForm, mode: FormMode) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if mode == FormMode::Signup {
        if form.full_name.trim().is_empty() {
            errors.reject(FormField::FullName, "Full name is required");
        }
        if form.mobile.trim().is_empty() {
            errors.reject(FormField::Mobile, "Mobile number is required");
        }
        if !is_valid_mobile(&form.mobile) {
            errors.reject(FormField::Mobile, "Mobile number must be 10 digits");
        }
        if form.exam_type.is_none() {
            errors.reject(FormField::ExamType, "Please select exam type");
        }
        if !form.accept_terms {
            errors.reject(FormField::AcceptTerms, "Please accept terms and conditions");
        }
    }

    if matches!(mode, FormMode::Signup | FormMode::Reset) && form.password != form.confirm_password
    {
        errors.reject(FormField::ConfirmPassword, "Passwords do not match");
    }

    if matches!(mode, FormMode::Signup | FormMode::Login | FormMode::Forgot) {
        if form.email.trim().is_empty() {
            errors.reject(FormField::Email, "Email is required");
        }
        if !is_valid_email(&form.email) {
            errors.reject(FormField::Email, "Email is invalid");
        }
    }

    if matches!(mode, FormMode::Signup | FormMode::Login | FormMode::Reset) {
        if form.password.is_empty() {
            errors.reject(FormField::Password, "Password is required");
        }
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            errors.reject(FormField::Password, "Password must be at least 6 characters");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
