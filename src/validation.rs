use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+(?:['-]\p{L}+)*(?:\s+\p{L}+(?:['-]\p{L}+)*)+$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]{2,}$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9 ()/-]+$").unwrap());

pub const MIN_PASSWORD_LEN: usize = 8;
const MIN_PHONE_DIGITS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,
    #[error("Please enter first and last name.")]
    Name,
    #[error("Please enter a valid email address.")]
    Email,
    #[error("Please enter a valid phone number.")]
    Phone,
    #[error("Use at least 8 characters, one uppercase letter and one digit.")]
    WeakPassword,
    #[error("Your passwords don't match. Please try again.")]
    PasswordMismatch,
    #[error("Use the format YYYY-MM-DD.")]
    DateFormat,
    #[error("The due date can't be in the past.")]
    PastDate,
    #[error("Please accept the privacy policy.")]
    PrivacyPolicy,
}

pub fn validate_name(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required);
    }
    if !NAME_RE.is_match(input) {
        return Err(ValidationError::Name);
    }
    Ok(())
}

pub fn validate_email(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required);
    }
    if !EMAIL_RE.is_match(input) {
        return Err(ValidationError::Email);
    }
    Ok(())
}

pub fn validate_phone(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required);
    }
    let digits = input.chars().filter(char::is_ascii_digit).count();
    if !PHONE_RE.is_match(input) || digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::Phone);
    }
    Ok(())
}

pub fn validate_password(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Required);
    }
    let long_enough = input.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = input.chars().any(char::is_uppercase);
    let has_digit = input.chars().any(|c| c.is_ascii_digit());
    if !(long_enough && has_upper && has_digit) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if confirmation.is_empty() {
        return Err(ValidationError::Required);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_required(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        Err(ValidationError::Required)
    } else {
        Ok(())
    }
}

/// Parses a due date; past dates are rejected unless `allow_past` is set,
/// which editing needs for tasks that are already overdue.
pub fn validate_due_date(
    input: &str,
    today: NaiveDate,
    allow_past: bool,
) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required);
    }
    let date =
        NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| ValidationError::DateFormat)?;
    if !allow_past && date < today {
        return Err(ValidationError::PastDate);
    }
    Ok(date)
}
