// crates/contact-gate-core/src/validation.rs
// ============================================================================
// Module: Submission Validator
// Description: Schema-driven structural validation for contact submissions.
// Purpose: Run identical field rules at the UI and at the trusted boundary.
// Dependencies: email_address, serde, serde_json
// ============================================================================

//! ## Overview
//! The validation schema is plain data ([`CONTACT_SCHEMA`]). The trusted
//! boundary evaluates it through [`validate_submission`], and the same table is
//! serialized for the presentation layer so the optimistic client-side check
//! can never drift from the authoritative one.
//! Invariants:
//! - Validation is pure: the same input always yields the same field errors.
//! - Each invalid field reports exactly one message (the first failing rule).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;

use email_address::EmailAddress;
use serde::Serialize;
use serde_json::Value;

use crate::submission::ContactSubmission;
use crate::submission::FieldErrors;
use crate::submission::RawSubmission;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Canonical first-name field.
pub const FIELD_FIRST_NAME: &str = "firstName";
/// Canonical last-name field.
pub const FIELD_LAST_NAME: &str = "lastName";
/// Canonical email field.
pub const FIELD_EMAIL: &str = "email";
/// Canonical subject field.
pub const FIELD_SUBJECT: &str = "subject";
/// Canonical message field.
pub const FIELD_MESSAGE: &str = "message";
/// Canonical honeypot field (rendered hidden in the form).
pub const FIELD_HONEYPOT: &str = "company";
/// Canonical form start timestamp field.
pub const FIELD_STARTED_AT: &str = "formStartTime";
/// Canonical CAPTCHA proof field.
pub const FIELD_CAPTCHA: &str = "captchaProof";

/// Message for missing required values.
pub const MSG_REQUIRED: &str = "Required";
/// Message for malformed email addresses.
pub const MSG_INVALID_EMAIL: &str = "Invalid email";
/// Message for values below their minimum length.
pub const MSG_TOO_SHORT: &str = "Too short";
/// Message for non-text values in text fields.
pub const MSG_EXPECTED_TEXT: &str = "Expected text";
/// Message for non-numeric timestamps.
pub const MSG_EXPECTED_NUMBER: &str = "Expected number";

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Rule applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldRule {
    /// Non-empty text.
    Required,
    /// Text with at least the given number of characters.
    MinChars(usize),
    /// Text matching the email grammar.
    Email,
    /// Optional free text, trimmed.
    OptionalText,
    /// Optional text kept verbatim; only an empty string counts as absent.
    OptionalRawText,
    /// Optional unix epoch milliseconds.
    OptionalMillis,
}

/// Schema entry for one submission field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Canonical wire name.
    pub field: &'static str,
    /// Accepted alternative wire names.
    pub aliases: &'static [&'static str],
    /// Rule applied to the value.
    pub rule: FieldRule,
    /// Message reported when the rule fails.
    pub message: &'static str,
}

/// Contact form schema shared by the UI and the trusted boundary.
pub const CONTACT_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        field: FIELD_FIRST_NAME,
        aliases: &[],
        rule: FieldRule::Required,
        message: MSG_REQUIRED,
    },
    FieldSpec {
        field: FIELD_LAST_NAME,
        aliases: &[],
        rule: FieldRule::Required,
        message: MSG_REQUIRED,
    },
    FieldSpec {
        field: FIELD_EMAIL,
        aliases: &[],
        rule: FieldRule::Email,
        message: MSG_INVALID_EMAIL,
    },
    FieldSpec {
        field: FIELD_SUBJECT,
        aliases: &[],
        rule: FieldRule::MinChars(3),
        message: MSG_TOO_SHORT,
    },
    FieldSpec {
        field: FIELD_MESSAGE,
        aliases: &[],
        rule: FieldRule::MinChars(10),
        message: MSG_TOO_SHORT,
    },
    FieldSpec {
        field: FIELD_HONEYPOT,
        aliases: &["honeypot"],
        rule: FieldRule::OptionalRawText,
        message: MSG_EXPECTED_TEXT,
    },
    FieldSpec {
        field: FIELD_STARTED_AT,
        aliases: &["submissionStartTimestamp"],
        rule: FieldRule::OptionalMillis,
        message: MSG_EXPECTED_NUMBER,
    },
    FieldSpec {
        field: FIELD_CAPTCHA,
        aliases: &["captchaAnswer", "captchaToken"],
        rule: FieldRule::OptionalText,
        message: MSG_EXPECTED_TEXT,
    },
];

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Value extracted for a field that passed its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Checked {
    /// Trimmed text value.
    Text(String),
    /// Epoch milliseconds.
    Millis(i64),
    /// Optional field not supplied.
    Absent,
}

/// Validates raw input against [`CONTACT_SCHEMA`].
///
/// # Errors
///
/// Returns [`FieldErrors`] naming every invalid field.
pub fn validate_submission(raw: &RawSubmission) -> Result<ContactSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut values: BTreeMap<&'static str, Checked> = BTreeMap::new();
    for spec in CONTACT_SCHEMA {
        match check_field(raw, spec) {
            Ok(value) => {
                values.insert(spec.field, value);
            }
            Err(message) => errors.insert(spec.field, message),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut take_text = |field: &str| match values.remove(field) {
        Some(Checked::Text(value)) => Some(value),
        _ => None,
    };
    let first_name = take_text(FIELD_FIRST_NAME).unwrap_or_default();
    let last_name = take_text(FIELD_LAST_NAME).unwrap_or_default();
    let email = take_text(FIELD_EMAIL).unwrap_or_default();
    let subject = take_text(FIELD_SUBJECT).unwrap_or_default();
    let message = take_text(FIELD_MESSAGE).unwrap_or_default();
    let honeypot = take_text(FIELD_HONEYPOT);
    let captcha_proof = take_text(FIELD_CAPTCHA).unwrap_or_default();
    let started_at_ms = match values.remove(FIELD_STARTED_AT) {
        Some(Checked::Millis(value)) => Some(value),
        _ => None,
    };

    Ok(ContactSubmission {
        first_name,
        last_name,
        email,
        subject,
        message,
        honeypot,
        started_at_ms,
        captcha_proof,
    })
}

/// Applies one schema rule to the raw value.
fn check_field(raw: &RawSubmission, spec: &FieldSpec) -> Result<Checked, &'static str> {
    let value = raw.lookup(spec.field, spec.aliases);
    match spec.rule {
        FieldRule::Required => {
            let text = required_text(value, MSG_REQUIRED)?;
            Ok(Checked::Text(text))
        }
        FieldRule::MinChars(min) => {
            let text = required_text(value, spec.message)?;
            if text.chars().count() < min {
                return Err(spec.message);
            }
            Ok(Checked::Text(text))
        }
        FieldRule::Email => {
            let text = required_text(value, spec.message)?;
            if !is_valid_email(&text) {
                return Err(spec.message);
            }
            Ok(Checked::Text(text))
        }
        FieldRule::OptionalText => match value {
            None | Some(Value::Null) => Ok(Checked::Absent),
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(Checked::Absent)
                } else {
                    Ok(Checked::Text(trimmed.to_string()))
                }
            }
            Some(_) => Err(spec.message),
        },
        FieldRule::OptionalRawText => match value {
            None | Some(Value::Null) => Ok(Checked::Absent),
            Some(Value::String(text)) if text.is_empty() => Ok(Checked::Absent),
            Some(Value::String(text)) => Ok(Checked::Text(text.clone())),
            Some(_) => Err(spec.message),
        },
        FieldRule::OptionalMillis => match value {
            None | Some(Value::Null) => Ok(Checked::Absent),
            Some(Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().and_then(floor_millis))
                .map(Checked::Millis)
                .ok_or(spec.message),
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(Checked::Absent);
                }
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(floor_millis))
                    .map(Checked::Millis)
                    .ok_or(spec.message)
            }
            Some(_) => Err(spec.message),
        },
    }
}

/// Largest magnitude accepted for fractional timestamps (2^53 - 1).
const MAX_EXACT_MILLIS: f64 = 9_007_199_254_740_991.0;

/// Floors a finite fractional timestamp to whole milliseconds.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Value is floored and bounded to the exactly representable integer range."
)]
fn floor_millis(value: f64) -> Option<i64> {
    let floored = value.floor();
    (floored.is_finite() && floored.abs() <= MAX_EXACT_MILLIS).then_some(floored as i64)
}

/// Extracts trimmed text for required fields.
///
/// Missing values report `Required`; present but blank values report `empty_message`.
fn required_text(
    value: Option<&Value>,
    empty_message: &'static str,
) -> Result<String, &'static str> {
    match value {
        None | Some(Value::Null) => Err(MSG_REQUIRED),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(empty_message)
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(MSG_EXPECTED_TEXT),
    }
}

/// Returns true when the address matches the email grammar.
///
/// Display-name forms (`Name <addr>`) are rejected; only bare addresses count.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    if value.contains(['<', '>']) || value.chars().any(char::is_whitespace) {
        return false;
    }
    EmailAddress::from_str(value).is_ok_and(|address| address.domain().contains('.'))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use super::floor_millis;
    use super::is_valid_email;

    #[test]
    fn fractional_millis_are_floored_within_exact_range() {
        assert_eq!(floor_millis(1_700_000_000_000.5), Some(1_700_000_000_000));
        assert_eq!(floor_millis(-0.5), Some(-1));
        assert_eq!(floor_millis(f64::NAN), None);
        assert_eq!(floor_millis(f64::INFINITY), None);
        assert_eq!(floor_millis(1e300), None);
    }

    #[test]
    fn email_grammar_accepts_plain_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn email_grammar_rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ana@localhost"));
        assert!(!is_valid_email("Ana <ana@example.com>"));
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("@example.com"));
    }
}
