// crates/contact-gate-core/src/submission.rs
// ============================================================================
// Module: Contact Submission Model
// Description: Raw and validated contact form submissions plus pipeline results.
// Purpose: Give every pipeline stage one shared, immutable view of a submission.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A submission enters the pipeline as a [`RawSubmission`] (untyped key/value
//! pairs from a form or a JSON object) and, once validated, becomes an
//! immutable [`ContactSubmission`]. Each invocation ends in exactly one
//! [`PipelineResult`], which maps onto the [`ContactResponse`] wire shape.
//! Security posture: raw submissions are untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Raw Submission
// ============================================================================

/// Untyped submission fields as received from the presentation layer.
///
/// # Invariants
/// - Keys are stored exactly as received; alias resolution happens at lookup.
/// - Later form pairs with the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSubmission {
    /// Field values keyed by wire name.
    fields: Map<String, Value>,
}

impl RawSubmission {
    /// Creates an empty raw submission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a raw submission from decoded form pairs.
    pub fn from_form_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.insert(key.into(), Value::String(value.into()));
        }
        Self {
            fields,
        }
    }

    /// Builds a raw submission from a parsed JSON value.
    ///
    /// Non-object values produce an empty submission so every required field
    /// is reported as missing.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                fields,
            },
            _ => Self::default(),
        }
    }

    /// Sets a single field, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Returns the first present value among the canonical name and aliases.
    #[must_use]
    pub fn lookup(&self, name: &str, aliases: &[&str]) -> Option<&Value> {
        std::iter::once(name).chain(aliases.iter().copied()).find_map(|key| self.fields.get(key))
    }

    /// Returns the number of raw fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no fields were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// SECTION: Validated Submission
// ============================================================================

/// A structurally valid contact submission.
///
/// # Invariants
/// - Produced only by [`crate::validate_submission`].
/// - Immutable once built and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    /// Sender first name (trimmed, non-empty).
    pub first_name: String,
    /// Sender last name (trimmed, non-empty).
    pub last_name: String,
    /// Sender email address (trimmed, grammar-checked).
    pub email: String,
    /// Message subject (trimmed, at least three characters).
    pub subject: String,
    /// Message body (trimmed, at least ten characters).
    pub message: String,
    /// Hidden honeypot value; expected empty for humans.
    pub honeypot: Option<String>,
    /// Form start time in unix epoch milliseconds.
    pub started_at_ms: Option<i64>,
    /// CAPTCHA answer or provider-issued token; empty when absent.
    pub captcha_proof: String,
}

impl ContactSubmission {
    /// Returns the sender display name.
    #[must_use]
    pub fn sender_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// SECTION: Field Errors
// ============================================================================

/// Per-field validation messages keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field; the first message per field wins.
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_insert_with(|| message.to_string());
    }

    /// Returns the message recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns true when a field has an error.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the invalid field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(field, message)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Returns the number of invalid fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// SECTION: Pipeline Result
// ============================================================================

/// Reason a submission was flagged as automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotReason {
    /// The form was completed faster than a human could.
    TooFast,
    /// The message body matched a spam signal.
    SuspiciousContent,
}

impl BotReason {
    /// Returns the stable wire code for the reason.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TooFast => "too_fast",
            Self::SuspiciousContent => "spam",
        }
    }
}

/// Result of a CAPTCHA verification call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptchaVerificationOutcome {
    /// Provider verdict.
    pub verified: bool,
    /// Provider confidence in `[0, 1]`.
    pub confidence: f64,
}

impl CaptchaVerificationOutcome {
    /// Outcome used when verification cannot vouch for the submission.
    pub const REJECTED: Self = Self {
        verified: false,
        confidence: 0.0,
    };

    /// Returns true when the verdict holds at or above `min_score`.
    #[must_use]
    pub fn passes(&self, min_score: f64) -> bool {
        self.verified && self.confidence.is_finite() && self.confidence >= min_score
    }
}

/// Tagged outcome of one pipeline invocation.
///
/// # Invariants
/// - Exactly one variant is produced per invocation.
/// - `Accepted` is also returned for honeypot hits, without dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    /// Submission accepted (or silently dropped as honeypot traffic).
    Accepted,
    /// Structural validation failed.
    RejectedValidation(FieldErrors),
    /// Bot mitigation flagged the submission.
    RejectedBotSuspected(BotReason),
    /// CAPTCHA verification failed or could not be performed.
    RejectedCaptcha,
    /// The email provider did not accept the message.
    DispatchFailed,
}

impl PipelineResult {
    /// Returns the wire error code, or `None` on acceptance.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Accepted => None,
            Self::RejectedValidation(_) => Some("validation"),
            Self::RejectedBotSuspected(reason) => Some(reason.code()),
            Self::RejectedCaptcha => Some("bad_captcha"),
            Self::DispatchFailed => Some("email_failed"),
        }
    }

    /// Converts the result into the external response shape.
    #[must_use]
    pub fn to_response(&self) -> ContactResponse {
        match self {
            Self::Accepted => ContactResponse::ok(),
            Self::RejectedValidation(issues) => ContactResponse {
                ok: false,
                error: Some("validation".to_string()),
                issues: Some(issues.clone()),
            },
            other => ContactResponse {
                ok: false,
                error: other.code().map(str::to_string),
                issues: None,
            },
        }
    }
}

/// External response shape returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    /// True when the submission was accepted.
    pub ok: bool,
    /// Error code when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Field-level messages for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<FieldErrors>,
}

impl ContactResponse {
    /// Returns the success response.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            issues: None,
        }
    }
}
