// crates/contact-gate-core/src/audit.rs
// ============================================================================
// Module: Contact Gate Audit Logging
// Description: Structured audit events for contact submissions.
// Purpose: Emit redacted JSON-line logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every pipeline invocation records exactly one [`SubmissionAuditEvent`].
//! Events carry stage and outcome labels plus an internal detail string
//! (provider errors, matched spam signal). Submitter email addresses and
//! message bodies are never recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pipeline stage that produced the final outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Structural validation.
    Validate,
    /// Bot mitigation.
    BotCheck,
    /// CAPTCHA verification.
    Captcha,
    /// Email dispatch.
    Dispatch,
    /// Overall pipeline deadline.
    Deadline,
}

/// Submission audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Stage that decided the outcome.
    pub stage: PipelineStage,
    /// Outcome code (`accepted`, `honeypot`, or the wire error code).
    pub outcome: &'static str,
    /// CAPTCHA strategy label when the stage was reached.
    pub captcha_strategy: Option<&'static str>,
    /// Invalid field names for validation failures.
    pub invalid_fields: Vec<String>,
    /// Internal detail; never returned to the submitter.
    pub detail: Option<String>,
}

/// Inputs required to construct a submission audit event.
pub struct SubmissionAuditEventParams {
    /// Stage that decided the outcome.
    pub stage: PipelineStage,
    /// Outcome code.
    pub outcome: &'static str,
    /// CAPTCHA strategy label when the stage was reached.
    pub captcha_strategy: Option<&'static str>,
    /// Invalid field names for validation failures.
    pub invalid_fields: Vec<String>,
    /// Internal detail.
    pub detail: Option<String>,
}

impl SubmissionAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: SubmissionAuditEventParams) -> Self {
        Self {
            event: "contact_submission",
            timestamp_ms: now_ms(),
            stage: params.stage,
            outcome: params.outcome,
            captcha_strategy: params.captcha_strategy,
            invalid_fields: params.invalid_fields,
            detail: params.detail,
        }
    }
}

/// Security posture audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Security event kind.
    pub kind: String,
    /// Optional message.
    pub message: Option<String>,
}

impl SecurityAuditEvent {
    /// Creates a new security audit event with a consistent timestamp.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: Option<String>) -> Self {
        Self {
            event: "security_audit",
            timestamp_ms: now_ms(),
            kind: kind.into(),
            message,
        }
    }
}

/// Returns the current time in epoch milliseconds.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for contact submission events.
pub trait AuditSink: Send + Sync {
    /// Record a submission audit event.
    fn record(&self, event: &SubmissionAuditEvent);

    /// Record a security posture audit event.
    fn record_security(&self, _event: &SecurityAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &SubmissionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_security(&self, event: &SecurityAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized payload line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &SubmissionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_security(&self, event: &SecurityAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &SubmissionAuditEvent) {}
}
