// crates/contact-gate-core/src/interfaces.rs
// ============================================================================
// Module: Contact Gate Interfaces
// Description: Backend-agnostic interfaces for CAPTCHA, email, and time.
// Purpose: Define the seams the pipeline calls into without naming providers.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! The pipeline depends only on these traits. Provider crates implement them
//! over the network; tests implement them in memory. Implementations must fail
//! closed: any ambiguity is reported as an error, never as success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use thiserror::Error;

use crate::submission::CaptchaVerificationOutcome;
use crate::submission::ContactSubmission;

// ============================================================================
// SECTION: CAPTCHA Verifier
// ============================================================================

/// CAPTCHA verification errors.
///
/// # Invariants
/// - Every variant is treated as a verification failure by the pipeline.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The server-held secret is not configured.
    #[error("captcha secret is not configured")]
    MissingSecret,
    /// The verification endpoint could not be reached or answered non-2xx.
    #[error("captcha transport error: {0}")]
    Transport(String),
    /// The verification response could not be understood.
    #[error("captcha response malformed: {0}")]
    MalformedResponse(String),
    /// The verification response exceeded the size limit.
    #[error("captcha response exceeds size limit")]
    ResponseTooLarge,
}

/// Verifies the CAPTCHA proof carried by a submission.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Verifies a proof string (answer or provider token).
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError`] when verification cannot be completed.
    async fn verify(&self, proof: &str) -> Result<CaptchaVerificationOutcome, CaptchaError>;

    /// Returns the strategy label used in logs.
    fn strategy(&self) -> &'static str;
}

// ============================================================================
// SECTION: Email Dispatcher
// ============================================================================

/// Email dispatch errors.
///
/// # Invariants
/// - Messages may contain provider details; they are logged, never shown to users.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The provider API key is not configured.
    #[error("email api key is not configured")]
    MissingApiKey,
    /// The provider could not be reached.
    #[error("email transport error: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("email provider rejected message with status {status}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
    },
    /// The outbound message could not be encoded.
    #[error("email serialization failed")]
    Serialization,
}

/// Receipt returned by the email provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Provider message identifier when reported.
    pub message_id: Option<String>,
}

/// Sends the notification email for an accepted submission.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Formats and sends the notification for `submission`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the provider does not accept the message.
    async fn dispatch(&self, submission: &ContactSubmission)
    -> Result<DispatchReceipt, DispatchError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of wall-clock time in unix epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current time in unix epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        i64::try_from(millis).unwrap_or(i64::MAX)
    }
}
