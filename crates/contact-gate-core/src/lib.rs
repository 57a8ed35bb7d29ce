// crates/contact-gate-core/src/lib.rs
// ============================================================================
// Module: Contact Gate Core
// Description: Contact submission model, validation, bot checks, and pipeline.
// Purpose: Provide the network-free heart of the contact form backend.
// Dependencies: async-trait, email_address, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! `contact-gate-core` turns an untrusted contact form submission into exactly
//! one [`PipelineResult`]. It owns the validation schema, the bot-mitigation
//! heuristics, and the orchestration order; CAPTCHA verification and email
//! delivery are reached only through the [`CaptchaVerifier`] and
//! [`EmailDispatcher`] traits.
//! Invariants:
//! - Dispatch requires validation, bot mitigation, and CAPTCHA to pass, in order.
//! - Verification failures of any kind fail closed.
//!
//! Security posture: submissions are untrusted; provider errors never reach
//! the submitter.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod bot;
pub mod interfaces;
pub mod pipeline;
pub mod poll;
pub mod submission;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::PipelineStage;
pub use audit::SecurityAuditEvent;
pub use audit::StderrAuditSink;
pub use audit::SubmissionAuditEvent;
pub use bot::BotPolicy;
pub use bot::BotVerdict;
pub use interfaces::CaptchaError;
pub use interfaces::CaptchaVerifier;
pub use interfaces::Clock;
pub use interfaces::DispatchError;
pub use interfaces::DispatchReceipt;
pub use interfaces::EmailDispatcher;
pub use interfaces::SystemClock;
pub use pipeline::PipelineConfig;
pub use pipeline::SubmissionPipeline;
pub use poll::BoundedPoll;
pub use submission::BotReason;
pub use submission::CaptchaVerificationOutcome;
pub use submission::ContactResponse;
pub use submission::ContactSubmission;
pub use submission::FieldErrors;
pub use submission::PipelineResult;
pub use submission::RawSubmission;
pub use validation::CONTACT_SCHEMA;
pub use validation::FieldRule;
pub use validation::FieldSpec;
pub use validation::validate_submission;
