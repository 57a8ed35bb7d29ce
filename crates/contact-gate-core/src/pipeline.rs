// crates/contact-gate-core/src/pipeline.rs
// ============================================================================
// Module: Submission Pipeline
// Description: Orchestrates validation, bot checks, CAPTCHA, and dispatch.
// Purpose: Turn one raw submission into exactly one tagged result.
// Dependencies: crate::{audit, bot, interfaces, submission, validation}
// ============================================================================

//! ## Overview
//! The pipeline is a linear state machine with early exits:
//! validate, bot check, CAPTCHA verification, then dispatch. It holds no
//! per-submission state, never retries, and never lets a provider error
//! escape; every failure becomes a [`PipelineResult`] variant.
//! Invariants:
//! - Dispatch happens if and only if validation, bot mitigation, and CAPTCHA
//!   verification all passed, in that order.
//! - Honeypot hits return `Accepted` without calling CAPTCHA or dispatch.
//! - Exactly one audit event is recorded per invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::audit::AuditSink;
use crate::audit::PipelineStage;
use crate::audit::SubmissionAuditEvent;
use crate::audit::SubmissionAuditEventParams;
use crate::bot::BotPolicy;
use crate::bot::BotVerdict;
use crate::bot::evaluate;
use crate::interfaces::CaptchaVerifier;
use crate::interfaces::Clock;
use crate::interfaces::EmailDispatcher;
use crate::submission::PipelineResult;
use crate::submission::RawSubmission;
use crate::validation::validate_submission;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default minimum CAPTCHA confidence.
pub const DEFAULT_MIN_CAPTCHA_SCORE: f64 = 0.5;

/// Pipeline policy configuration.
///
/// # Invariants
/// - `min_captcha_score` lies in `[0, 1]` (enforced by config validation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bot-mitigation policy.
    pub bot: BotPolicy,
    /// Minimum CAPTCHA confidence required for acceptance.
    pub min_captcha_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bot: BotPolicy::default(),
            min_captcha_score: DEFAULT_MIN_CAPTCHA_SCORE,
        }
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Contact submission pipeline.
///
/// # Invariants
/// - Collaborators are shared read-only; no mutable state crosses invocations.
#[derive(Clone)]
pub struct SubmissionPipeline {
    /// CAPTCHA verification strategy.
    verifier: Arc<dyn CaptchaVerifier>,
    /// Outbound email dispatcher.
    dispatcher: Arc<dyn EmailDispatcher>,
    /// Wall-clock source for timing checks.
    clock: Arc<dyn Clock>,
    /// Audit sink receiving one event per invocation.
    audit: Arc<dyn AuditSink>,
    /// Policy configuration.
    config: PipelineConfig,
}

impl SubmissionPipeline {
    /// Creates a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn CaptchaVerifier>,
        dispatcher: Arc<dyn EmailDispatcher>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            verifier,
            dispatcher,
            clock,
            audit,
            config,
        }
    }

    /// Returns the pipeline policy.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the audit sink shared with the pipeline.
    #[must_use]
    pub fn audit(&self) -> Arc<dyn AuditSink> {
        Arc::clone(&self.audit)
    }

    /// Processes one submission end to end.
    pub async fn submit(&self, raw: &RawSubmission) -> PipelineResult {
        let submission = match validate_submission(raw) {
            Ok(submission) => submission,
            Err(issues) => {
                self.record(SubmissionAuditEventParams {
                    stage: PipelineStage::Validate,
                    outcome: "validation",
                    captcha_strategy: None,
                    invalid_fields: issues.fields().map(str::to_string).collect(),
                    detail: None,
                });
                return PipelineResult::RejectedValidation(issues);
            }
        };

        match evaluate(&submission, self.clock.now_millis(), &self.config.bot) {
            BotVerdict::Human => {}
            BotVerdict::Honeypot => {
                self.record(SubmissionAuditEventParams {
                    stage: PipelineStage::BotCheck,
                    outcome: "honeypot",
                    captcha_strategy: None,
                    invalid_fields: Vec::new(),
                    detail: None,
                });
                return PipelineResult::Accepted;
            }
            BotVerdict::Suspected {
                reason,
                signal,
            } => {
                self.record(SubmissionAuditEventParams {
                    stage: PipelineStage::BotCheck,
                    outcome: reason.code(),
                    captcha_strategy: None,
                    invalid_fields: Vec::new(),
                    detail: Some(signal.to_string()),
                });
                return PipelineResult::RejectedBotSuspected(reason);
            }
        }

        let strategy = self.verifier.strategy();
        let captcha_detail = match self.verifier.verify(&submission.captcha_proof).await {
            Ok(outcome) if outcome.passes(self.config.min_captcha_score) => None,
            Ok(outcome) => Some(format!(
                "verified={} confidence={}",
                outcome.verified, outcome.confidence
            )),
            Err(err) => Some(err.to_string()),
        };
        if let Some(detail) = captcha_detail {
            self.record(SubmissionAuditEventParams {
                stage: PipelineStage::Captcha,
                outcome: "bad_captcha",
                captcha_strategy: Some(strategy),
                invalid_fields: Vec::new(),
                detail: Some(detail),
            });
            return PipelineResult::RejectedCaptcha;
        }

        match self.dispatcher.dispatch(&submission).await {
            Ok(receipt) => {
                self.record(SubmissionAuditEventParams {
                    stage: PipelineStage::Dispatch,
                    outcome: "accepted",
                    captcha_strategy: Some(strategy),
                    invalid_fields: Vec::new(),
                    detail: receipt.message_id.map(|id| format!("message_id={id}")),
                });
                PipelineResult::Accepted
            }
            Err(err) => {
                self.record(SubmissionAuditEventParams {
                    stage: PipelineStage::Dispatch,
                    outcome: "email_failed",
                    captcha_strategy: Some(strategy),
                    invalid_fields: Vec::new(),
                    detail: Some(err.to_string()),
                });
                PipelineResult::DispatchFailed
            }
        }
    }

    /// Records the audit event for this invocation.
    fn record(&self, params: SubmissionAuditEventParams) {
        self.audit.record(&SubmissionAuditEvent::new(params));
    }
}
