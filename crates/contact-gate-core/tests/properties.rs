// crates/contact-gate-core/tests/properties.rs
// ============================================================================
// Module: Pipeline Property Tests
// Description: Property-based checks for validation and bot mitigation.
// ============================================================================
//! ## Overview
//! Uses proptest to check idempotent validation, honeypot silence, and the
//! timing threshold across generated inputs.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use contact_gate_core::BotPolicy;
use contact_gate_core::BotReason;
use contact_gate_core::BotVerdict;
use contact_gate_core::PipelineResult;
use contact_gate_core::RawSubmission;
use contact_gate_core::bot::evaluate;
use contact_gate_core::validate_submission;
use proptest::prelude::*;

use crate::common::CaptchaScript;
use crate::common::NOW_MS;
use crate::common::harness;
use crate::common::scenario_a;

/// Builds a single-threaded runtime for async pipeline calls inside proptest.
fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap()
}

proptest! {
    #[test]
    fn validation_is_idempotent(
        first in ".{0,12}",
        email in ".{0,24}",
        subject in ".{0,8}",
        message in ".{0,16}",
    ) {
        let raw = RawSubmission::from_form_pairs([
            ("firstName", first),
            ("lastName", "Gomez".to_string()),
            ("email", email),
            ("subject", subject),
            ("message", message),
        ]);
        let first_run = validate_submission(&raw);
        let second_run = validate_submission(&raw);
        prop_assert_eq!(first_run, second_run);
    }

    #[test]
    fn non_empty_honeypot_never_dispatches(trap in "[ a-zA-Z0-9]{1,20}") {
        let h = harness(CaptchaScript::Outcome(true, 0.9), false);
        let raw = scenario_a().with("company", trap);
        let result = runtime().block_on(h.pipeline.submit(&raw));
        prop_assert_eq!(result, PipelineResult::Accepted);
        prop_assert_eq!(h.dispatcher.calls(), 0);
    }

    #[test]
    fn submissions_inside_threshold_are_too_fast(elapsed in 0_i64..2_000) {
        let raw = scenario_a().with("formStartTime", NOW_MS - elapsed);
        let submission = validate_submission(&raw).unwrap();
        let verdict = evaluate(&submission, NOW_MS, &BotPolicy::default());
        prop_assert_eq!(
            verdict,
            BotVerdict::Suspected { reason: BotReason::TooFast, signal: "elapsed_below_threshold" }
        );
    }

    #[test]
    fn low_confidence_never_dispatches(score in 0.0_f64..0.5) {
        let h = harness(CaptchaScript::Outcome(true, score), false);
        let result = runtime().block_on(h.pipeline.submit(&scenario_a()));
        prop_assert_eq!(result, PipelineResult::RejectedCaptcha);
        prop_assert_eq!(h.dispatcher.calls(), 0);
    }
}
