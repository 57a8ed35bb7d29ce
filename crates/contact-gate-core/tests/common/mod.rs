// crates/contact-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: In-memory collaborators and sample submissions for core tests.
// ============================================================================

//! ## Overview
//! Shared mocks for pipeline tests: a scripted CAPTCHA verifier, a counting
//! email dispatcher, a fixed clock, and a recording audit sink.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are not used by every test binary."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use contact_gate_core::AuditSink;
use contact_gate_core::CaptchaError;
use contact_gate_core::CaptchaVerificationOutcome;
use contact_gate_core::CaptchaVerifier;
use contact_gate_core::Clock;
use contact_gate_core::ContactSubmission;
use contact_gate_core::DispatchError;
use contact_gate_core::DispatchReceipt;
use contact_gate_core::EmailDispatcher;
use contact_gate_core::PipelineConfig;
use contact_gate_core::RawSubmission;
use contact_gate_core::SubmissionAuditEvent;
use contact_gate_core::SubmissionPipeline;
use serde_json::json;

/// Fixed evaluation time used across tests.
pub const NOW_MS: i64 = 1_750_000_000_000;

/// Scripted verifier response.
#[derive(Clone, Copy)]
pub enum CaptchaScript {
    /// Return the given outcome.
    Outcome(bool, f64),
    /// Fail with a transport error.
    TransportError,
    /// Fail because the secret is missing.
    MissingSecret,
}

/// Verifier returning a scripted response and counting calls.
pub struct ScriptedVerifier {
    /// Scripted response.
    pub script: CaptchaScript,
    /// Number of verify calls.
    pub calls: AtomicUsize,
    /// Last proof seen.
    pub last_proof: Mutex<Option<String>>,
}

impl ScriptedVerifier {
    pub fn new(script: CaptchaScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last_proof: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for ScriptedVerifier {
    async fn verify(&self, proof: &str) -> Result<CaptchaVerificationOutcome, CaptchaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_proof.lock().unwrap() = Some(proof.to_string());
        match self.script {
            CaptchaScript::Outcome(verified, confidence) => Ok(CaptchaVerificationOutcome {
                verified,
                confidence,
            }),
            CaptchaScript::TransportError => Err(CaptchaError::Transport("connection refused".to_string())),
            CaptchaScript::MissingSecret => Err(CaptchaError::MissingSecret),
        }
    }

    fn strategy(&self) -> &'static str {
        "scripted"
    }
}

/// Dispatcher counting calls and optionally failing.
pub struct CountingDispatcher {
    /// Whether dispatch fails.
    pub fail: bool,
    /// Number of dispatch calls.
    pub calls: AtomicUsize,
    /// Submissions seen.
    pub seen: Mutex<Vec<ContactSubmission>>,
}

impl CountingDispatcher {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailDispatcher for CountingDispatcher {
    async fn dispatch(
        &self,
        submission: &ContactSubmission,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(submission.clone());
        if self.fail {
            return Err(DispatchError::Rejected {
                status: 500,
            });
        }
        Ok(DispatchReceipt {
            message_id: Some("msg_1".to_string()),
        })
    }
}

/// Clock pinned to a single instant.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Recorded events.
    pub events: Mutex<Vec<SubmissionAuditEvent>>,
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &SubmissionAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Pipeline plus handles to its collaborators.
pub struct Harness {
    pub pipeline: SubmissionPipeline,
    pub verifier: Arc<ScriptedVerifier>,
    pub dispatcher: Arc<CountingDispatcher>,
    pub audit: Arc<RecordingAuditSink>,
}

/// Builds a pipeline with the given scripts at [`NOW_MS`].
pub fn harness(script: CaptchaScript, dispatch_fails: bool) -> Harness {
    harness_with(script, dispatch_fails, PipelineConfig::default())
}

/// Builds a pipeline with an explicit config.
pub fn harness_with(script: CaptchaScript, dispatch_fails: bool, config: PipelineConfig) -> Harness {
    let verifier = ScriptedVerifier::new(script);
    let dispatcher = CountingDispatcher::new(dispatch_fails);
    let audit = Arc::new(RecordingAuditSink::default());
    let pipeline = SubmissionPipeline::new(
        verifier.clone(),
        dispatcher.clone(),
        Arc::new(FixedClock(NOW_MS)),
        audit.clone(),
        config,
    );
    Harness {
        pipeline,
        verifier,
        dispatcher,
        audit,
    }
}

/// Scenario A input.
pub fn scenario_a() -> RawSubmission {
    RawSubmission::from_json(json!({
        "firstName": "Ana",
        "lastName": "Gomez",
        "email": "ana@example.com",
        "subject": "Hello there",
        "message": "This is a test message.",
        "honeypot": "",
        "captchaProof": "valid-token"
    }))
}
