// crates/contact-gate-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Fixtures
// Description: In-process server with scripted providers.
// ============================================================================

//! ## Overview
//! Starts the contact router on an ephemeral port with in-memory CAPTCHA and
//! email collaborators so HTTP behavior can be asserted end to end.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are not used by every test binary."
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use contact_gate_config::ContactGateConfig;
use contact_gate_core::AuditSink;
use contact_gate_core::CaptchaError;
use contact_gate_core::CaptchaVerificationOutcome;
use contact_gate_core::CaptchaVerifier;
use contact_gate_core::ContactSubmission;
use contact_gate_core::DispatchError;
use contact_gate_core::DispatchReceipt;
use contact_gate_core::EmailDispatcher;
use contact_gate_core::SubmissionAuditEvent;
use contact_gate_core::SubmissionPipeline;
use contact_gate_core::SystemClock;
use contact_gate_server::ContactServer;
use serde_json::Value;

/// Verifier accepting every non-blank proof with full confidence.
pub struct AcceptingVerifier;

#[async_trait]
impl CaptchaVerifier for AcceptingVerifier {
    async fn verify(&self, proof: &str) -> Result<CaptchaVerificationOutcome, CaptchaError> {
        Ok(CaptchaVerificationOutcome {
            verified: !proof.trim().is_empty(),
            confidence: 1.0,
        })
    }

    fn strategy(&self) -> &'static str {
        "test"
    }
}

/// Dispatcher counting calls, optionally stalling before answering.
pub struct StubDispatcher {
    /// Delay before answering.
    pub delay: Duration,
    /// Number of dispatch calls.
    pub calls: AtomicUsize,
}

impl StubDispatcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailDispatcher for StubDispatcher {
    async fn dispatch(
        &self,
        _submission: &ContactSubmission,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(DispatchReceipt::default())
    }
}

/// Audit sink keeping events in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events.
    pub events: Mutex<Vec<SubmissionAuditEvent>>,
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &SubmissionAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Running test server.
pub struct TestServer {
    /// Base URL.
    pub base: String,
    /// Dispatcher handle.
    pub dispatcher: Arc<StubDispatcher>,
    /// Audit handle.
    pub audit: Arc<MemoryAuditSink>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

/// Starts a server with the given configuration and dispatcher delay.
pub async fn spawn(mut config: ContactGateConfig, dispatch_delay: Duration) -> TestServer {
    config.server.bind = "127.0.0.1:0".to_string();
    let dispatcher = Arc::new(StubDispatcher {
        delay: dispatch_delay,
        calls: AtomicUsize::new(0),
    });
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = SubmissionPipeline::new(
        Arc::new(AcceptingVerifier),
        Arc::clone(&dispatcher) as Arc<dyn EmailDispatcher>,
        Arc::new(SystemClock),
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        config.pipeline_config(),
    );
    let server = ContactServer::with_pipeline(&config, pipeline).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let app = server.router();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    TestServer {
        base: format!("http://{addr}"),
        dispatcher,
        audit,
    }
}

/// Returns a valid JSON submission started long enough ago.
pub fn valid_json() -> Value {
    serde_json::json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "subject": "Hello",
        "message": "I would like to talk about engines.",
        "captchaProof": "token",
        "formStartTime": 0
    })
}

/// Decodes a JSON response body.
pub async fn json_body(response: reqwest::Response) -> Value {
    let bytes = response.bytes().await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
