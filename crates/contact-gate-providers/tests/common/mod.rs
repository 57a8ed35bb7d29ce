// crates/contact-gate-providers/tests/common/mod.rs
// ============================================================================
// Module: Provider Test Fixtures
// Description: One-shot local HTTP stubs that capture the inbound request.
// ============================================================================

//! ## Overview
//! Spawns a `tiny_http` server on an ephemeral port, answers a fixed number of
//! requests with a canned response, and hands each captured request back to
//! the test through a channel.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are not used by every test binary."
)]

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use contact_gate_core::ContactSubmission;
use contact_gate_providers::HttpPolicy;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Request observed by a stub server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub url: String,
    /// Header pairs, names lowercased.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == &name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }
}

/// Running stub server.
pub struct StubServer {
    /// Base URL (`http://127.0.0.1:port/path`).
    pub url: String,
    /// Captured requests.
    pub requests: mpsc::Receiver<CapturedRequest>,
    /// Server thread.
    pub handle: thread::JoinHandle<()>,
}

impl StubServer {
    /// Returns the next captured request, if one arrived.
    pub fn captured(&self) -> Option<CapturedRequest> {
        self.requests.recv_timeout(Duration::from_secs(5)).ok()
    }

    /// Returns true when no request reached the server.
    pub fn untouched(&self) -> bool {
        self.requests.try_recv().is_err()
    }
}

/// Starts a stub that answers up to `max_requests` with `status` and `body`.
pub fn stub(status: u16, body: &'static str, max_requests: usize) -> StubServer {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        for _ in 0..max_requests {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                return;
            };
            let mut content = String::new();
            let _ = request.as_reader().read_to_string(&mut content);
            let captured = CapturedRequest {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|header| {
                        (
                            header.field.as_str().as_str().to_ascii_lowercase(),
                            header.value.as_str().to_string(),
                        )
                    })
                    .collect(),
                body: content,
            };
            let _ = tx.send(captured);
            let header =
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
            let response =
                Response::from_string(body).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    StubServer {
        url: format!("http://{addr}/endpoint"),
        requests: rx,
        handle,
    }
}

/// Policy permitting cleartext calls to local stubs.
pub fn local_policy() -> HttpPolicy {
    HttpPolicy {
        allow_http: true,
        timeout_ms: 2_000,
        max_response_bytes: 4 * 1024,
        ..HttpPolicy::default()
    }
}

/// Returns a valid submission.
pub fn submission() -> ContactSubmission {
    ContactSubmission {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        subject: "Hello".to_string(),
        message: "I would like to talk about engines.".to_string(),
        honeypot: None,
        started_at_ms: None,
        captcha_proof: "token-abc".to_string(),
    }
}
