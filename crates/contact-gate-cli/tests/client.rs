// crates/contact-gate-cli/tests/client.rs
// ============================================================================
// Module: Contact Client Tests
// Description: Exercises the terminal form client against a local stub.
// Purpose: Ensure local validation short-circuits and responses decode.
// Dependencies: contact-gate-cli, tiny_http, tempfile, tokio
// ============================================================================

//! ## Overview
//! A `tiny_http` stub stands in for the contact service. Each test asserts on
//! the requests the client actually sent.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use contact_gate_cli::client::ContactClient;
use contact_gate_cli::presentation::FileTokenWidget;
use contact_gate_cli::presentation::TokenError;
use contact_gate_cli::presentation::acquire_token;
use contact_gate_core::BoundedPoll;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Request observed by the stub service.
struct Seen {
    /// HTTP method.
    method: String,
    /// Request path.
    url: String,
    /// Raw body.
    body: String,
}

/// Starts a stub that answers up to `max_requests` by path.
fn stub_service(max_requests: usize) -> (String, mpsc::Receiver<Seen>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0 .. max_requests {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let url = request.url().to_string();
            let answer = if url == "/api/captcha/config" {
                r#"{"mode":"managed_token","siteKey":"site-123","action":"contact"}"#
            } else {
                r#"{"ok":false,"error":"too_fast"}"#
            };
            let _ = tx.send(Seen {
                method: request.method().to_string(),
                url,
                body,
            });
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let _ = request.respond(Response::from_string(answer).with_header(header));
        }
    });
    (format!("http://{addr}"), rx)
}

/// Returns a submission that passes local validation.
fn valid_form() -> serde_json::Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "subject": "Engines",
        "message": "A question about the analytical engine.",
        "captchaProof": "token",
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms an invalid form is rejected locally without any request.
#[tokio::test]
async fn invalid_form_sends_nothing() {
    let (base, seen) = stub_service(1);
    let client = ContactClient::new(&base, Duration::from_secs(5)).unwrap();
    let mut form = valid_form();
    form["email"] = json!("not-an-email");
    form["subject"] = json!("Hi");

    let response = client.submit(&form).await.unwrap();

    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some("validation"));
    let issues = response.issues.unwrap();
    assert_eq!(issues.get("email"), Some("Invalid email"));
    assert_eq!(issues.get("subject"), Some("Too short"));
    assert!(seen.recv_timeout(Duration::from_millis(200)).is_err());
}

/// Confirms a valid form is posted as JSON and the response decodes.
#[tokio::test]
async fn valid_form_is_posted_as_json() {
    let (base, seen) = stub_service(1);
    let client = ContactClient::new(&format!("{base}/"), Duration::from_secs(5)).unwrap();

    let response = client.submit(&valid_form()).await.unwrap();

    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some("too_fast"));
    let request = seen.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/contact");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["captchaProof"], "token");
}

/// Confirms CAPTCHA settings decode from camelCase JSON.
#[tokio::test]
async fn captcha_settings_decode() {
    let (base, seen) = stub_service(1);
    let client = ContactClient::new(&base, Duration::from_secs(5)).unwrap();

    let settings = client.captcha_settings().await.unwrap();

    assert_eq!(settings.mode, "managed_token");
    assert_eq!(settings.site_key.as_deref(), Some("site-123"));
    assert_eq!(settings.action.as_deref(), Some("contact"));
    assert_eq!(seen.recv_timeout(Duration::from_secs(5)).unwrap().method, "GET");
}

/// Confirms an unreachable service surfaces a transport error.
#[tokio::test]
async fn unreachable_service_is_an_error() {
    let client = ContactClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    assert!(client.submit(&valid_form()).await.is_err());
}

/// Confirms a file-backed widget yields the token once the file appears.
#[tokio::test]
async fn file_widget_waits_for_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.txt");
    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        tokio::fs::write(&writer_path, "minted-token\n").await.unwrap();
    });

    let widget = FileTokenWidget::new(path);
    let token =
        acquire_token(&widget, "site", "contact", BoundedPoll::new(40, Duration::from_millis(25)))
            .await;

    writer.await.unwrap();
    assert_eq!(token, Ok("minted-token".to_string()));
}

/// Confirms a missing token file gives up after the poll budget.
#[tokio::test]
async fn file_widget_gives_up_when_file_never_appears() {
    let dir = tempfile::tempdir().unwrap();
    let widget = FileTokenWidget::new(dir.path().join("absent.txt"));
    let token =
        acquire_token(&widget, "site", "contact", BoundedPoll::new(3, Duration::from_millis(5)))
            .await;
    assert_eq!(token, Err(TokenError::WidgetUnavailable));
}
