// crates/contact-gate-providers/src/email.rs
// ============================================================================
// Module: Email Dispatch
// Description: Notification composition and the transactional email client.
// Purpose: Deliver one notification per accepted submission, never retrying.
// Dependencies: contact-gate-config, contact-gate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`compose_email`] renders the notification for a submission: a tagged
//! subject, a plain-text body, and an HTML body in which every user-supplied
//! value is escaped. [`ResendDispatcher`] posts the rendered message to a
//! Resend-compatible JSON API with bearer authentication.
//!
//! Security posture: submission content is untrusted and is escaped before it
//! reaches HTML; the API key never appears in errors or logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use contact_gate_config::EmailConfig;
use contact_gate_config::SecretString;
use contact_gate_core::ContactSubmission;
use contact_gate_core::DispatchError;
use contact_gate_core::DispatchReceipt;
use contact_gate_core::EmailDispatcher;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::http::DEFAULT_USER_AGENT;
use crate::http::HttpFailure;
use crate::http::HttpPolicy;
use crate::http::build_client;
use crate::http::parse_endpoint;
use crate::http::read_response_limited;

// ============================================================================
// SECTION: Composition
// ============================================================================

/// Addressing for outbound notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRouting {
    /// Sender address, optionally with a display name.
    pub from: String,
    /// Destination address.
    pub to: String,
    /// Tag prepended to every subject.
    pub subject_prefix: String,
}

impl EmailRouting {
    /// Extracts routing from the email configuration section.
    #[must_use]
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject_prefix: config.subject_prefix.clone(),
        }
    }
}

/// Rendered notification in the provider's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    /// Sender address.
    pub from: String,
    /// Destination addresses.
    pub to: Vec<String>,
    /// Reply-to address (the submitter).
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Renders the notification for a submission.
#[must_use]
pub fn compose_email(submission: &ContactSubmission, routing: &EmailRouting) -> OutboundEmail {
    let name = submission.sender_name();
    let text = format!("From: {name} <{}>\n\n{}", submission.email, submission.message);
    let html = format!(
        "<div style=\"font-family:system-ui,Segoe UI,Roboto,Helvetica,Arial,sans-serif\">\n\
         <p><strong>From:</strong> {} &lt;{}&gt;</p>\n\
         <p><strong>Subject:</strong> {}</p>\n\
         <hr />\n\
         <p>{}</p>\n\
         </div>",
        html_escape(&name),
        html_escape(&submission.email),
        html_escape(&submission.subject),
        html_escape(&submission.message).replace("\r\n", "\n").replace('\n', "<br/>"),
    );
    OutboundEmail {
        from: routing.from.clone(),
        to: vec![routing.to.clone()],
        reply_to: submission.email.clone(),
        subject: format!("{}{}", routing.subject_prefix, single_line(&submission.subject)),
        text,
        html,
    }
}

/// Escapes text for inclusion in HTML element content and attributes.
#[must_use]
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Collapses control characters so a subject stays on one header line.
fn single_line(input: &str) -> String {
    input.chars().map(|ch| if ch.is_control() { ' ' } else { ch }).collect()
}

// ============================================================================
// SECTION: Resend Dispatcher
// ============================================================================

/// Success body returned by the email API.
#[derive(Debug, Deserialize)]
struct SendResponse {
    /// Provider message identifier.
    #[serde(default)]
    id: Option<String>,
}

/// Dispatcher for Resend-compatible email APIs.
///
/// # Invariants
/// - Exactly one request per dispatch; never retries.
/// - Without an API key, dispatch fails before any network call.
/// - Redirects are not followed.
pub struct ResendDispatcher {
    /// API endpoint.
    endpoint: Url,
    /// Bearer token.
    api_key: Option<SecretString>,
    /// Addressing for notifications.
    routing: EmailRouting,
    /// Maximum response size in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl ResendDispatcher {
    /// Creates a dispatcher from an endpoint, key, routing, and transport policy.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] when the endpoint violates policy
    /// or the client cannot be built.
    pub fn new(
        endpoint: &str,
        api_key: Option<SecretString>,
        routing: EmailRouting,
        policy: &HttpPolicy,
    ) -> Result<Self, DispatchError> {
        let endpoint = parse_endpoint(endpoint, policy.allow_http).map_err(dispatch_error)?;
        let client = build_client(policy).map_err(dispatch_error)?;
        Ok(Self {
            endpoint,
            api_key: api_key.filter(|key| !key.is_blank()),
            routing,
            max_response_bytes: policy.max_response_bytes,
            client,
        })
    }

    /// Creates a dispatcher from the email configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the dispatcher cannot be constructed.
    pub fn from_config(config: &EmailConfig) -> Result<Self, DispatchError> {
        let policy = HttpPolicy {
            allow_http: config.allow_http,
            timeout_ms: config.timeout_ms,
            max_response_bytes: config.max_response_bytes,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        };
        Self::new(&config.api_url, config.key().cloned(), EmailRouting::from_config(config), &policy)
    }
}

#[async_trait]
impl EmailDispatcher for ResendDispatcher {
    async fn dispatch(
        &self,
        submission: &ContactSubmission,
    ) -> Result<DispatchReceipt, DispatchError> {
        let api_key = self.api_key.as_ref().ok_or(DispatchError::MissingApiKey)?;
        let message = compose_email(submission, &self.routing);
        let body = serde_json::to_vec(&message).map_err(|_| DispatchError::Serialization)?;
        let mut response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", api_key.expose()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|_| DispatchError::Transport("email request failed".to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
            });
        }
        let message_id = read_response_limited(&mut response, self.max_response_bytes)
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<SendResponse>(&bytes).ok())
            .and_then(|decoded| decoded.id);
        Ok(DispatchReceipt {
            message_id,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a transport failure into a dispatch error.
fn dispatch_error(failure: HttpFailure) -> DispatchError {
    match failure {
        HttpFailure::Endpoint(message) | HttpFailure::Transport(message) => {
            DispatchError::Transport(message)
        }
        HttpFailure::TooLarge => DispatchError::Transport("response exceeds size limit".to_string()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use contact_gate_core::ContactSubmission;
    use proptest::prelude::*;

    use super::EmailRouting;
    use super::compose_email;
    use super::html_escape;

    fn submission(subject: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            honeypot: None,
            started_at_ms: None,
            captcha_proof: "7".to_string(),
        }
    }

    fn routing() -> EmailRouting {
        EmailRouting {
            from: "Portfolio <onboarding@resend.dev>".to_string(),
            to: "owner@example.com".to_string(),
            subject_prefix: "Portfolio Contact: ".to_string(),
        }
    }

    #[test]
    fn subject_carries_prefix() {
        let email = compose_email(&submission("Hello", "Hi there, friend"), &routing());
        assert_eq!(email.subject, "Portfolio Contact: Hello");
        assert_eq!(email.to, vec!["owner@example.com".to_string()]);
        assert_eq!(email.reply_to, "ada@example.com");
    }

    #[test]
    fn text_body_names_sender() {
        let email = compose_email(&submission("Hello", "Line one\nLine two"), &routing());
        assert_eq!(email.text, "From: Ada Lovelace <ada@example.com>\n\nLine one\nLine two");
    }

    #[test]
    fn html_body_breaks_lines_and_escapes_markup() {
        let email =
            compose_email(&submission("<b>Hi</b>", "first & second\n<i>third</i>"), &routing());
        assert!(email.html.contains("<p><strong>Subject:</strong> &lt;b&gt;Hi&lt;/b&gt;</p>"));
        assert!(email.html.contains("first &amp; second<br/>&lt;i&gt;third&lt;/i&gt;"));
        assert!(email.html.contains("Ada Lovelace &lt;ada@example.com&gt;"));
        assert!(email.html.contains("<hr />"));
        assert!(!email.html.contains("<i>"));
    }

    #[test]
    fn subject_control_characters_are_flattened() {
        let email = compose_email(&submission("Hi\r\nBcc: x@y.z", "Hello there friend"), &routing());
        assert!(!email.subject.contains('\n'));
        assert!(!email.subject.contains('\r'));
    }

    #[test]
    fn wire_shape_matches_provider_fields() {
        let email = compose_email(&submission("Hello", "Hello there friend"), &routing());
        let value = serde_json::to_value(&email).unwrap_or_default();
        for key in ["from", "to", "reply_to", "subject", "text", "html"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    proptest! {
        #[test]
        fn escaped_text_never_contains_markup(input in ".*") {
            let escaped = html_escape(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
        }
    }
}
