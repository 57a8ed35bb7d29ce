// crates/contact-gate-cli/src/presentation.rs
// ============================================================================
// Module: Contact Form Presentation
// Description: Feedback mapping and CAPTCHA token acquisition for the form.
// Purpose: Turn pipeline responses into localized, non-technical feedback.
// Dependencies: async-trait, contact-gate-core, tokio
// ============================================================================

//! ## Overview
//! The presentation layer switches on the response tag only. Validation
//! failures map messages onto individual fields; every other failure becomes
//! one general notice. Provider details never reach this layer.
//!
//! Managed-token CAPTCHA widgets load asynchronously, so token acquisition
//! polls for readiness with [`BoundedPoll`] and gives up instead of hanging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use async_trait::async_trait;
use contact_gate_core::BoundedPoll;
use contact_gate_core::ContactResponse;
use thiserror::Error;

use crate::i18n::Locale;
use crate::i18n::lookup;
use crate::t;

// ============================================================================
// SECTION: Feedback
// ============================================================================

/// Localized message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    /// Canonical field name.
    pub field: String,
    /// Localized field label.
    pub label: String,
    /// Localized message.
    pub message: String,
}

/// User-facing outcome of one submission.
///
/// # Invariants
/// - `field_messages` is non-empty only for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// True when the submission was accepted.
    pub success: bool,
    /// General notice shown to the user.
    pub notice: String,
    /// Per-field messages in field-name order.
    pub field_messages: Vec<FieldMessage>,
}

/// Maps a contact response onto localized feedback.
#[must_use]
pub fn feedback(response: &ContactResponse, locale: Locale) -> Feedback {
    if response.ok {
        return Feedback {
            success: true,
            notice: t!(locale, "form.success"),
            field_messages: Vec::new(),
        };
    }
    let code = response.error.as_deref().unwrap_or("");
    let notice = match code {
        "validation" => t!(locale, "form.error.validation"),
        "bad_captcha" => t!(locale, "form.error.bad_captcha"),
        "too_fast" => t!(locale, "form.error.too_fast"),
        "spam" => t!(locale, "form.error.spam"),
        "email_failed" => t!(locale, "form.error.email_failed"),
        _ => t!(locale, "form.error.unknown"),
    };
    let field_messages = match (code, &response.issues) {
        ("validation", Some(issues)) => issues
            .iter()
            .map(|(field, message)| FieldMessage {
                field: field.to_string(),
                label: localized(locale, "form.field.", field),
                message: localized(locale, "form.issue.", message),
            })
            .collect(),
        _ => Vec::new(),
    };
    Feedback {
        success: false,
        notice,
        field_messages,
    }
}

/// Localizes a catalog suffix, falling back to the raw text.
fn localized(locale: Locale, prefix: &str, suffix: &str) -> String {
    lookup(locale, &format!("{prefix}{suffix}")).unwrap_or(suffix).to_string()
}

/// Renders feedback as terminal lines.
#[must_use]
pub fn render(feedback: &Feedback, locale: Locale) -> Vec<String> {
    let mut lines = vec![feedback.notice.clone()];
    for entry in &feedback.field_messages {
        lines.push(t!(locale, "form.field.line", field = entry.label, message = entry.message));
    }
    lines
}

// ============================================================================
// SECTION: Token Widget
// ============================================================================

/// Token acquisition errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The widget never reported readiness within the poll budget.
    #[error("captcha widget did not become ready")]
    WidgetUnavailable,
    /// The widget was ready but produced no token.
    #[error("captcha widget returned no token")]
    NoToken,
}

/// Client-side managed CAPTCHA widget.
#[async_trait]
pub trait TokenWidget: Send + Sync {
    /// Returns true once the widget can mint tokens.
    async fn is_ready(&self) -> bool;

    /// Mints a token for `action` using the public `site_key`.
    async fn execute(&self, site_key: &str, action: &str) -> Option<String>;
}

/// Waits for widget readiness, then mints one token.
///
/// # Errors
///
/// Returns [`TokenError`] when the widget stays unavailable or yields nothing.
pub async fn acquire_token(
    widget: &dyn TokenWidget,
    site_key: &str,
    action: &str,
    poll: BoundedPoll,
) -> Result<String, TokenError> {
    poll.poll(move || async move { widget.is_ready().await.then_some(()) })
        .await
        .ok_or(TokenError::WidgetUnavailable)?;
    widget
        .execute(site_key, action)
        .await
        .filter(|token| !token.trim().is_empty())
        .ok_or(TokenError::NoToken)
}

/// Widget holding a token supplied up front.
#[derive(Debug, Clone)]
pub struct StaticTokenWidget {
    /// Token returned on every execution.
    token: String,
}

impl StaticTokenWidget {
    /// Creates a widget that always yields `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenWidget for StaticTokenWidget {
    async fn is_ready(&self) -> bool {
        true
    }

    async fn execute(&self, _site_key: &str, _action: &str) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Widget backed by a file that an external helper (for example a browser
/// page running the provider script) writes the token into.
#[derive(Debug, Clone)]
pub struct FileTokenWidget {
    /// Token file path.
    path: PathBuf,
}

/// Largest token file accepted.
const MAX_TOKEN_FILE_BYTES: u64 = 16 * 1024;

impl FileTokenWidget {
    /// Creates a widget reading tokens from `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }
}

#[async_trait]
impl TokenWidget for FileTokenWidget {
    async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .is_ok_and(|meta| meta.is_file() && meta.len() > 0 && meta.len() <= MAX_TOKEN_FILE_BYTES)
    }

    async fn execute(&self, _site_key: &str, _action: &str) -> Option<String> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        let token = content.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use async_trait::async_trait;
    use contact_gate_core::BoundedPoll;
    use contact_gate_core::ContactResponse;
    use contact_gate_core::FieldErrors;

    use super::TokenError;
    use super::TokenWidget;
    use super::acquire_token;
    use super::feedback;
    use crate::i18n::Locale;

    struct LateWidget {
        ready_after: u32,
        probes: AtomicU32,
    }

    #[async_trait]
    impl TokenWidget for LateWidget {
        async fn is_ready(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst) + 1 >= self.ready_after
        }

        async fn execute(&self, site_key: &str, action: &str) -> Option<String> {
            Some(format!("{site_key}:{action}"))
        }
    }

    fn failure(code: &str) -> ContactResponse {
        ContactResponse {
            ok: false,
            error: Some(code.to_string()),
            issues: None,
        }
    }

    #[test]
    fn success_has_no_field_messages() {
        let result = feedback(&ContactResponse::ok(), Locale::En);
        assert!(result.success);
        assert_eq!(result.notice, "Thanks! Your message has been sent.");
        assert!(result.field_messages.is_empty());
    }

    #[test]
    fn validation_maps_messages_to_fields() {
        let mut issues = FieldErrors::new();
        issues.insert("email", "Invalid email");
        issues.insert("subject", "Too short");
        let response = ContactResponse {
            ok: false,
            error: Some("validation".to_string()),
            issues: Some(issues),
        };
        let result = feedback(&response, Locale::Es);
        assert!(!result.success);
        assert_eq!(result.field_messages.len(), 2);
        assert_eq!(result.field_messages[0].field, "email");
        assert_eq!(result.field_messages[0].label, "Correo");
        assert_eq!(result.field_messages[0].message, "Correo no válido");
        assert_eq!(result.field_messages[1].message, "Demasiado corto");
    }

    #[test]
    fn other_failures_are_general_notices() {
        for code in ["bad_captcha", "too_fast", "spam", "email_failed", "mystery"] {
            let result = feedback(&failure(code), Locale::En);
            assert!(!result.success);
            assert!(result.field_messages.is_empty());
            assert!(!result.notice.is_empty());
        }
        assert_eq!(
            feedback(&failure("mystery"), Locale::En).notice,
            "Something went wrong. Please try again later."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_acquired_once_widget_is_ready() {
        let widget = LateWidget {
            ready_after: 3,
            probes: AtomicU32::new(0),
        };
        let token =
            acquire_token(&widget, "site", "contact", BoundedPoll::new(5, Duration::from_millis(250)))
                .await;
        assert_eq!(token, Ok("site:contact".to_string()));
        assert_eq!(widget.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unready_widget_fails_after_cap() {
        let widget = LateWidget {
            ready_after: u32::MAX,
            probes: AtomicU32::new(0),
        };
        let token = acquire_token(&widget, "site", "contact", BoundedPoll::default()).await;
        assert_eq!(token, Err(TokenError::WidgetUnavailable));
        assert_eq!(widget.probes.load(Ordering::SeqCst), 20);
    }
}
