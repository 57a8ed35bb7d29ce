// crates/contact-gate-providers/src/captcha.rs
// ============================================================================
// Module: CAPTCHA Verifiers
// Description: Challenge-answer and managed-token CAPTCHA strategies.
// Purpose: Turn a submission's proof into a verdict, failing closed.
// Dependencies: contact-gate-config, contact-gate-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! Two strategies implement [`CaptchaVerifier`]:
//! - [`ChallengeAnswerVerifier`] accepts any non-blank answer; the challenge
//!   itself lives in the presentation layer.
//! - [`ManagedTokenVerifier`] posts the token and the server secret to a
//!   reCAPTCHA-compatible `siteverify` endpoint and reads back the verdict.
//!
//! Security posture: tokens are untrusted, and the secret never leaves the
//! outbound request body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use contact_gate_config::CaptchaConfig;
use contact_gate_config::CaptchaMode;
use contact_gate_config::SecretString;
use contact_gate_core::CaptchaError;
use contact_gate_core::CaptchaVerificationOutcome;
use contact_gate_core::CaptchaVerifier;
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;
use url::form_urlencoded;

use crate::http::DEFAULT_USER_AGENT;
use crate::http::HttpFailure;
use crate::http::HttpPolicy;
use crate::http::build_client;
use crate::http::parse_endpoint;
use crate::http::read_response_limited;

// ============================================================================
// SECTION: Challenge Answer
// ============================================================================

/// Verifier for the challenge-answer strategy.
///
/// # Invariants
/// - A non-blank answer yields `{verified: true, confidence: 1.0}`.
/// - A blank answer yields the rejected outcome without error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeAnswerVerifier;

#[async_trait]
impl CaptchaVerifier for ChallengeAnswerVerifier {
    async fn verify(&self, proof: &str) -> Result<CaptchaVerificationOutcome, CaptchaError> {
        if proof.trim().is_empty() {
            return Ok(CaptchaVerificationOutcome::REJECTED);
        }
        Ok(CaptchaVerificationOutcome {
            verified: true,
            confidence: 1.0,
        })
    }

    fn strategy(&self) -> &'static str {
        CaptchaMode::ChallengeAnswer.as_str()
    }
}

// ============================================================================
// SECTION: Managed Token
// ============================================================================

/// Verification endpoint response body.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    /// Provider verdict.
    success: bool,
    /// Risk score; absent for checkbox-style widgets.
    #[serde(default)]
    score: Option<f64>,
    /// Action label the widget executed with.
    #[serde(default)]
    action: Option<String>,
}

/// Verifier for provider-issued tokens.
///
/// # Invariants
/// - No network call is made without a secret and a non-blank token.
/// - Redirects are not followed; responses over the limit fail closed.
/// - A missing score is treated as confidence `0.0`.
pub struct ManagedTokenVerifier {
    /// Verification endpoint.
    endpoint: Url,
    /// Server-held secret.
    secret: Option<SecretString>,
    /// Expected action label, when enforced.
    expected_action: Option<String>,
    /// Maximum response size in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl ManagedTokenVerifier {
    /// Creates a verifier from an endpoint, secret, and transport policy.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Transport`] when the endpoint violates policy
    /// or the client cannot be built.
    pub fn new(
        endpoint: &str,
        secret: Option<SecretString>,
        expected_action: Option<String>,
        policy: &HttpPolicy,
    ) -> Result<Self, CaptchaError> {
        let endpoint = parse_endpoint(endpoint, policy.allow_http).map_err(captcha_error)?;
        let client = build_client(policy).map_err(captcha_error)?;
        Ok(Self {
            endpoint,
            secret: secret.filter(|secret| !secret.is_blank()),
            expected_action,
            max_response_bytes: policy.max_response_bytes,
            client,
        })
    }

    /// Creates a verifier from the CAPTCHA configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError`] when the verifier cannot be constructed.
    pub fn from_config(config: &CaptchaConfig) -> Result<Self, CaptchaError> {
        let policy = HttpPolicy {
            allow_http: config.allow_http,
            timeout_ms: config.timeout_ms,
            max_response_bytes: config.max_response_bytes,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        };
        Self::new(&config.verify_url, config.secret().cloned(), config.action.clone(), &policy)
    }

    /// Interprets a decoded verification response.
    fn interpret(
        &self,
        response: &SiteVerifyResponse,
    ) -> Result<CaptchaVerificationOutcome, CaptchaError> {
        let confidence = response.score.unwrap_or(0.0);
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(CaptchaError::MalformedResponse("score out of range".to_string()));
        }
        if !response.success {
            return Ok(CaptchaVerificationOutcome {
                verified: false,
                confidence,
            });
        }
        if let (Some(expected), Some(actual)) = (&self.expected_action, &response.action)
            && expected != actual
        {
            return Ok(CaptchaVerificationOutcome::REJECTED);
        }
        Ok(CaptchaVerificationOutcome {
            verified: true,
            confidence,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for ManagedTokenVerifier {
    async fn verify(&self, proof: &str) -> Result<CaptchaVerificationOutcome, CaptchaError> {
        let secret = self.secret.as_ref().ok_or(CaptchaError::MissingSecret)?;
        let token = proof.trim();
        if token.is_empty() {
            return Ok(CaptchaVerificationOutcome::REJECTED);
        }
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("secret", secret.expose())
            .append_pair("response", token)
            .finish();
        let mut response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(CACHE_CONTROL, "no-store")
            .body(body)
            .send()
            .await
            .map_err(|_| CaptchaError::Transport("verification request failed".to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CaptchaError::Transport(format!(
                "verification endpoint returned status {}",
                status.as_u16()
            )));
        }
        let bytes = read_response_limited(&mut response, self.max_response_bytes)
            .await
            .map_err(captcha_error)?;
        let decoded: SiteVerifyResponse = serde_json::from_slice(&bytes)
            .map_err(|err| CaptchaError::MalformedResponse(err.to_string()))?;
        self.interpret(&decoded)
    }

    fn strategy(&self) -> &'static str {
        CaptchaMode::ManagedToken.as_str()
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds the verifier selected by configuration.
///
/// # Errors
///
/// Returns [`CaptchaError`] when the managed-token verifier cannot be built.
pub fn verifier_from_config(
    config: &CaptchaConfig,
) -> Result<Arc<dyn CaptchaVerifier>, CaptchaError> {
    match config.mode {
        CaptchaMode::ChallengeAnswer => Ok(Arc::new(ChallengeAnswerVerifier)),
        CaptchaMode::ManagedToken => Ok(Arc::new(ManagedTokenVerifier::from_config(config)?)),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a transport failure into a CAPTCHA error.
fn captcha_error(failure: HttpFailure) -> CaptchaError {
    match failure {
        HttpFailure::Endpoint(message) | HttpFailure::Transport(message) => {
            CaptchaError::Transport(message)
        }
        HttpFailure::TooLarge => CaptchaError::ResponseTooLarge,
    }
}
