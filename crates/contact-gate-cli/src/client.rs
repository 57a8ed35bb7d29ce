// crates/contact-gate-cli/src/client.rs
// ============================================================================
// Module: Contact Client
// Description: HTTP client for the contact endpoints.
// Purpose: Submit forms with an optimistic local validation pass.
// Dependencies: contact-gate-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`ContactClient::submit`] runs the shared validation schema locally before
//! any request. When it fails, the client returns the same validation response
//! the server would and sends nothing. The server re-validates regardless.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use contact_gate_core::ContactResponse;
use contact_gate_core::PipelineResult;
use contact_gate_core::RawSubmission;
use contact_gate_core::validate_submission;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Maximum response body accepted from the contact service.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Public CAPTCHA settings advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaSettings {
    /// Strategy label (`challenge_answer` or `managed_token`).
    pub mode: String,
    /// Public site key.
    #[serde(default)]
    pub site_key: Option<String>,
    /// Widget action label.
    #[serde(default)]
    pub action: Option<String>,
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached or answered unexpectedly.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with an unreadable body.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// HTTP client for a contact service.
pub struct ContactClient {
    /// Service base URL without trailing slash.
    base: String,
    /// HTTP client.
    client: Client,
}

impl ContactClient {
    /// Creates a client for the service at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|_| ClientError::Transport("http client build failed".to_string()))?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetches the public CAPTCHA settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request or decoding fails.
    pub async fn captcha_settings(&self) -> Result<CaptchaSettings, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/captcha/config", self.base))
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        decode(response).await
    }

    /// Validates locally, then posts the submission as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service cannot be reached.
    pub async fn submit(&self, form: &Value) -> Result<ContactResponse, ClientError> {
        if let Err(issues) = validate_submission(&RawSubmission::from_json(form.clone())) {
            return Ok(PipelineResult::RejectedValidation(issues).to_response());
        }
        let response = self
            .client
            .post(format!("{}/api/contact", self.base))
            .header(CONTENT_TYPE, "application/json")
            .body(form.to_string())
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        decode(response).await
    }
}

/// Decodes a bounded JSON response body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|err| ClientError::Transport(err.to_string()))?;
    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(ClientError::InvalidResponse("response exceeds size limit".to_string()));
    }
    serde_json::from_slice(&bytes).map_err(|_| {
        ClientError::InvalidResponse(format!("unexpected response with status {}", status.as_u16()))
    })
}
