// crates/contact-gate-server/src/server.rs
// ============================================================================
// Module: Contact Server
// Description: Wiring from configuration to a running HTTP server.
// Purpose: Build providers, audit sink, and pipeline, then serve requests.
// Dependencies: axum, contact-gate-config, contact-gate-core, contact-gate-providers, tokio
// ============================================================================

//! ## Overview
//! [`ContactServer::from_config`] validates configuration, builds the CAPTCHA
//! verifier and email dispatcher the configuration selects, and records
//! startup posture warnings (missing API key, missing CAPTCHA secret) as
//! security audit events. Missing secrets do not prevent startup; the affected
//! stage fails closed per request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use contact_gate_config::AuditConfig;
use contact_gate_config::AuditSinkType;
use contact_gate_config::CaptchaMode;
use contact_gate_config::ContactGateConfig;
use contact_gate_core::AuditSink;
use contact_gate_core::FileAuditSink;
use contact_gate_core::NoopAuditSink;
use contact_gate_core::SecurityAuditEvent;
use contact_gate_core::StderrAuditSink;
use contact_gate_core::SubmissionPipeline;
use contact_gate_core::SystemClock;
use contact_gate_providers::ResendDispatcher;
use contact_gate_providers::verifier_from_config;
use tokio::net::TcpListener;

use crate::routes::AppState;
use crate::routes::router;

// ============================================================================
// SECTION: Contact Server
// ============================================================================

/// Contact server instance.
pub struct ContactServer {
    /// Bind address.
    bind: SocketAddr,
    /// Shared handler state.
    state: Arc<AppState>,
}

impl ContactServer {
    /// Builds a server from configuration using the production providers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: &ContactGateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.audit)?;
        let verifier = verifier_from_config(&config.captcha)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let dispatcher = ResendDispatcher::from_config(&config.email)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        emit_posture_warnings(config, audit.as_ref());
        let pipeline = SubmissionPipeline::new(
            verifier,
            Arc::new(dispatcher),
            Arc::new(SystemClock),
            audit,
            config.pipeline_config(),
        );
        Self::with_pipeline(config, pipeline)
    }

    /// Builds a server around an existing pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the bind address is invalid.
    pub fn with_pipeline(
        config: &ContactGateConfig,
        pipeline: SubmissionPipeline,
    ) -> Result<Self, ServerError> {
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            bind,
            state: Arc::new(AppState::new(pipeline, config)),
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an already bound listener until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the audit log file cannot be opened.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    match (config.sink, &config.path) {
        (AuditSinkType::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkType::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkType::File, Some(path)) => FileAuditSink::new(path)
            .map(|sink| Arc::new(sink) as Arc<dyn AuditSink>)
            .map_err(|err| ServerError::Init(format!("audit log open failed: {err}"))),
        (AuditSinkType::File, None) => {
            Err(ServerError::Config("audit.path is required for the file sink".to_string()))
        }
    }
}

/// Records startup warnings for missing secrets.
fn emit_posture_warnings(config: &ContactGateConfig, audit: &dyn AuditSink) {
    if config.email.key().is_none() {
        audit.record_security(&SecurityAuditEvent::new(
            "email_api_key_missing",
            Some("every accepted submission will fail with email_failed".to_string()),
        ));
    }
    if config.captcha.mode == CaptchaMode::ManagedToken {
        if config.captcha.secret().is_none() {
            audit.record_security(&SecurityAuditEvent::new(
                "captcha_secret_missing",
                Some("every submission will fail with bad_captcha".to_string()),
            ));
        }
        if config.captcha.site_key.is_none() {
            audit.record_security(&SecurityAuditEvent::new(
                "captcha_site_key_missing",
                Some("clients cannot obtain captcha tokens".to_string()),
            ));
        }
    }
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Contact server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
