// crates/contact-gate-config/src/config.rs
// ============================================================================
// Module: Contact Gate Configuration
// Description: Configuration loading and validation for the contact backend.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: contact-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with environment variables for secrets and addresses.
//! Invalid configuration fails closed. Missing secrets are not configuration
//! errors: the affected stage fails closed at request time instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use contact_gate_core::BotPolicy;
use contact_gate_core::PipelineConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "contact-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CONTACT_GATE_CONFIG";
/// Environment variable carrying the email API key.
pub const EMAIL_API_KEY_ENV: &str = "RESEND_API_KEY";
/// Environment variable carrying the destination address.
pub const CONTACT_TO_ENV: &str = "CONTACT_TO";
/// Environment variable carrying the sender address.
pub const CONTACT_FROM_ENV: &str = "CONTACT_FROM";
/// Environment variable carrying the CAPTCHA secret.
pub const CAPTCHA_SECRET_ENV: &str = "RECAPTCHA_SECRET_KEY";
/// Environment variables carrying the public CAPTCHA site key, in priority order.
pub const CAPTCHA_SITE_KEY_ENVS: &[&str] = &["RECAPTCHA_SITE_KEY", "NEXT_PUBLIC_RECAPTCHA_SITE_KEY"];
/// Environment variable overriding the bind address.
pub const BIND_ENV: &str = "CONTACT_GATE_BIND";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum accepted request body size.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 1024 * 1024;
/// Maximum overall request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Maximum outbound provider timeout in milliseconds.
pub(crate) const MAX_PROVIDER_TIMEOUT_MS: u64 = 60_000;
/// Maximum accepted provider response size.
pub(crate) const MAX_PROVIDER_RESPONSE_BYTES: usize = 1024 * 1024;
/// Default bind address for the HTTP server.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default CAPTCHA verification endpoint.
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
/// Default transactional email endpoint.
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
/// Default destination address.
pub const DEFAULT_CONTACT_TO: &str = "owner@example.com";
/// Default sender address.
pub const DEFAULT_CONTACT_FROM: &str = "Portfolio <onboarding@resend.dev>";
/// Default subject tag prepended to every notification.
pub const DEFAULT_SUBJECT_PREFIX: &str = "Portfolio Contact: ";

// ============================================================================
// SECTION: Secrets
// ============================================================================

/// Secret string redacted from debug output.
///
/// # Invariants
/// - `Debug` never prints the value.
/// - Not serializable; secrets only flow inward.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value for outbound use.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([redacted])")
    }
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Contact Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bot-mitigation configuration.
    #[serde(default)]
    pub bot: BotConfig,
    /// CAPTCHA verification configuration.
    #[serde(default)]
    pub captcha: CaptchaConfig,
    /// Email delivery configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ContactGateConfig {
    /// Loads configuration using the default resolution rules and process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration with an explicit environment lookup.
    ///
    /// An explicit or env-provided path must exist; a missing default file
    /// yields built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path, &lookup)?;
        validate_path(&resolved)?;
        let mut config = if explicit || resolved.exists() {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if bytes.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
            }
            let content = std::str::from_utf8(&bytes)
                .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
            Self::parse(content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML content without applying overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays environment-sourced values; blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = read(EMAIL_API_KEY_ENV) {
            self.email.api_key = Some(SecretString::new(value));
        }
        if let Some(value) = read(CONTACT_TO_ENV) {
            self.email.to = value;
        }
        if let Some(value) = read(CONTACT_FROM_ENV) {
            self.email.from = value;
        }
        if let Some(value) = read(CAPTCHA_SECRET_ENV) {
            self.captcha.secret_key = Some(SecretString::new(value));
        }
        if let Some(value) = CAPTCHA_SITE_KEY_ENVS.iter().find_map(|key| read(key)) {
            self.captcha.site_key = Some(value);
        }
        if let Some(value) = read(BIND_ENV) {
            self.server.bind = value;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.bot.validate()?;
        self.captcha.validate()?;
        self.email.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the pipeline policy derived from this configuration.
    #[must_use]
    pub const fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            bot: BotPolicy {
                min_fill_ms: self.bot.min_fill_ms,
                content_filter: self.bot.content_filter,
            },
            min_captcha_score: self.captcha.min_score,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Overall deadline for one pipeline invocation in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: 16 * 1024,
            request_timeout_ms: 15_000,
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be between 1 and 1048576".to_string(),
            ));
        }
        validate_timeout("server.request_timeout_ms", self.request_timeout_ms, MAX_REQUEST_TIMEOUT_MS)
    }
}

/// Bot-mitigation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Minimum fill time in milliseconds.
    pub min_fill_ms: u64,
    /// Enables content heuristics.
    pub content_filter: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        let policy = BotPolicy::default();
        Self {
            min_fill_ms: policy.min_fill_ms,
            content_filter: policy.content_filter,
        }
    }
}

impl BotConfig {
    /// Validates bot settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_fill_ms > 600_000 {
            return Err(ConfigError::Invalid("bot.min_fill_ms must be at most 600000".to_string()));
        }
        Ok(())
    }
}

/// CAPTCHA strategy selected for a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptchaMode {
    /// Plain answer checked for presence; the challenge lives in the UI.
    ChallengeAnswer,
    /// Provider token verified server-to-server.
    #[default]
    ManagedToken,
}

impl CaptchaMode {
    /// Returns the canonical mode label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChallengeAnswer => "challenge_answer",
            Self::ManagedToken => "managed_token",
        }
    }
}

/// CAPTCHA verification configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptchaConfig {
    /// Strategy for this deployment.
    pub mode: CaptchaMode,
    /// Verification endpoint (managed-token mode).
    pub verify_url: String,
    /// Server-held secret (managed-token mode).
    pub secret_key: Option<SecretString>,
    /// Public site key for the client widget.
    pub site_key: Option<String>,
    /// Minimum confidence required.
    pub min_score: f64,
    /// Expected widget action label.
    pub action: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum verification response size in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP verification endpoints.
    pub allow_http: bool,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            mode: CaptchaMode::default(),
            verify_url: DEFAULT_CAPTCHA_VERIFY_URL.to_string(),
            secret_key: None,
            site_key: None,
            min_score: PipelineConfig::default().min_captcha_score,
            action: Some("contact".to_string()),
            timeout_ms: 5_000,
            max_response_bytes: 64 * 1024,
            allow_http: false,
        }
    }
}

impl CaptchaConfig {
    /// Returns the secret when configured and non-blank.
    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret_key.as_ref().filter(|secret| !secret.is_blank())
    }

    /// Validates CAPTCHA settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_score.is_finite() || !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::Invalid("captcha.min_score must be within [0, 1]".to_string()));
        }
        validate_endpoint("captcha.verify_url", &self.verify_url, self.allow_http)?;
        validate_timeout("captcha.timeout_ms", self.timeout_ms, MAX_PROVIDER_TIMEOUT_MS)?;
        validate_response_limit("captcha.max_response_bytes", self.max_response_bytes)?;
        if let Some(action) = &self.action
            && action.trim().is_empty()
        {
            return Err(ConfigError::Invalid("captcha.action must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Email delivery configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailConfig {
    /// Transactional email API endpoint.
    pub api_url: String,
    /// API key for the email provider.
    pub api_key: Option<SecretString>,
    /// Destination address.
    pub to: String,
    /// Sender address (may include a display name).
    pub from: String,
    /// Tag prepended to every subject.
    pub subject_prefix: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum provider response size in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP API endpoints.
    pub allow_http: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_EMAIL_API_URL.to_string(),
            api_key: None,
            to: DEFAULT_CONTACT_TO.to_string(),
            from: DEFAULT_CONTACT_FROM.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            timeout_ms: 10_000,
            max_response_bytes: 64 * 1024,
            allow_http: false,
        }
    }
}

impl EmailConfig {
    /// Returns the API key when configured and non-blank.
    #[must_use]
    pub fn key(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|key| !key.is_blank())
    }

    /// Validates email settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("email.api_url", &self.api_url, self.allow_http)?;
        if !self.to.contains('@') || self.to.trim().len() != self.to.len() {
            return Err(ConfigError::Invalid("email.to must be a bare email address".to_string()));
        }
        if !self.from.contains('@') {
            return Err(ConfigError::Invalid("email.from must contain an address".to_string()));
        }
        validate_timeout("email.timeout_ms", self.timeout_ms, MAX_PROVIDER_TIMEOUT_MS)?;
        validate_response_limit("email.max_response_bytes", self.max_response_bytes)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink type.
    pub sink: AuditSinkType,
    /// Log file path for the file sink.
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path(path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it was requested explicitly.
fn resolve_path(
    path: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates a path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates an outbound endpoint URL against scheme policy.
fn validate_endpoint(field: &str, value: &str, allow_http: bool) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|_| ConfigError::Invalid(format!("{field} is not a valid url")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(ConfigError::Invalid(format!("{field} uses http:// without allow_http")));
        }
        _ => return Err(ConfigError::Invalid(format!("{field} must use https"))),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{field} requires a host")));
    }
    Ok(())
}

/// Validates a timeout within `(0, max]`.
fn validate_timeout(field: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {max}")));
    }
    Ok(())
}

/// Validates a provider response size limit.
fn validate_response_limit(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_PROVIDER_RESPONSE_BYTES {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_PROVIDER_RESPONSE_BYTES}"
        )));
    }
    Ok(())
}
