// crates/contact-gate-server/src/lib.rs
// ============================================================================
// Module: Contact Gate Server
// Description: HTTP surface for the contact submission pipeline.
// Purpose: Expose submission, schema, and CAPTCHA settings endpoints.
// Dependencies: axum, contact-gate-config, contact-gate-core, contact-gate-providers
// ============================================================================

//! ## Overview
//! The server is the trusted boundary: it re-validates every submission
//! regardless of what the presentation layer already checked, and it is the
//! only place that holds the CAPTCHA secret and the email API key.
//! Security posture: request bodies are untrusted and size-limited.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use routes::AppState;
pub use routes::CAPTCHA_CONFIG_PATH;
pub use routes::CONTACT_PATH;
pub use routes::CaptchaDescriptor;
pub use routes::SCHEMA_PATH;
pub use routes::router;
pub use server::ContactServer;
pub use server::ServerError;
pub use server::build_audit_sink;
