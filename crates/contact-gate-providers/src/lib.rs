// crates/contact-gate-providers/src/lib.rs
// ============================================================================
// Module: Contact Gate Providers
// Description: Network-backed CAPTCHA verification and email dispatch.
// Purpose: Implement the core provider traits over bounded HTTP calls.
// Dependencies: contact-gate-config, contact-gate-core, reqwest, serde, url
// ============================================================================

//! ## Overview
//! This crate supplies the concrete [`contact_gate_core::CaptchaVerifier`] and
//! [`contact_gate_core::EmailDispatcher`] implementations used in production.
//! Every outbound call is time-bounded, does not follow redirects, and reads
//! at most a configured number of response bytes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod captcha;
pub mod email;
pub mod http;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use captcha::ChallengeAnswerVerifier;
pub use captcha::ManagedTokenVerifier;
pub use captcha::verifier_from_config;
pub use email::EmailRouting;
pub use email::OutboundEmail;
pub use email::ResendDispatcher;
pub use email::compose_email;
pub use email::html_escape;
pub use http::HttpFailure;
pub use http::HttpPolicy;
