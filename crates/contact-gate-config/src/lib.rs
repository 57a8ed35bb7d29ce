// crates/contact-gate-config/src/lib.rs
// ============================================================================
// Module: Contact Gate Config Library
// Description: Canonical config model, environment overrides, and validation.
// Purpose: Single source of truth for contact-gate.toml semantics.
// Dependencies: contact-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `contact-gate-config` defines the configuration model for the contact
//! backend. Values come from an optional TOML file, then from environment
//! variables, and are validated fail-closed before use.
//!
//! Security posture: config inputs are untrusted; secrets are redacted from
//! debug output and never serialized back out.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
