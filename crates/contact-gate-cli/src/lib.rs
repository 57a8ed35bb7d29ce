// crates/contact-gate-cli/src/lib.rs
// ============================================================================
// Module: Contact Gate CLI Library
// Description: Message catalog, form presentation, and the contact client.
// Purpose: Share presentation logic between the binary and its tests.
// Dependencies: async-trait, contact-gate-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Library half of the `contact-gate` binary. It owns user-facing strings, the
//! mapping from contact responses to feedback, managed CAPTCHA token
//! acquisition, and the HTTP client used by `contact-gate submit`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod i18n;
pub mod presentation;
