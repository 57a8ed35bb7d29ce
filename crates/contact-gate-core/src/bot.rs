// crates/contact-gate-core/src/bot.rs
// ============================================================================
// Module: Bot-Mitigation Evaluator
// Description: Honeypot, timing, and content heuristics for contact submissions.
// Purpose: Reject automated traffic before any network call is made.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The evaluator is a pure function over a validated submission and the
//! current time. Honeypot hits are reported separately from rejections so the
//! pipeline can answer them with a fake success.
//! Invariants:
//! - Honeypot is checked first and overrides every later outcome.
//! - Timing runs before content; content runs only when enabled.
//! - Content heuristics are never the sole defense; CAPTCHA still follows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::submission::BotReason;
use crate::submission::ContactSubmission;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Default minimum time a human needs to fill the form.
pub const DEFAULT_MIN_FILL_MS: u64 = 2_000;

/// Bot-mitigation policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotPolicy {
    /// Minimum elapsed milliseconds between form start and submission.
    pub min_fill_ms: u64,
    /// Enables the content heuristics layer.
    pub content_filter: bool,
}

impl Default for BotPolicy {
    fn default() -> Self {
        Self {
            min_fill_ms: DEFAULT_MIN_FILL_MS,
            content_filter: true,
        }
    }
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Bot-mitigation verdict for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotVerdict {
    /// No automation signal found.
    Human,
    /// Honeypot filled; answer with a fake success and drop.
    Honeypot,
    /// Automation suspected; reject with the reason and matched signal.
    Suspected {
        /// Rejection reason.
        reason: BotReason,
        /// Internal signal label for logs.
        signal: &'static str,
    },
}

/// Evaluates a validated submission at `now_ms`.
#[must_use]
pub fn evaluate(submission: &ContactSubmission, now_ms: i64, policy: &BotPolicy) -> BotVerdict {
    if submission.honeypot.as_deref().is_some_and(|value| !value.is_empty()) {
        return BotVerdict::Honeypot;
    }
    if let Some(started_at) = submission.started_at_ms
        && is_too_fast(started_at, now_ms, policy.min_fill_ms)
    {
        return BotVerdict::Suspected {
            reason: BotReason::TooFast,
            signal: "elapsed_below_threshold",
        };
    }
    if policy.content_filter {
        let signal = find_spam_signal(&submission.subject)
            .or_else(|| find_spam_signal(&submission.message));
        if let Some(signal) = signal {
            return BotVerdict::Suspected {
                reason: BotReason::SuspiciousContent,
                signal,
            };
        }
    }
    BotVerdict::Human
}

/// Returns true when fewer than `min_fill_ms` elapsed; future starts count as too fast.
fn is_too_fast(started_at_ms: i64, now_ms: i64, min_fill_ms: u64) -> bool {
    let elapsed = i128::from(now_ms) - i128::from(started_at_ms);
    elapsed < i128::from(min_fill_ms)
}

// ============================================================================
// SECTION: Content Heuristics
// ============================================================================

/// Raw link markers matched anywhere.
const URL_MARKERS: &[&str] = &["http://", "https://"];
/// Host prefix matched only at a word start.
const WWW_MARKER: &str = "www.";
/// Markup and script injection markers.
const MARKUP_MARKERS: &[&str] = &["<script", "</script", "javascript:", "<iframe", "<a href"];
/// DOM event handler attributes abused for script injection.
const EVENT_HANDLERS: &[&str] = &[
    "onabort",
    "onafterprint",
    "onanimationstart",
    "onbeforeunload",
    "onblur",
    "onchange",
    "onclick",
    "oncontextmenu",
    "ondblclick",
    "onerror",
    "onfocus",
    "onfocusin",
    "oninput",
    "onkeydown",
    "onkeypress",
    "onkeyup",
    "onload",
    "onmousedown",
    "onmouseenter",
    "onmouseleave",
    "onmousemove",
    "onmouseout",
    "onmouseover",
    "onmouseup",
    "onpageshow",
    "onpointerdown",
    "onpointerover",
    "onreset",
    "onresize",
    "onscroll",
    "onselect",
    "onsubmit",
    "ontoggle",
    "ontouchstart",
    "onunload",
    "onwheel",
];
/// Canonical spam vocabulary.
const SPAM_VOCABULARY: &[&str] = &[
    "viagra",
    "cialis",
    "casino",
    "lottery",
    "bitcoin giveaway",
    "crypto giveaway",
    "free money",
    "click here",
    "seo services",
    "backlinks",
    "buy followers",
    "payday loan",
];

/// Returns the first spam signal found in `text`.
#[must_use]
pub fn find_spam_signal(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    if URL_MARKERS.iter().any(|marker| lowered.contains(marker))
        || word_starts(&lowered, WWW_MARKER).next().is_some()
    {
        return Some("raw_url");
    }
    if MARKUP_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Some("markup");
    }
    if has_inline_event_handler(&lowered) {
        return Some("event_handler");
    }
    if SPAM_VOCABULARY.iter().any(|word| lowered.contains(word)) {
        return Some("spam_vocabulary");
    }
    None
}

/// Detects known handler attributes such as `onerror=` or `onclick =`.
fn has_inline_event_handler(lowered: &str) -> bool {
    EVENT_HANDLERS.iter().any(|handler| {
        word_starts(lowered, handler).any(|start| {
            let rest = &lowered[start + handler.len() ..];
            rest.trim_start_matches([' ', '\t']).starts_with('=')
        })
    })
}

/// Yields byte offsets where `needle` starts a word in `haystack`.
fn word_starts<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).map(|(start, _)| start).filter(move |&start| {
        haystack[.. start].chars().next_back().is_none_or(|prev| !prev.is_alphanumeric())
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::find_spam_signal;
    use super::has_inline_event_handler;
    use super::is_too_fast;

    #[test]
    fn detects_event_handlers_with_word_boundary() {
        assert!(has_inline_event_handler("<img src=x onerror=alert(1)>"));
        assert!(has_inline_event_handler("onclick = steal()"));
        assert!(has_inline_event_handler("<body\tonload\t=x>"));
        assert!(!has_inline_event_handler("let's talk about python = fun"));
        assert!(!has_inline_event_handler("we go on = and on"));
        assert!(!has_inline_event_handler("i think one = two halves of the budget."));
        assert!(!has_inline_event_handler("xonerror=1"));
        assert!(!has_inline_event_handler("the onload handler fired"));
    }

    #[test]
    fn plain_prose_has_no_signal() {
        assert_eq!(find_spam_signal("I would love to collaborate on a project."), None);
        assert_eq!(find_spam_signal("Awww. Thanks for the portfolio, loved it!"), None);
        assert_eq!(find_spam_signal("I think one = two halves of the budget."), None);
    }

    #[test]
    fn www_prefix_needs_a_word_start() {
        assert_eq!(find_spam_signal("see www.example.com"), Some("raw_url"));
        assert_eq!(find_spam_signal("(www.example.com)"), Some("raw_url"));
        assert_eq!(find_spam_signal("www.example.com"), Some("raw_url"));
        assert_eq!(find_spam_signal("Awww. so nice"), None);
    }

    #[test]
    fn timing_threshold_is_exclusive() {
        assert!(is_too_fast(1_000, 2_999, 2_000));
        assert!(!is_too_fast(1_000, 3_000, 2_000));
        assert!(is_too_fast(5_000, 1_000, 2_000));
    }
}
