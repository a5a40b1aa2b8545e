//! Deterministic response scoring
//!
//! Pure function over `(response_text, elapsed_time, timeout)`. Same inputs
//! always produce the same score - no randomness, no external state - so the
//! winner of a request is reproducible from its recorded task data.
//!
//! Weights: content 0.40, speed 0.30, coherence 0.30.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum points awarded for content (weight 0.40)
pub const CONTENT_MAX: f64 = 40.0;
/// Maximum points awarded for speed (weight 0.30)
pub const SPEED_MAX: f64 = 30.0;
/// Maximum points awarded for coherence (weight 0.30)
pub const COHERENCE_MAX: f64 = 30.0;

/// Word count at which a response earns full content credit
const TARGET_WORDS: usize = 40;

/// Fraction of the timeout at or below which a response earns full speed credit
const FAST_REFERENCE_FRACTION: f64 = 0.1;

/// Acceptable average sentence length band, in words
const SENTENCE_WORDS_LO: f64 = 8.0;
const SENTENCE_WORDS_HI: f64 = 30.0;

/// A single unterminated chunk longer than this is treated as a run-on
const RUN_ON_WORDS: usize = 30;

/// Share of coherence points carried by the sentence-length heuristic;
/// the rest is split between terminal punctuation and paragraph structure.
const COHERENCE_LENGTH_MAX: f64 = 18.0;
const COHERENCE_PUNCT_MAX: f64 = 6.0;
const COHERENCE_PARAGRAPH_MAX: f64 = 6.0;

/// Per-component scores; each in `[0, weight * 100]`, rounding to the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub content_score: f64,
    pub speed_score: f64,
    pub coherence_score: f64,
}

impl ScoreBreakdown {
    /// Final score: rounded sum of the components, clamped to [0, 100]
    pub fn total(&self) -> u8 {
        let sum = self.content_score + self.speed_score + self.coherence_score;
        sum.round().clamp(0.0, 100.0) as u8
    }
}

/// Score a response against the configured timeout.
///
/// Returns the final score in [0, 100] together with its breakdown.
pub fn score(response_text: &str, elapsed_time: Duration, timeout: Duration) -> (u8, ScoreBreakdown) {
    let breakdown = ScoreBreakdown {
        content_score: content_score(response_text),
        speed_score: speed_score(elapsed_time, timeout),
        coherence_score: coherence_score(response_text),
    };
    (breakdown.total(), breakdown)
}

/// Word count normalized against the target band, capped at full credit.
///
/// Responses below [`TARGET_WORDS`] earn proportionally reduced credit;
/// extremely long responses gain nothing beyond the cap.
fn content_score(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    CONTENT_MAX * (words as f64 / TARGET_WORDS as f64).min(1.0)
}

/// Linear credit between the fast-reference latency (full) and the timeout (zero)
fn speed_score(elapsed: Duration, timeout: Duration) -> f64 {
    if timeout.is_zero() {
        return 0.0;
    }
    let timeout_s = timeout.as_secs_f64();
    let fast_s = timeout_s * FAST_REFERENCE_FRACTION;
    let elapsed_s = elapsed.as_secs_f64();

    if elapsed_s <= fast_s {
        SPEED_MAX
    } else if elapsed_s >= timeout_s {
        0.0
    } else {
        SPEED_MAX * (timeout_s - elapsed_s) / (timeout_s - fast_s)
    }
}

/// Sentence-structure heuristic.
///
/// Average sentence length within the acceptable band earns the full length
/// component; terminal punctuation and paragraph structure each contribute a
/// smaller share. Degenerate input (empty, or one long unterminated run-on)
/// earns zero.
fn coherence_score(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let words = trimmed.split_whitespace().count();
    let sentence_count = trimmed
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let ends_terminated = trimmed.ends_with(['.', '!', '?']);

    if sentence_count <= 1 && !ends_terminated && words > RUN_ON_WORDS {
        return 0.0;
    }

    let avg_len = words as f64 / sentence_count.max(1) as f64;
    let length = if (SENTENCE_WORDS_LO..=SENTENCE_WORDS_HI).contains(&avg_len) {
        COHERENCE_LENGTH_MAX
    } else if avg_len < SENTENCE_WORDS_LO {
        COHERENCE_LENGTH_MAX * avg_len / SENTENCE_WORDS_LO
    } else {
        COHERENCE_LENGTH_MAX * SENTENCE_WORDS_HI / avg_len
    };

    let punctuation = if ends_terminated { COHERENCE_PUNCT_MAX } else { 0.0 };

    let paragraphs = if trimmed.contains("\n\n") || sentence_count >= 3 {
        COHERENCE_PARAGRAPH_MAX
    } else {
        0.0
    };

    length + punctuation + paragraphs
}
