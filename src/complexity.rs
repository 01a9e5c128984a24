//! Complexity scoring for incoming email text
//!
//! Derives a numeric complexity score from structural features of the text:
//! length, sentence count, question marks, and case-insensitive word-boundary
//! matches against the urgency, technical, and emotional lexicons. The score
//! drives tier selection; it should reflect semantic complexity signals more
//! than raw size, so the length component saturates at a configured cap.
//!
//! Scoring is pure and total: same text always yields the same factors, and
//! no input can make it fail. Whitespace-only input is treated as empty.

use crate::config::ScoringConfig;
use serde::Serialize;
use std::collections::HashSet;

/// Per-factor measurements for one text
///
/// Intermediate record, surfaced to the caller inside the analysis result for
/// transparency. Never persisted by the library itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityFactors {
    /// Character count of the input text
    pub length: usize,
    /// Count of sentence-terminal punctuation groups
    pub sentence_count: usize,
    /// Count of question marks
    pub question_count: usize,
    /// Matches against the urgency/importance lexicon
    pub action_word_count: usize,
    /// Matches against the technical-vocabulary lexicon
    pub technical_term_count: usize,
    /// Matches against the emotional-register lexicon
    pub emotional_intensity: usize,
}

/// Factors plus the aggregate weighted score
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityReport {
    pub factors: ComplexityFactors,
    pub score: f64,
}

/// Deterministic lexicon-based complexity scorer
///
/// Lexicons and weights come from [`ScoringConfig`]; the scorer owns lowercase
/// copies so matching never re-normalizes per request.
#[derive(Debug, Clone)]
pub struct ComplexityScorer {
    length_weight: f64,
    length_cap_chars: usize,
    sentence_weight: f64,
    question_weight: f64,
    action_weight: f64,
    technical_weight: f64,
    emotional_weight: f64,
    action_words: HashSet<String>,
    technical_terms: HashSet<String>,
    emotional_terms: HashSet<String>,
}

impl ComplexityScorer {
    /// Build a scorer from validated scoring configuration
    pub fn new(scoring: &ScoringConfig) -> Self {
        let lowered = |terms: &[String]| -> HashSet<String> {
            terms.iter().map(|t| t.to_lowercase()).collect()
        };

        Self {
            length_weight: scoring.length_weight(),
            length_cap_chars: scoring.length_cap_chars(),
            sentence_weight: scoring.sentence_weight(),
            question_weight: scoring.question_weight(),
            action_weight: scoring.action_weight(),
            technical_weight: scoring.technical_weight(),
            emotional_weight: scoring.emotional_weight(),
            action_words: lowered(scoring.action_words()),
            technical_terms: lowered(scoring.technical_terms()),
            emotional_terms: lowered(scoring.emotional_terms()),
        }
    }

    /// Measure the six complexity factors for a text
    ///
    /// Whitespace-only or empty input produces all-zero factors.
    pub fn measure(&self, text: &str) -> ComplexityFactors {
        if text.trim().is_empty() {
            return ComplexityFactors::default();
        }

        let mut factors = ComplexityFactors {
            length: text.chars().count(),
            question_count: text.chars().filter(|c| *c == '?').count(),
            sentence_count: count_terminator_groups(text),
            ..ComplexityFactors::default()
        };

        // One tokenization pass feeds all three lexicons
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            if self.action_words.contains(word) {
                factors.action_word_count += 1;
            }
            if self.technical_terms.contains(word) {
                factors.technical_term_count += 1;
            }
            if self.emotional_terms.contains(word) {
                factors.emotional_intensity += 1;
            }
        }

        factors
    }

    /// Aggregate factors into the weighted score
    ///
    /// Length contributes only up to the saturation cap so that very long
    /// quoted threads cannot dominate the semantic signals.
    pub fn score(&self, factors: &ComplexityFactors) -> f64 {
        let effective_length = factors.length.min(self.length_cap_chars);

        effective_length as f64 * self.length_weight
            + factors.sentence_count as f64 * self.sentence_weight
            + factors.question_count as f64 * self.question_weight
            + factors.action_word_count as f64 * self.action_weight
            + factors.technical_term_count as f64 * self.technical_weight
            + factors.emotional_intensity as f64 * self.emotional_weight
    }

    /// Measure and score a text in one call
    pub fn report(&self, text: &str) -> ComplexityReport {
        let factors = self.measure(text);
        let score = self.score(&factors);

        tracing::debug!(
            length = factors.length,
            sentence_count = factors.sentence_count,
            question_count = factors.question_count,
            action_word_count = factors.action_word_count,
            technical_term_count = factors.technical_term_count,
            emotional_intensity = factors.emotional_intensity,
            score = score,
            "Computed complexity score"
        );

        ComplexityReport { factors, score }
    }
}

/// Count runs of sentence-terminal punctuation as single terminator groups
///
/// "Wait... what?!" has two groups: "..." and "?!".
fn count_terminator_groups(text: &str) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for c in text.chars() {
        let terminal = matches!(c, '.' | '!' | '?');
        if terminal && !in_group {
            groups += 1;
        }
        in_group = terminal;
    }
    groups
}
