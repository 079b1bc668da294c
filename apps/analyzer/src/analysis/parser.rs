//! Result Parser: turns the model's free-form reply into an `AnalysisResult`.
//!
//! Total by construction: every input string produces a result. A reply with
//! no usable score degrades to `Score::Unknown` and keeps the full text.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::models::{AnalysisResult, RawModelReply, Score};
use crate::analysis::prompts::SCORE_PATTERN;

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCORE_PATTERN).expect("SCORE_PATTERN is a valid regex"));

/// What the parser saw while building the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    /// Number of `<digits>%` runs in the reply.
    pub percent_runs: usize,
    /// Runs skipped because their value was above 100.
    pub out_of_range_runs: usize,
    /// Characters dropped from the front of the reply to form `suggestions`.
    pub discarded_chars: usize,
}

impl ParseDiagnostics {
    /// More than one percentage in the reply: the trim up to the last `%`
    /// may have dropped content that belonged to the suggestions.
    pub fn is_ambiguous(&self) -> bool {
        self.percent_runs > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub result: AnalysisResult,
    pub diagnostics: ParseDiagnostics,
}

/// Parses a raw reply.
///
/// - score: the first `[0-9]{1,3}%` run whose value is within 0..=100
/// - suggestions: everything after the last `%` in the reply, trimmed, when a
///   score was found; otherwise the untouched reply text
pub fn parse_reply(reply: &RawModelReply) -> ParsedReply {
    let text = reply.text.as_str();

    let runs: Vec<u16> = SCORE_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u16>().ok())
        .collect();

    let mut diagnostics = ParseDiagnostics {
        percent_runs: runs.len(),
        out_of_range_runs: runs.iter().filter(|v| **v > 100).count(),
        discarded_chars: 0,
    };

    let score = runs
        .iter()
        .copied()
        .find(|v| *v <= 100)
        .and_then(|v| u8::try_from(v).ok());

    let result = match score {
        Some(value) => {
            // A run was matched, so the reply holds at least one '%'.
            let cut = text.rfind('%').map(|idx| idx + 1).unwrap_or(0);
            diagnostics.discarded_chars = text[..cut].chars().count();
            AnalysisResult {
                score: Score::Percent(value),
                suggestions: text[cut..].trim().to_string(),
            }
        }
        None => AnalysisResult {
            score: Score::Unknown,
            suggestions: text.to_string(),
        },
    };

    ParsedReply {
        result,
        diagnostics,
    }
}
