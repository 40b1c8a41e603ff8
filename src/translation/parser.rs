/*!
 * Model response parsing.
 *
 * Models are asked to answer one `@@SUB_LINE@@ <n>: <text>` line per input
 * line but drift in practice. Translation answers are read with three
 * grammars, tried in order, and reconciled against the requested IDs by ID
 * first and by position second. Review answers are matched by ID only.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;

/// Marker that prefixes every numbered line in prompts and answers.
pub const LINE_MARKER: &str = "@@SUB_LINE@@";

/// Review answers below this share of requested IDs are discarded.
pub const MIN_REVIEW_COVERAGE: f64 = 0.9;

static MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@SUB_LINE@@\s*(\d+)\s*:\s?(.*)$").unwrap()
});

static LABELLED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^line\s+(\d+)\s*:\s?(.*)$").unwrap()
});

static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*:\s?(.*)$").unwrap()
});

/// One answer line: its ID when a grammar matched, and its text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub id: Option<usize>,
    pub text: String,
}

fn parse_line(line: &str) -> ParsedLine {
    for grammar in [&*MARKER_LINE, &*LABELLED_LINE, &*NUMBERED_LINE] {
        if let Some(caps) = grammar.captures(line) {
            if let Ok(id) = caps[1].parse::<usize>() {
                return ParsedLine {
                    id: Some(id),
                    text: caps[2].trim().to_string(),
                };
            }
        }
    }

    ParsedLine { id: None, text: line.to_string() }
}

fn answer_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
}

/// Parsed translation answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Text per ID; the first occurrence of an ID wins
    pub by_id: HashMap<usize, String>,

    /// Every answer line in order, prefix stripped when a grammar matched
    pub ordered: Vec<String>,
}

impl ParsedResponse {
    /// Parse a raw answer.
    pub fn parse(raw: &str) -> Self {
        let mut parsed = ParsedResponse::default();

        for line in answer_lines(raw) {
            let ParsedLine { id, text } = parse_line(line);
            if let Some(id) = id {
                parsed.by_id.entry(id).or_insert_with(|| text.clone());
            }
            parsed.ordered.push(text);
        }

        parsed
    }

    /// Reconcile against the requested IDs.
    ///
    /// ID match first; otherwise the positional entry when the answer has
    /// exactly one line per request; otherwise unresolved. Empty texts count
    /// as unresolved.
    pub fn resolve(&self, ids: &[usize]) -> Vec<Option<String>> {
        let positional = self.ordered.len() == ids.len();

        ids.iter()
            .enumerate()
            .map(|(position, id)| {
                self.by_id
                    .get(id)
                    .or_else(|| positional.then(|| &self.ordered[position]))
                    .filter(|text| !text.trim().is_empty())
                    .cloned()
            })
            .collect()
    }
}

/// Replace texts that merely echo their source.
///
/// An echoed line takes the last good translation seen earlier in the same
/// list; with none available it becomes unresolved.
pub fn apply_echo_guard(resolved: &mut [Option<String>], sources: &[&str]) -> usize {
    let mut last_good: Option<String> = None;
    let mut replaced = 0;

    for (slot, source) in resolved.iter_mut().zip(sources) {
        let echoed = slot
            .as_deref()
            .is_some_and(|text| text.trim() == source.trim());

        if echoed {
            *slot = last_good.clone();
            replaced += 1;
        } else if let Some(text) = slot.as_ref() {
            last_good = Some(text.clone());
        }
    }

    replaced
}

/// Why a review answer was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewParseError {
    #[error("review answer repeats line {0}")]
    DuplicateId(usize),

    #[error("review answer covers {covered} of {expected} lines")]
    LowCoverage { covered: usize, expected: usize },
}

/// Parse a review answer for the given IDs.
///
/// Any ID-prefixed line counts; bare lines are skipped. IDs outside the
/// request are ignored. A blank text is a deliberate answer and is kept as an
/// empty string.
pub fn parse_review(raw: &str, ids: &[usize]) -> Result<HashMap<usize, String>, ReviewParseError> {
    let requested: HashSet<usize> = ids.iter().copied().collect();
    let mut answers = HashMap::new();

    for line in answer_lines(raw) {
        let ParsedLine { id: Some(id), text } = parse_line(line) else {
            continue;
        };
        if !requested.contains(&id) {
            continue;
        }
        if answers.insert(id, text).is_some() {
            return Err(ReviewParseError::DuplicateId(id));
        }
    }

    let coverage = if ids.is_empty() {
        1.0
    } else {
        answers.len() as f64 / ids.len() as f64
    };

    if coverage < MIN_REVIEW_COVERAGE {
        return Err(ReviewParseError::LowCoverage {
            covered: answers.len(),
            expected: ids.len(),
        });
    }

    Ok(answers)
}
