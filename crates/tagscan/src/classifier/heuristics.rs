//! Line and chunk level predicates used by the classifier.
//!
//! These are tuned for title blocks and equipment schedules of engineering
//! drawings, where OCR output mixes identifiers with boilerplate prose.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum length (in characters) of a line, chunk or emitted value.
pub const MIN_VALUE_CHARS: usize = 2;

/// Lines longer than this are candidates for header rejection.
const HEADER_LINE_MIN_CHARS: usize = 60;

/// Equipment descriptions longer than this are treated as prose.
pub const MAX_EQUIPMENT_CHARS: usize = 100;

const HEADER_INDICATORS: &[&str] = &[
    "DRAWING", "TITLE", "REVISION", "SHEET", "SCALE", "PROJECT", "CHECKED", "APPROVED",
];

/// Articles, prepositions, modal verbs and relative pronouns.
const PHRASE_WORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "at", "to", "for", "with", "by", "from", "into", "onto",
    "over", "under", "between", "through", "shall", "should", "must", "will", "would", "may",
    "might", "can", "could", "which", "that", "who", "whom", "whose", "where",
];

/// Words that are never identifiers even when a permissive rule matches them.
const NOISE_WORDS: &[&str] = &[
    "AND", "OR", "NOR", "BUT", "YET", "SO", "THE", "NOT", "FOR", "WITH", "SEE", "NOTE", "NA",
    "N/A",
];

static RE_CHUNK_DELIMITERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\||:|\bAPPLICATION\b|\bCOOLING METHOD\b|\s{2,}| - ").unwrap()
});
static RE_PAGE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\s+of\s+\d+$").unwrap());
static RE_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^page\s+\d+$").unwrap());
static RE_PURE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)*$").unwrap());
static RE_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{3,}").unwrap());
static RE_STRONG_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,5}-[A-Z0-9]{2,15}-\d{3,}\b").unwrap());

/// Why a whole line was dropped before chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRejection {
    TooShort,
    Header,
    RejectKeyword,
}

/// Collapses whitespace runs to single spaces and trims.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits raw page text into lines, dropping blank ones.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r']).filter(|line| !line.trim().is_empty())
}

/// Decides whether a normalized line is dropped entirely.
///
/// `has_reject_keyword` is evaluated lazily so the caller can keep keyword
/// matching in the rule set.
pub fn reject_line(
    line: &str,
    has_reject_keyword: impl FnOnce(&str) -> bool,
) -> Option<LineRejection> {
    if char_len(line) < MIN_VALUE_CHARS {
        return Some(LineRejection::TooShort);
    }

    let rejection = if is_header_line(line) {
        Some(LineRejection::Header)
    } else if has_reject_keyword(line) {
        Some(LineRejection::RejectKeyword)
    } else {
        None
    };

    match rejection {
        Some(_) if looks_like_strong_identifier(line) => None,
        other => other,
    }
}

fn is_header_line(line: &str) -> bool {
    if char_len(line) <= HEADER_LINE_MIN_CHARS || RE_DIGIT_RUN.is_match(line) {
        return false;
    }
    let upper = line.to_uppercase();
    HEADER_INDICATORS
        .iter()
        .any(|indicator| upper.contains(indicator))
}

pub fn looks_like_strong_identifier(text: &str) -> bool {
    RE_STRONG_IDENTIFIER.is_match(text)
}

/// Splits a raw (not yet normalized) line into normalized, non-empty chunks.
///
/// The raw line is used because runs of two or more spaces are themselves a
/// delimiter.
pub fn split_chunks(raw_line: &str) -> Vec<String> {
    RE_CHUNK_DELIMITERS
        .split(raw_line)
        .map(normalize)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

pub fn is_page_reference(chunk: &str) -> bool {
    RE_PAGE_OF.is_match(chunk) || RE_PAGE_NUMBER.is_match(chunk)
}

pub fn is_pure_number(chunk: &str) -> bool {
    RE_PURE_NUMBER.is_match(chunk)
}

/// True when any whitespace-separated word is a stop word or modal.
pub fn looks_like_phrase(chunk: &str) -> bool {
    chunk.split_whitespace().any(|word| {
        let word = word.trim_matches(is_word_punctuation).to_lowercase();
        PHRASE_WORDS.contains(&word.as_str())
    })
}

fn is_word_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | '!' | '?' | '(' | ')' | '"' | '\'')
}

/// Chunks that are never classified.
pub fn discard_chunk(chunk: &str) -> bool {
    char_len(chunk) < MIN_VALUE_CHARS
        || is_page_reference(chunk)
        || is_pure_number(chunk)
        || looks_like_phrase(chunk)
}

pub fn is_noise_word(value: &str) -> bool {
    let upper = value.to_uppercase();
    NOISE_WORDS.contains(&upper.as_str())
}

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}
