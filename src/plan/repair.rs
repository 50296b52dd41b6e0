//! Tolerant JSON parsing for model output.
//!
//! A strict parse is attempted first. Each repair step then rewrites the
//! text (cumulatively) and the parse is retried after every step, so a
//! well-formed payload never passes through any repair.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Result of a tolerant parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    /// No step produced an acceptable value; carries the original text.
    Unparsed(String),
}

impl<T> ParseOutcome<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Unparsed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

type RepairStep = fn(&str) -> String;

const REPAIR_STEPS: &[(&str, RepairStep)] = &[
    ("strip_code_fences", strip_code_fences),
    ("normalize_quotes", normalize_quotes),
    ("strip_non_printable", strip_non_printable),
    ("strip_stray_separators", strip_stray_separators),
    ("normalize_line_endings", normalize_line_endings),
    ("extract_outermost_object", extract_outermost_object),
];

/// Parse `raw` as JSON, repairing common model formatting mistakes.
///
/// `accept` decides whether a syntactically valid value is the expected
/// shape. A value it rejects counts as a failed attempt.
pub fn parse_tolerant<T, F>(raw: &str, accept: F) -> ParseOutcome<T>
where
    F: Fn(Value) -> Option<T>,
{
    if let Some(parsed) = try_parse(raw, &accept) {
        return ParseOutcome::Parsed(parsed);
    }

    let mut text = raw.to_string();
    for (name, step) in REPAIR_STEPS {
        let repaired = step(&text);
        if repaired == text {
            continue;
        }
        text = repaired;
        if let Some(parsed) = try_parse(&text, &accept) {
            tracing::debug!(step = name, "parsed model output after repair");
            return ParseOutcome::Parsed(parsed);
        }
    }

    ParseOutcome::Unparsed(raw.to_string())
}

fn try_parse<T, F>(text: &str, accept: &F) -> Option<T>
where
    F: Fn(Value) -> Option<T>,
{
    serde_json::from_str::<Value>(text.trim()).ok().and_then(accept)
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```")
            .expect("code fence regex must compile")
    })
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r",(\s*[}\]])").expect("trailing comma regex must compile")
    })
}

pub fn strip_code_fences(text: &str) -> String {
    match fence_regex().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => text.to_string(),
    }
}

/// Replace typographic quotes with their ASCII forms.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

/// Drop control and zero-width characters, keeping ordinary whitespace.
pub fn strip_non_printable(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\n' | '\r' | '\t')
                || !(c.is_control() || matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        })
        .collect()
}

/// Remove trailing commas before `}`/`]` and separators around the payload.
pub fn strip_stray_separators(text: &str) -> String {
    let without_trailing = trailing_comma_regex().replace_all(text, "$1");
    without_trailing
        .trim()
        .trim_matches(|c| c == ',' || c == ';')
        .trim()
        .to_string()
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Keep the span from the first `{` to the last `}`.
pub fn extract_outermost_object(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}
