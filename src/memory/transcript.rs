//! Transcript turns, their on-disk line format and the trimming policy.

use std::str::FromStr;

use crate::types::Role;

/// One role-tagged turn of the live transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// `Role: content` with newlines escaped, one turn per line.
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.role, escape(&self.content))
    }

    /// Parse a line written by [`Turn::to_line`].
    pub fn from_line(line: &str) -> Option<Self> {
        let (role, content) = line.split_once(": ")?;
        let role = Role::from_str(role.trim()).ok()?;
        Some(Self::new(role, unescape(content)))
    }
}

fn escape(content: &str) -> String {
    content.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Render turns as the prompt transcript: each turn starts a new line.
pub fn render(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("\n{}: {}", t.role, t.content))
        .collect()
}

const USER_BOUNDARY: &str = "\nUser:";
const ELLIPSIS: &str = "... ";

/// Fit `history` into `history_offset - intro_len` bytes.
///
/// History that fits is returned unchanged. Otherwise the earliest user-turn
/// boundary (from the second one on) whose remainder fits within the budget
/// plus `prompt_allowance` is used, prefixed with `... `. When no boundary
/// fits, the longest tail that fits the budget is kept, without the ellipsis
/// when the ellipsis alone would overflow the limit.
pub fn trim_history(
    history: &str,
    intro_len: usize,
    history_offset: usize,
    prompt_allowance: usize,
) -> String {
    let available = history_offset.saturating_sub(intro_len);
    if history.len() <= available {
        return history.to_string();
    }

    let limit = available + prompt_allowance;
    let cut = history
        .match_indices(USER_BOUNDARY)
        .skip(1)
        .map(|(index, _)| index)
        .find(|&index| ELLIPSIS.len() + history.len() - index <= limit);
    if let Some(index) = cut {
        return format!("{ELLIPSIS}{}", &history[index..]);
    }

    if limit < ELLIPSIS.len() {
        return tail(history, available).to_string();
    }
    format!("{ELLIPSIS}{}", tail(history, available.saturating_sub(ELLIPSIS.len())))
}

/// Longest suffix of `text` no longer than `max_len` bytes.
fn tail(text: &str, max_len: usize) -> &str {
    let mut start = text.len().saturating_sub(max_len);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
