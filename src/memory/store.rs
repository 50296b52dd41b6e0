//! Flat-file persistence for the transcript and the summary log.
//!
//! The transcript file holds the preamble line followed by one
//! `Role: content` line per un-summarized turn. The memory file holds one
//! summary per line and is only ever appended to.

use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;

use super::transcript::Turn;

/// Read summaries, one per non-empty line. A missing file yields none.
pub async fn load_summaries(path: &Path) -> io::Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Read turns left in a transcript file, skipping the preamble line.
pub async fn load_turns(path: &Path, preamble: &str) -> io::Result<Vec<Turn>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let preamble = preamble.trim();
    let mut turns = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() || (!preamble.is_empty() && line.trim() == preamble) {
            continue;
        }
        match Turn::from_line(line) {
            Some(turn) => turns.push(turn),
            None => tracing::debug!(path = %path.display(), "skipping unrecognized transcript line"),
        }
    }
    Ok(turns)
}

/// Replace the transcript file with the preamble and `turns`.
pub async fn rewrite_transcript(path: &Path, preamble: &str, turns: &[Turn]) -> io::Result<()> {
    ensure_parent(path).await?;
    let mut contents = String::new();
    if !preamble.is_empty() {
        contents.push_str(preamble);
        contents.push('\n');
    }
    for turn in turns {
        contents.push_str(&turn.to_line());
        contents.push('\n');
    }
    tokio::fs::write(path, contents).await
}

pub async fn append_turn(path: &Path, turn: &Turn) -> io::Result<()> {
    append_line(path, &turn.to_line()).await
}

/// Append one summary. Embedded newlines are flattened to keep one per line.
pub async fn append_summary(path: &Path, summary: &str) -> io::Result<()> {
    let flattened = summary.lines().map(str::trim).collect::<Vec<_>>().join(" ");
    append_line(path, flattened.trim()).await
}

async fn append_line(path: &Path, line: &str) -> io::Result<()> {
    ensure_parent(path).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
