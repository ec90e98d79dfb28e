//! Parsing and formatting of `osascript` output.

use std::sync::LazyLock;

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, HeadingStyle, Options};
use regex::Regex;
use tracing::warn;

use super::script::{DELIM, NOT_FOUND};

/// Three or more line breaks, ignoring whitespace-only lines in between.
///
/// Trailing spaces on the line before a run are consumed too, so a
/// Markdown hard break (`"  \n"`) directly ahead of a gap is dropped.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[ \t]*\n){3,}").expect("valid blank-line regex"));

/// One note as listed by the Notes application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub title: String,
    pub folder: String,
    pub modified: String,
    pub locked: bool,
}

impl NoteSummary {
    /// Parse a single `title|||folder|||modified[|||locked]` line.
    ///
    /// Returns `None` for lines with fewer than three fields.
    pub fn from_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(DELIM).collect();
        if parts.len() < 3 {
            return None;
        }
        Some(Self {
            title: parts[0].to_string(),
            folder: parts[1].to_string(),
            modified: parts[2].to_string(),
            locked: parts.get(3).is_some_and(|tag| *tag == "locked"),
        })
    }
}

/// Format the `", "`-joined folder names as a bullet list.
pub fn parse_folders(raw: &str) -> String {
    if raw.is_empty() {
        return "No folders found.".to_string();
    }
    raw.split(", ")
        .map(|folder| format!("- {}", folder.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split raw note listing output into summaries, dropping malformed lines.
pub fn parse_note_lines(raw: &str) -> Vec<NoteSummary> {
    raw.trim()
        .split('\n')
        .filter_map(NoteSummary::from_line)
        .collect()
}

/// Render note summaries one per line.
pub fn format_notes(notes: &[NoteSummary]) -> String {
    if notes.is_empty() {
        return "No notes found.".to_string();
    }
    notes
        .iter()
        .map(|note| {
            let suffix = if note.locked { " (locked)" } else { "" };
            format!(
                "- {}  [folder: {}, modified: {}]{}",
                note.title, note.folder, note.modified, suffix
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_notes(raw: &str) -> String {
    format_notes(&parse_note_lines(raw))
}

/// Turn the raw body of a note into Markdown, or the not-found message.
pub fn parse_note_content(raw: &str, title: &str) -> String {
    if raw == NOT_FOUND {
        return format!("Note \"{}\" not found or is password-protected.", title);
    }
    html_to_markdown(raw)
}

/// Convert note HTML to Markdown with ATX headings and `-` bullets.
///
/// Runs of three or more blank lines collapse to a single blank line and the
/// result is trimmed.
pub fn html_to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .build();

    let markdown = match converter.convert(html) {
        Ok(md) => md,
        Err(e) => {
            warn!("HTML conversion failed, returning raw body: {}", e);
            html.to_string()
        }
    };

    collapse_blank_lines(&markdown)
}

/// Replace every run of 3+ line breaks with exactly two and trim.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").trim().to_string()
}
