//! Deterministic text cleanup at both ends of the pipeline.
//!
//! * [`clean_document_text`] runs once on ingested text, before any line is
//!   classified: line endings become `\n`, PDF page breaks become line
//!   breaks, and invisible characters that would defeat the line patterns
//!   are removed.
//! * [`normalize_paragraph_text`] runs once on each assembled paragraph:
//!   strip the number marker, collapse whitespace, trim.
//!
//! Each rule is a small pure function so it can be tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prepare raw extracted text for line classification.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Turn form feeds (PDF page breaks) into line breaks
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Replace no-break spaces with ordinary spaces
pub fn clean_document_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = s.replace('\u{000C}', "\n");
    let s = remove_invisible_chars(&s);
    s.replace(['\u{00A0}', '\u{202F}'], " ")
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Paragraph text ───────────────────────────────────────────────────────

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Final form of an assembled paragraph: the leading `<number>.` marker and
/// any whitespace after it are removed, whitespace runs collapse to one
/// space, and the result is trimmed.
pub fn normalize_paragraph_text(text: &str, number: u32) -> String {
    let text = text.trim_start();
    let marker = format!("{number}.");
    let body = text.strip_prefix(marker.as_str()).unwrap_or(text);
    RE_WHITESPACE_RUN
        .replace_all(body, " ")
        .trim()
        .to_string()
}
