//! Paragraph assembler: rebuild one numbered paragraph from cleaned lines.
//!
//! Starting at the first line that opens paragraph `n`, following lines are
//! joined until a boundary:
//!
//! * a line opening another *recognised* paragraph number,
//! * a section or subsection heading.
//!
//! Citation lines and footnote lines are skipped without ending the
//! paragraph, as is any page furniture that survived the noise filter. With
//! footnote recovery on, the capitalised lines directly after a footnote are
//! treated as part of it and skipped too, until a line that plainly resumes
//! the interrupted sentence (lowercase start, connector word, enumerator).

use crate::output::ParagraphRecord;
use crate::pipeline::classify::{paragraph_start_number, LineClassifier, LineKind};
use crate::pipeline::noise::LineRecord;
use crate::pipeline::normalize::normalize_paragraph_text;
use crate::pipeline::registry::ParagraphNumbers;

/// Assembles paragraphs from one document's cleaned lines.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    lines: &'a [LineRecord<'a>],
    valid: &'a ParagraphNumbers,
    classifier: &'a LineClassifier,
    footnote_recovery: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(
        lines: &'a [LineRecord<'a>],
        valid: &'a ParagraphNumbers,
        classifier: &'a LineClassifier,
        footnote_recovery: bool,
    ) -> Self {
        Self {
            lines,
            valid,
            classifier,
            footnote_recovery,
        }
    }

    /// Rebuild paragraph `number`, or `None` when no line opens it.
    ///
    /// When several lines open the same number, the first one in document
    /// order is used.
    pub fn assemble(&self, number: u32) -> Option<ParagraphRecord> {
        let marker = format!("{number}.");
        let start = self
            .lines
            .iter()
            .position(|line| line.trimmed().starts_with(marker.as_str()))?;

        let mut text = String::from(self.lines[start].trimmed());
        let mut in_footnote = false;

        for line in &self.lines[start + 1..] {
            let trimmed = line.trimmed();

            if paragraph_start_number(trimmed).is_some_and(|m| self.valid.contains(m)) {
                break;
            }

            match line.kind(self.classifier) {
                kind if kind.is_heading() => break,
                LineKind::FootnoteStart => {
                    in_footnote = self.footnote_recovery;
                    continue;
                }
                LineKind::Citation => continue,
                kind if kind.is_noise() => continue,
                LineKind::Continuation { soft: false } if in_footnote => continue,
                _ => {}
            }

            in_footnote = false;
            append_line(&mut text, trimmed);
        }

        Some(ParagraphRecord {
            number,
            text: normalize_paragraph_text(&text, number),
        })
    }
}

/// Join `line` onto `acc` with a single space, or none before a comma.
fn append_line(acc: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    let needs_space =
        !acc.is_empty() && !acc.ends_with(char::is_whitespace) && !line.starts_with(',');
    if needs_space {
        acc.push(' ');
    }
    acc.push_str(line);
}
