//! Noise filter: remove page furniture and footnote blocks.
//!
//! Two passes over the document's lines, neither of which mutates the input:
//!
//! 1. **Footnote blocks.** A separator rule (`_____`) opens a block of
//!    footnotes. The block runs until the next page number (which is removed
//!    with it) or the next line opening with `<n>.` (which is kept, whatever
//!    else it contains). Footnotes read `<n> Text`, without the period, so
//!    they never end a block. A separator with no terminator removes
//!    everything to the end of the document.
//! 2. **Furniture.** Page numbers, stand-alone document codes, format
//!    markers, lines containing an underscore, and blank lines are dropped.
//!    Body lines that merely mention a document code are kept.
//!
//! The surviving lines keep their original order and their index in the
//! source text, which makes debug output easy to map back.

use crate::pipeline::classify::{paragraph_start_number, LineClassifier, LineKind};
use tracing::debug;

/// One line of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord<'a> {
    /// 0-based line index in the source text.
    pub index: usize,
    pub raw: &'a str,
}

impl<'a> LineRecord<'a> {
    pub fn trimmed(&self) -> &'a str {
        self.raw.trim()
    }

    /// Kind of the line as body text; see [`LineClassifier::body_kind`].
    pub fn kind(&self, classifier: &LineClassifier) -> LineKind {
        classifier.body_kind(self.raw)
    }
}

/// Run both passes and return the cleaned lines.
pub fn filter_noise<'a>(text: &'a str, classifier: &LineClassifier) -> Vec<LineRecord<'a>> {
    let lines: Vec<&str> = text.lines().collect();
    let keep = footnote_mask(&lines, classifier);

    let cleaned: Vec<LineRecord<'a>> = lines
        .iter()
        .enumerate()
        .filter(|(index, _)| keep[*index])
        .map(|(index, raw)| LineRecord { index, raw })
        .filter(|record| !is_furniture(record, classifier))
        .collect();

    debug!(
        "Noise filter kept {} of {} lines",
        cleaned.len(),
        lines.len()
    );
    cleaned
}

// ── Pass 1: footnote blocks ──────────────────────────────────────────────

/// Where a footnote block ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    /// A page number; removed along with the block.
    PageNumber(usize),
    /// A new numbered paragraph; kept.
    ParagraphStart(usize),
}

/// `keep[i]` is false for every line inside a footnote block.
fn footnote_mask(lines: &[&str], classifier: &LineClassifier) -> Vec<bool> {
    let mut keep = vec![true; lines.len()];
    let mut i = 0;

    while i < lines.len() {
        if !classifier.is_separator(lines[i].trim()) {
            i += 1;
            continue;
        }

        let end = match find_terminator(lines, i + 1, classifier) {
            Some(Terminator::PageNumber(j)) => j + 1,
            Some(Terminator::ParagraphStart(j)) => j,
            None => lines.len(),
        };
        debug!("Removing footnote block: lines {}..{}", i, end);
        keep[i..end].fill(false);
        i = end;
    }

    keep
}

fn find_terminator(lines: &[&str], from: usize, classifier: &LineClassifier) -> Option<Terminator> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(j, line)| {
            // By shape only: a paragraph citing `(2007)` or `A/HRC/` still
            // opens with `<n>.`.
            if paragraph_start_number(line).is_some() {
                Some(Terminator::ParagraphStart(j))
            } else if classifier.classify(line) == LineKind::PageNumber {
                Some(Terminator::PageNumber(j))
            } else {
                None
            }
        })
}

// ── Pass 2: page furniture ───────────────────────────────────────────────

fn is_furniture(record: &LineRecord<'_>, classifier: &LineClassifier) -> bool {
    record.trimmed().contains('_') || record.kind(classifier).is_noise()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaned(text: &str) -> Vec<&str> {
        filter_noise(text, &LineClassifier::default())
            .iter()
            .map(|r| r.trimmed())
            .collect()
    }

    #[test]
    fn drops_document_codes_and_blanks() {
        let text = "1. Primera oración.\n\n08-63561\n2. Segunda.";
        assert_eq!(cleaned(text), vec!["1. Primera oración.", "2. Segunda."]);
    }

    #[test]
    fn keeps_lines_that_mention_a_document_code() {
        let text = "\
1. El Consejo examinó el documento
GE.08-63561 en su período de sesiones.
GE.08-63561 (S)
2. El informe 08-63561 fue
aprobado.";
        assert_eq!(
            cleaned(text),
            vec![
                "1. El Consejo examinó el documento",
                "GE.08-63561 en su período de sesiones.",
                "2. El informe 08-63561 fue",
                "aprobado.",
            ]
        );
    }

    #[test]
    fn drops_page_numbers_and_format_markers() {
        let text = "1. Text\n-4-\n(S)\n17\nmore text";
        assert_eq!(cleaned(text), vec!["1. Text", "more text"]);
    }

    #[test]
    fn footnote_block_closed_by_page_number_is_removed() {
        let text = "\
1. First paragraph
continues here.
__________________
12 See A/HRC/7/23.
13 Human Rights Council resolution 7/23.
-4-
that continues after the page.
2. Second paragraph.";
        assert_eq!(
            cleaned(text),
            vec![
                "1. First paragraph",
                "continues here.",
                "that continues after the page.",
                "2. Second paragraph.",
            ]
        );
    }

    #[test]
    fn footnote_block_closed_by_paragraph_keeps_the_paragraph() {
        let text = "\
1. First.
____________
3 Human Rights Council resolution.
and its annex.
2. Second.";
        assert_eq!(cleaned(text), vec!["1. First.", "2. Second."]);
    }

    #[test]
    fn any_numbered_line_ends_a_block() {
        let text = "\
1. First.
______
4. See the report of the Secretary-General.
-5-
2. Second.";
        assert_eq!(
            cleaned(text),
            vec![
                "1. First.",
                "4. See the report of the Secretary-General.",
                "2. Second.",
            ]
        );
    }

    #[test]
    fn paragraph_citing_a_year_ends_a_block() {
        let text = "\
1. First paragraph
__________________
3 Human Rights Council resolution 7/23.
2. In resolution 62/149 (2007), the Assembly called for a moratorium.
3. Third.";
        assert_eq!(
            cleaned(text),
            vec![
                "1. First paragraph",
                "2. In resolution 62/149 (2007), the Assembly called for a moratorium.",
                "3. Third.",
            ]
        );
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let text = "1. First.\n__________\n5 Footnote text.\nstill footnote";
        assert_eq!(cleaned(text), vec!["1. First."]);
    }

    #[test]
    fn lines_with_underscores_are_dropped() {
        assert_eq!(cleaned("1. A\nfile_name here\nB"), vec!["1. A", "B"]);
    }

    #[test]
    fn indices_point_into_the_source() {
        let records = filter_noise("\n1. A\n-2-\nB", &LineClassifier::default());
        let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
