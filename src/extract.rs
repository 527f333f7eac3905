//! Extraction entry points.
//!
//! [`extract_paragraphs`] is the one-call API: text in, records out, using
//! the default word lists. [`ParagraphExtractor`] compiles an
//! [`ExtractionConfig`] once and can then be reused across documents and
//! threads; it holds no per-document state.
//!
//! Every call runs the same pipeline:
//!
//! ```text
//! text ──▶ noise filter ──▶ number registry ──▶ assembler (per requested number)
//! ```

use crate::config::{ExtractionConfig, NumberingPolicy};
use crate::error::ParagraphError;
use crate::output::ParagraphRecord;
use crate::pipeline::assemble::Assembler;
use crate::pipeline::classify::LineClassifier;
use crate::pipeline::noise::{filter_noise, LineRecord};
use crate::pipeline::registry::{valid_numbers, ParagraphNumbers};
use std::path::Path;
use tracing::debug;

/// Largest span a single `a-b` range in [`parse_requested_numbers`] may cover.
pub const MAX_RANGE_SPAN: u32 = 10_000;

/// Extract the requested paragraphs from `text`.
///
/// Records come back in the order of `requested`; a number listed twice
/// yields two identical records. Numbers that are not recognised paragraph
/// starts under `policy` are left out.
///
/// # Errors
/// [`ParagraphError::InvalidRequest`] when `requested` contains 0.
///
/// # Example
/// ```rust
/// use edgequake_paragraphs::{extract_paragraphs, NumberingPolicy};
///
/// let text = "1. First.\n-2-\n2. Second paragraph\nwrapped.";
/// let records = extract_paragraphs(text, &[2], NumberingPolicy::Permissive).unwrap();
/// assert_eq!(records[0].text, "Second paragraph wrapped.");
/// ```
pub fn extract_paragraphs(
    text: &str,
    requested: &[u32],
    policy: NumberingPolicy,
) -> Result<Vec<ParagraphRecord>, ParagraphError> {
    let extractor = ParagraphExtractor {
        config: ExtractionConfig {
            policy,
            ..ExtractionConfig::default()
        },
        classifier: LineClassifier::default(),
    };
    extractor.extract(text, requested)
}

/// A compiled, reusable paragraph extractor.
#[derive(Debug, Clone)]
pub struct ParagraphExtractor {
    config: ExtractionConfig,
    classifier: LineClassifier,
}

impl Default for ParagraphExtractor {
    fn default() -> Self {
        Self {
            config: ExtractionConfig::default(),
            classifier: LineClassifier::default(),
        }
    }
}

impl ParagraphExtractor {
    /// Compile the classifier rules in `config`.
    pub fn new(config: ExtractionConfig) -> Result<Self, ParagraphError> {
        let classifier = LineClassifier::new(&config.rules)?;
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Paragraph numbers recognised in `text` under the configured policy.
    pub fn recognized_numbers(&self, text: &str) -> ParagraphNumbers {
        let lines = filter_noise(text, &self.classifier);
        valid_numbers(&lines, self.config.policy)
    }

    /// Extract the requested paragraphs. See [`extract_paragraphs`].
    pub fn extract(
        &self,
        text: &str,
        requested: &[u32],
    ) -> Result<Vec<ParagraphRecord>, ParagraphError> {
        if let Some(pos) = requested.iter().position(|&n| n == 0) {
            return Err(ParagraphError::invalid_request(
                &format!("{requested:?}"),
                format!("entry {} is 0; paragraph numbers start at 1", pos + 1),
            ));
        }

        let lines = filter_noise(text, &self.classifier);
        let valid = valid_numbers(&lines, self.config.policy);
        Ok(self.assemble_all(&lines, &valid, requested))
    }

    /// Extract every paragraph of the document's main numbering.
    ///
    /// The numbers to extract are those found by a strict sequential scan
    /// (1, 2, 3, … with no gaps), which ignores stray numbered lines. Each is
    /// then assembled with the configured policy.
    pub fn extract_all(&self, text: &str) -> Vec<ParagraphRecord> {
        let lines = filter_noise(text, &self.classifier);
        let sequence = valid_numbers(&lines, NumberingPolicy::Strict).to_vec();
        let valid = match self.config.policy {
            NumberingPolicy::Strict => sequence.iter().copied().collect(),
            NumberingPolicy::Permissive => valid_numbers(&lines, NumberingPolicy::Permissive),
        };
        self.assemble_all(&lines, &valid, &sequence)
    }

    fn assemble_all(
        &self,
        lines: &[LineRecord<'_>],
        valid: &ParagraphNumbers,
        requested: &[u32],
    ) -> Vec<ParagraphRecord> {
        let assembler = Assembler::new(
            lines,
            valid,
            &self.classifier,
            self.config.footnote_recovery,
        );
        requested
            .iter()
            .filter_map(|&number| {
                if !valid.contains(number) {
                    debug!("Paragraph {} is not a recognised paragraph start", number);
                    return None;
                }
                let record = assembler.assemble(number);
                if record.is_none() {
                    debug!("Paragraph {} has no start line", number);
                }
                record
            })
            .collect()
    }
}

// ── Request parsing ──────────────────────────────────────────────────────

/// Parse a list of paragraph numbers.
///
/// Accepts a JSON array (`[1, 2, 5]`) or a comma/space separated list with
/// inclusive ranges (`1, 3-5 8`). Order and duplicates are preserved.
///
/// # Errors
/// [`ParagraphError::InvalidRequest`] for an empty list, a non-integer,
/// zero, a negative number, an inverted range, or a range wider than
/// [`MAX_RANGE_SPAN`].
pub fn parse_requested_numbers(input: &str) -> Result<Vec<u32>, ParagraphError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParagraphError::invalid_request(input, "no paragraph numbers given"));
    }

    let numbers = if trimmed.starts_with('[') {
        parse_json_list(trimmed)?
    } else {
        parse_plain_list(trimmed)?
    };

    if numbers.is_empty() {
        return Err(ParagraphError::invalid_request(input, "no paragraph numbers given"));
    }
    Ok(numbers)
}

/// Validate already-decoded JSON values as paragraph numbers.
pub fn numbers_from_json(values: &[serde_json::Value]) -> Result<Vec<u32>, ParagraphError> {
    values
        .iter()
        .map(|value| {
            let raw = value.to_string();
            match value.as_u64() {
                Some(0) => Err(ParagraphError::invalid_request(
                    &raw,
                    "paragraph numbers start at 1",
                )),
                Some(n) => u32::try_from(n)
                    .map_err(|_| ParagraphError::invalid_request(&raw, "number is too large")),
                None => Err(ParagraphError::invalid_request(&raw, "not a positive integer")),
            }
        })
        .collect()
}

fn parse_json_list(input: &str) -> Result<Vec<u32>, ParagraphError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(input)
        .map_err(|e| ParagraphError::invalid_request(input, format!("not a JSON array: {e}")))?;
    numbers_from_json(&values)
}

fn parse_plain_list(input: &str) -> Result<Vec<u32>, ParagraphError> {
    let mut numbers = Vec::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.starts_with('-') {
            return Err(ParagraphError::invalid_request(token, "negative paragraph number"));
        }
        match token.split_once('-') {
            Some((from, to)) => {
                let from = parse_number(from, token)?;
                let to = parse_number(to, token)?;
                if from > to {
                    return Err(ParagraphError::invalid_request(
                        token,
                        "range end is before its start",
                    ));
                }
                if to - from >= MAX_RANGE_SPAN {
                    return Err(ParagraphError::invalid_request(
                        token,
                        format!("range covers more than {MAX_RANGE_SPAN} numbers"),
                    ));
                }
                numbers.extend(from..=to);
            }
            None => numbers.push(parse_number(token, token)?),
        }
    }
    Ok(numbers)
}

fn parse_number(text: &str, token: &str) -> Result<u32, ParagraphError> {
    let n: u32 = text
        .trim()
        .parse()
        .map_err(|_| {
            ParagraphError::invalid_request(token, format!("'{text}' is not a positive integer"))
        })?;
    if n == 0 {
        return Err(ParagraphError::invalid_request(token, "paragraph numbers start at 1"));
    }
    Ok(n)
}

// ── Output ───────────────────────────────────────────────────────────────

/// Render records as `<n>. <text>` blocks separated by blank lines.
pub fn format_records(records: &[ParagraphRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}. {}\n", record.number, record.text));
    }
    out
}

/// Write `contents` to `path` atomically (temp file + rename).
pub async fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<(), ParagraphError> {
    let path = path.as_ref();
    let write_err = |source| ParagraphError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_is_rejected_before_processing() {
        let err = extract_paragraphs("1. A", &[1, 0], NumberingPolicy::Permissive).unwrap_err();
        assert!(matches!(err, ParagraphError::InvalidRequest { .. }));
    }

    #[test]
    fn parses_json_arrays() {
        assert_eq!(parse_requested_numbers("[3, 1, 3]").unwrap(), vec![3, 1, 3]);
    }

    #[test]
    fn parses_plain_lists_with_ranges() {
        assert_eq!(
            parse_requested_numbers("1, 3-5 8").unwrap(),
            vec![1, 3, 4, 5, 8]
        );
    }

    #[test]
    fn rejects_malformed_lists() {
        for input in [
            "", "  ", "[]", "1,x", "[1, \"2\"]", "[1.5]", "0", "-3", "5-3", "[0]", "[-1]", "{}",
        ] {
            let result = parse_requested_numbers(input);
            assert!(
                matches!(result, Err(ParagraphError::InvalidRequest { .. })),
                "input {input:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn rejects_huge_ranges() {
        assert!(parse_requested_numbers("1-20000").is_err());
        assert_eq!(parse_requested_numbers("1-1").unwrap(), vec![1]);
    }

    #[test]
    fn extractor_with_custom_rules() {
        let config = ExtractionConfig::builder()
            .add_citation_intro_word("Supra")
            .build()
            .unwrap();
        let extractor = ParagraphExtractor::new(config).unwrap();
        let text = "1. Body text\n2 Supra note 4.\ncontinues.";
        let records = extractor.extract(text, &[1]).unwrap();
        assert_eq!(records[0].text, "Body text continues.");
    }

    #[test]
    fn extract_all_follows_the_main_sequence() {
        let text = "1. One.\n2. Two.\n7. Stray item.\n3. Three.";
        let extractor = ParagraphExtractor::default();
        let numbers: Vec<u32> = extractor.extract_all(text).iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn recognized_numbers_use_configured_policy() {
        let text = "1. One\n2. Two\n4. Four";
        let strict = ParagraphExtractor::new(
            ExtractionConfig::builder().policy(NumberingPolicy::Strict).build().unwrap(),
        )
        .unwrap();
        assert_eq!(strict.recognized_numbers(text).to_vec(), vec![1, 2]);
        assert_eq!(
            ParagraphExtractor::default().recognized_numbers(text).to_vec(),
            vec![1, 2, 4]
        );
    }

    #[test]
    fn format_records_separates_blocks() {
        let records = vec![
            ParagraphRecord { number: 1, text: "A.".into() },
            ParagraphRecord { number: 2, text: "B.".into() },
        ];
        assert_eq!(format_records(&records), "1. A.\n\n2. B.\n");
        assert_eq!(format_records(&[]), "");
    }

    #[tokio::test]
    async fn write_output_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_output(&path, "1. A.\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1. A.\n");
        assert!(!dir.path().join("nested").join("out.txt.tmp").exists());
    }
}
