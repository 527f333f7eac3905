//! Line classification: map one trimmed line to a [`LineKind`].
//!
//! Text extracted from a converted report interleaves body paragraphs with
//! page furniture (running page numbers, document symbols such as
//! `08-63561`, format markers such as `(S)`), footnote blocks and headings.
//! Every later stage asks the same question of a line (*what is it?*), so
//! the answer lives in one pure function, [`LineClassifier::classify`], that
//! returns a closed enum.
//!
//! ## Evaluation order
//!
//! The first matching rule wins:
//!
//! | # | Kind | Shape |
//! |---|------|-------|
//! | 1 | `Blank` | empty after trim |
//! | 2 | `SeparatorRule` | run of ≥ `separator_min_run` underscores |
//! | 3 | `PageNumber` | `-4-` or digits only |
//! | 4 | `DocumentCode` | contains `NN-NNNNN` |
//! | 5 | `FormatMarker` | a single `(token)` |
//! | 6 | `Citation` | `<n>.`/`<n>` + intro word, a document-symbol prefix, or `(YYYY)` |
//! | 7 | `SectionTitle` | `A. Title`, `IV. Title`, or a section keyword |
//! | 8 | `SubsectionTitle` | `a) Word`, `2) Word`, `ii) Word`, exactly one word |
//! | 9 | `ParagraphStart(n)` | `<n>.` at line start |
//! | 10 | `FootnoteStart` | `<n> Capitalised…` unless the word is a safe word |
//! | 11 | `Continuation` | everything else; `soft` when it plainly continues a sentence |
//!
//! Rule 4 matches any line containing a symbol. Stages that read body text
//! use [`LineClassifier::body_kind`], which only keeps that kind for lines
//! holding nothing but the symbol and its page furniture.
//!
//! The word lists used by rules 6, 7, 10 and 11 come from
//! [`ClassifierRules`] and are compiled once in [`LineClassifier::new`].

use crate::config::ClassifierRules;
use crate::error::ParagraphError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// The closed set of line categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    SeparatorRule,
    PageNumber,
    DocumentCode,
    FormatMarker,
    Citation,
    SectionTitle,
    SubsectionTitle,
    /// A numbered line; carries the parsed paragraph number.
    ParagraphStart(u32),
    FootnoteStart,
    /// Ordinary text. `soft` marks a line that starts lowercase, with a
    /// connector word, or with an enumerator: one that resumes a
    /// sentence rather than opening something new.
    Continuation { soft: bool },
}

impl LineKind {
    /// Page furniture the noise filter removes outright.
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            LineKind::Blank
                | LineKind::SeparatorRule
                | LineKind::PageNumber
                | LineKind::DocumentCode
                | LineKind::FormatMarker
        )
    }

    /// Headings that end paragraph assembly.
    pub fn is_heading(&self) -> bool {
        matches!(self, LineKind::SectionTitle | LineKind::SubsectionTitle)
    }

    /// Reference material excluded from paragraph bodies.
    pub fn is_reference(&self) -> bool {
        matches!(self, LineKind::Citation | LineKind::FootnoteStart)
    }
}

// ── Fixed patterns ───────────────────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:-\d+-|\d+)$").unwrap());

static RE_DOCUMENT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}-\d{5}").unwrap());

/// A symbol on its own, optionally with an office prefix (`GE.`), format
/// markers and job numbers: `08-63561`, `GE.08-63561 (S)  180408  180408`.
static RE_DOCUMENT_CODE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\p{Lu}{1,4}\.)?\d{2}-\d{5}(?:\s+(?:\([\p{L}\p{N}]+\)|\*?\d+\*?))*$").unwrap()
});

static RE_FORMAT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\([\p{L}\p{N}]+\)$").unwrap());

static RE_PARENTHESIZED_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d{4}\)").unwrap());

static RE_SECTION_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}\.\s+\p{Lu}\p{Ll}").unwrap());

static RE_SECTION_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[IVXLC]+\.\s+\p{Lu}").unwrap());

static RE_SUBSECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-z]|\d+|[ivxlc]+)\)\s+\p{Lu}\p{Ll}+$").unwrap());

static RE_PARAGRAPH_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s?").unwrap());

static RE_NUMBERED_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s?(.+)").unwrap());

static RE_FOOTNOTE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s+(\p{Lu}\p{Ll}+)").unwrap());

static RE_ENUMERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?(?:[a-z]|\d+|[ivxlc]+)\)").unwrap());

/// Number of a `<n>.` line, if it has one.
pub fn paragraph_start_number(line: &str) -> Option<u32> {
    RE_PARAGRAPH_START
        .captures(line.trim())
        .and_then(|caps| caps[1].parse().ok())
}

/// Whether `line` is a document symbol and nothing but page furniture.
pub fn is_document_code_only(line: &str) -> bool {
    RE_DOCUMENT_CODE_ONLY.is_match(line.trim())
}

/// Number of a `<n>.<text>` line: a numbered line with content after the
/// marker. This is the shape the paragraph-number registry counts.
pub fn numbered_text_number(line: &str) -> Option<u32> {
    RE_NUMBERED_TEXT
        .captures(line.trim())
        .and_then(|caps| caps[1].parse().ok())
}

// ── Classifier ───────────────────────────────────────────────────────────

/// A line classifier with its configurable word lists compiled.
///
/// Cheap to share by reference; holds no mutable state.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    separator: String,
    citation_intro: Option<Regex>,
    institutional_prefixes: Vec<String>,
    parenthesized_year_is_citation: bool,
    section_keywords: HashSet<String>,
    footnote_safe_words: HashSet<String>,
    connector: Option<Regex>,
}

impl LineClassifier {
    /// Compile `rules` into a classifier.
    pub fn new(rules: &ClassifierRules) -> Result<Self, ParagraphError> {
        let citation_intro = word_list_regex(r"^\d+\.?\s*", &rules.citation_intro_words)?;
        let connector = word_list_regex("^", &rules.connector_words)?;

        Ok(Self {
            separator: "_".repeat(rules.separator_min_run.max(2)),
            citation_intro,
            institutional_prefixes: rules.institutional_prefixes.clone(),
            parenthesized_year_is_citation: rules.parenthesized_year_is_citation,
            section_keywords: rules
                .section_keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .collect(),
            footnote_safe_words: rules
                .footnote_safe_words
                .iter()
                .map(|w| w.trim().to_string())
                .collect(),
            connector,
        })
    }

    /// Classify one line. Leading and trailing whitespace is ignored.
    pub fn classify(&self, line: &str) -> LineKind {
        let line = line.trim();

        if line.is_empty() {
            return LineKind::Blank;
        }
        if self.is_separator(line) {
            return LineKind::SeparatorRule;
        }
        if RE_PAGE_NUMBER.is_match(line) {
            return LineKind::PageNumber;
        }
        if RE_DOCUMENT_CODE.is_match(line) {
            return LineKind::DocumentCode;
        }
        self.classify_text(line)
    }

    /// Kind of a line as it reads in the body of a document.
    ///
    /// Same as [`classify`](Self::classify), except that a line which only
    /// *mentions* a document symbol (`2. El informe 08-63561 fue`) is
    /// classified by its text. Stand-alone symbols stay
    /// [`LineKind::DocumentCode`].
    pub fn body_kind(&self, line: &str) -> LineKind {
        let line = line.trim();
        match self.classify(line) {
            LineKind::DocumentCode if !is_document_code_only(line) => self.classify_text(line),
            kind => kind,
        }
    }

    /// Rules 5 to 11 on a trimmed, non-empty line.
    fn classify_text(&self, line: &str) -> LineKind {
        if RE_FORMAT_MARKER.is_match(line) {
            return LineKind::FormatMarker;
        }
        if self.is_citation(line) {
            return LineKind::Citation;
        }
        if self.is_section_title(line) {
            return LineKind::SectionTitle;
        }
        if RE_SUBSECTION.is_match(line) {
            return LineKind::SubsectionTitle;
        }
        if let Some(n) = paragraph_start_number(line) {
            return LineKind::ParagraphStart(n);
        }
        if self.is_footnote_start(line) {
            return LineKind::FootnoteStart;
        }

        LineKind::Continuation {
            soft: self.is_soft_continuation(line),
        }
    }

    /// Whether `line` contains a footnote separator rule.
    pub fn is_separator(&self, line: &str) -> bool {
        line.contains(self.separator.as_str())
    }

    fn is_citation(&self, line: &str) -> bool {
        if let Some(re) = &self.citation_intro {
            if re.is_match(line) {
                return true;
            }
        }
        if self
            .institutional_prefixes
            .iter()
            .any(|p| line.contains(p.as_str()))
        {
            return true;
        }
        self.parenthesized_year_is_citation && RE_PARENTHESIZED_YEAR.is_match(line)
    }

    fn is_section_title(&self, line: &str) -> bool {
        RE_SECTION_LETTER.is_match(line)
            || RE_SECTION_ROMAN.is_match(line)
            || self.section_keywords.contains(&line.to_uppercase())
    }

    fn is_footnote_start(&self, line: &str) -> bool {
        match RE_FOOTNOTE_START.captures(line) {
            Some(caps) => !self.footnote_safe_words.contains(&caps[1]),
            None => false,
        }
    }

    fn is_soft_continuation(&self, line: &str) -> bool {
        let starts_lowercase = line.chars().next().is_some_and(char::is_lowercase);
        starts_lowercase
            || self.connector.as_ref().is_some_and(|re| re.is_match(line))
            || RE_ENUMERATOR.is_match(line)
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

static DEFAULT_CLASSIFIER: Lazy<LineClassifier> =
    Lazy::new(|| LineClassifier::new(&ClassifierRules::default()).unwrap());

/// Build a case-insensitive `<prefix>(w1|w2|…)` regex that only matches whole
/// words. Longer words are tried first so multi-word entries win.
fn word_list_regex(prefix: &str, words: &[String]) -> Result<Option<Regex>, ParagraphError> {
    if words.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&str> = words.iter().map(|w| w.trim()).collect();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    let alternation = sorted
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i){prefix}(?:{alternation})(?:$|[^\p{{L}}\p{{N}}])");
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| ParagraphError::InvalidConfig(format!("word list: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classify(line: &str) -> LineKind {
        LineClassifier::default().classify(line)
    }

    #[rstest]
    #[case("", LineKind::Blank)]
    #[case("    ", LineKind::Blank)]
    #[case("__________________", LineKind::SeparatorRule)]
    #[case("-4-", LineKind::PageNumber)]
    #[case("17", LineKind::PageNumber)]
    #[case("08-63561", LineKind::DocumentCode)]
    #[case("GE.08-63561 (S)", LineKind::DocumentCode)]
    #[case("(S)", LineKind::FormatMarker)]
    #[case("12 See A/HRC/7/23, para. 4.", LineKind::Citation)]
    #[case("3. Véase la resolución 7/23 del Consejo.", LineKind::Citation)]
    #[case("4 Cf. the report cited above.", LineKind::Citation)]
    #[case("Report of the Committee, CCPR/C/GC/34.", LineKind::Citation)]
    #[case("Adopted in Geneva (2008) by consensus.", LineKind::Citation)]
    #[case("A. Introduction", LineKind::SectionTitle)]
    #[case("IV. Conclusions and recommendations", LineKind::SectionTitle)]
    #[case("INTRODUCCIÓN", LineKind::SectionTitle)]
    #[case("Annex", LineKind::SectionTitle)]
    #[case("a) Vivienda", LineKind::SubsectionTitle)]
    #[case("2) Health", LineKind::SubsectionTitle)]
    #[case("ii) Education", LineKind::SubsectionTitle)]
    #[case("14. The Special Rapporteur notes that", LineKind::ParagraphStart(14))]
    #[case("7.The State party", LineKind::ParagraphStart(7))]
    #[case("15 Human Rights Council resolution 7/23.", LineKind::FootnoteStart)]
    #[case("15 March 2008 the Council adopted", LineKind::Continuation { soft: false })]
    #[case("en la siguiente línea.", LineKind::Continuation { soft: true })]
    #[case("However, the State party", LineKind::Continuation { soft: true })]
    #[case("Sin embargo, el Estado", LineKind::Continuation { soft: true })]
    #[case("b) the right to food;", LineKind::Continuation { soft: true })]
    #[case("The Committee recalls", LineKind::Continuation { soft: false })]
    fn classifies_default_rules(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(classify(line), expected, "line: {line:?}");
    }

    #[rstest]
    #[case("08-63561", true)]
    #[case("GE.08-63561 (S)", true)]
    #[case("GE.08-63561 (S)    180408    180408", true)]
    #[case("2. El informe 08-63561 fue", false)]
    #[case("GE.08-63561 en su período de sesiones.", false)]
    fn document_code_only(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_document_code_only(line), expected, "line: {line:?}");
    }

    #[test]
    fn body_kind_reads_past_a_mentioned_symbol() {
        let c = LineClassifier::default();
        assert_eq!(c.body_kind("GE.08-63561 (S)"), LineKind::DocumentCode);
        assert_eq!(
            c.body_kind("2. El informe 08-63561 fue"),
            LineKind::ParagraphStart(2)
        );
        assert_eq!(
            c.body_kind("GE.08-63561 en su período de sesiones."),
            LineKind::Continuation { soft: false }
        );
        assert_eq!(
            c.body_kind("14 See document 08-63561."),
            LineKind::Citation
        );
    }

    #[test]
    fn intro_word_must_be_whole_word() {
        // "Ver" is an intro word; "Verification" is not a citation.
        assert_eq!(
            classify("5. Verification of the data"),
            LineKind::ParagraphStart(5)
        );
    }

    #[test]
    fn subsection_needs_exactly_one_word() {
        assert_eq!(
            classify("a) Vivienda adecuada"),
            LineKind::Continuation { soft: true }
        );
    }

    #[test]
    fn separator_run_is_configurable() {
        let rules = ClassifierRules {
            separator_min_run: 5,
            ..ClassifierRules::default()
        };
        let classifier = LineClassifier::new(&rules).unwrap();
        assert_eq!(
            classifier.classify("snake__case"),
            LineKind::Continuation { soft: true }
        );
        assert_eq!(classifier.classify("_____"), LineKind::SeparatorRule);
    }

    #[test]
    fn safe_words_are_configurable() {
        let rules = ClassifierRules {
            footnote_safe_words: vec!["Human".into()],
            ..ClassifierRules::default()
        };
        let classifier = LineClassifier::new(&rules).unwrap();
        assert_eq!(
            classifier.classify("15 Human Rights Council resolution 7/23."),
            LineKind::Continuation { soft: false }
        );
    }

    #[test]
    fn year_rule_can_be_disabled() {
        let rules = ClassifierRules {
            parenthesized_year_is_citation: false,
            ..ClassifierRules::default()
        };
        let classifier = LineClassifier::new(&rules).unwrap();
        assert_eq!(
            classifier.classify("Adopted in Geneva (2008) by consensus."),
            LineKind::Continuation { soft: false }
        );
    }

    #[test]
    fn empty_word_lists_disable_rules() {
        let rules = ClassifierRules {
            citation_intro_words: vec![],
            connector_words: vec![],
            ..ClassifierRules::default()
        };
        let classifier = LineClassifier::new(&rules).unwrap();
        assert_eq!(
            classifier.classify("3. See the annex"),
            LineKind::ParagraphStart(3)
        );
        assert_eq!(
            classifier.classify("However, the State party"),
            LineKind::Continuation { soft: false }
        );
    }

    #[test]
    fn numbered_text_requires_content() {
        assert_eq!(numbered_text_number("12. Text"), Some(12));
        assert_eq!(numbered_text_number("12.Text"), Some(12));
        assert_eq!(numbered_text_number("12."), None);
        assert_eq!(numbered_text_number("12 Text"), None);
        assert_eq!(paragraph_start_number("12."), Some(12));
    }

    #[test]
    fn oversized_numbers_are_not_paragraphs() {
        assert_eq!(paragraph_start_number("99999999999999. Text"), None);
    }
}
