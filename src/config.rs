//! Configuration types for paragraph extraction, ingestion and annotation.
//!
//! Three structs cover the three concerns:
//!
//! * [`ExtractionConfig`]: the paragraph engine: numbering policy and every
//!   tunable word list the line classifier consults ([`ClassifierRules`]).
//!   Serialisable, so a rules file can be loaded with
//!   [`ExtractionConfig::from_json_str`].
//! * [`AnnotationConfig`]: the optional keyword annotator (model, retries,
//!   concurrency, prompt override, progress callback).
//! * [`IngestConfig`]: how raw input bytes are turned into text.
//!
//! Each is built via a builder that validates on `build()`, or taken from
//! `Default`.

use crate::error::ParagraphError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for the paragraph reconstruction engine.
///
/// # Example
/// ```rust
/// use edgequake_paragraphs::{ExtractionConfig, NumberingPolicy};
///
/// let config = ExtractionConfig::builder()
///     .policy(NumberingPolicy::Strict)
///     .add_citation_intro_word("Supra")
///     .build()
///     .unwrap();
/// assert_eq!(config.policy, NumberingPolicy::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Which numbered lines count as paragraph starts. Default: [`NumberingPolicy::Permissive`].
    pub policy: NumberingPolicy,

    /// Skip the capitalised continuation lines of a footnote that interrupts
    /// a paragraph, until a soft continuation resumes the body. Default: true.
    ///
    /// When false only the footnote's first line is dropped.
    pub footnote_recovery: bool,

    /// Word and pattern lists consulted by the line classifier.
    pub rules: ClassifierRules,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            policy: NumberingPolicy::default(),
            footnote_recovery: true,
            rules: ClassifierRules::default(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parse a JSON rules document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ParagraphError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ParagraphError::InvalidConfig(format!("rules JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ParagraphError> {
        let r = &self.rules;
        if r.separator_min_run < 2 {
            return Err(ParagraphError::InvalidConfig(format!(
                "separator_min_run must be ≥ 2, got {}",
                r.separator_min_run
            )));
        }
        let lists = [
            ("citation_intro_words", &r.citation_intro_words),
            ("institutional_prefixes", &r.institutional_prefixes),
            ("section_keywords", &r.section_keywords),
            ("footnote_safe_words", &r.footnote_safe_words),
            ("connector_words", &r.connector_words),
        ];
        for (name, list) in lists {
            if list.iter().any(|w| w.trim().is_empty()) {
                return Err(ParagraphError::InvalidConfig(format!(
                    "{name} contains an empty entry"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn policy(mut self, policy: NumberingPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn footnote_recovery(mut self, v: bool) -> Self {
        self.config.footnote_recovery = v;
        self
    }

    pub fn rules(mut self, rules: ClassifierRules) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn citation_intro_words(mut self, words: Vec<String>) -> Self {
        self.config.rules.citation_intro_words = words;
        self
    }

    pub fn add_citation_intro_word(mut self, word: impl Into<String>) -> Self {
        self.config.rules.citation_intro_words.push(word.into());
        self
    }

    pub fn institutional_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.config.rules.institutional_prefixes = prefixes;
        self
    }

    pub fn parenthesized_year_is_citation(mut self, v: bool) -> Self {
        self.config.rules.parenthesized_year_is_citation = v;
        self
    }

    pub fn section_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.rules.section_keywords = keywords;
        self
    }

    pub fn footnote_safe_words(mut self, words: Vec<String>) -> Self {
        self.config.rules.footnote_safe_words = words;
        self
    }

    pub fn connector_words(mut self, words: Vec<String>) -> Self {
        self.config.rules.connector_words = words;
        self
    }

    pub fn separator_min_run(mut self, n: usize) -> Self {
        self.config.rules.separator_min_run = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ParagraphError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// How the paragraph-number registry decides which numbered lines are real
/// paragraph starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingPolicy {
    /// Only an unbroken `1, 2, 3, …` run is recognised; the first gap stalls
    /// recognition until the next contiguous number appears.
    Strict,
    /// Every `<n>.` line counts, in any order, duplicates included. (default)
    #[default]
    Permissive,
}

/// Tunable word and pattern lists used by the line classifier.
///
/// Substring-based citation detection can misfire on body text that quotes a
/// treaty name or a document symbol; the lists live here so a deployment can
/// narrow them instead of patching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Words that, right after a leading `<n>.` or `<n>`, mark a citation line.
    /// Matched case-insensitively as whole words.
    pub citation_intro_words: Vec<String>,

    /// Document-symbol prefixes (`A/HRC/`, `CCPR/C/`, …); any line containing
    /// one is a citation. Case-sensitive substring match.
    pub institutional_prefixes: Vec<String>,

    /// Treat lines containing a parenthesised four-digit year, e.g. `(2008)`,
    /// as citations. Default: true.
    pub parenthesized_year_is_citation: bool,

    /// Stand-alone section headings (`INTRODUCTION`, `ANEXOS`, …), matched
    /// against the whole line case-insensitively.
    pub section_keywords: Vec<String>,

    /// First words after a leading number that mark body text rather than a
    /// footnote (`15 March 2008 …`).
    pub footnote_safe_words: Vec<String>,

    /// Words that open a line continuing the previous sentence. Matched
    /// case-insensitively as whole words at line start.
    pub connector_words: Vec<String>,

    /// Minimum run of underscores that makes a footnote separator. Default: 2.
    pub separator_min_run: usize,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            citation_intro_words: strings(&[
                "See",
                "See also",
                "Cf.",
                "Ibid.",
                "Ibid",
                "Idem",
                "Convention",
                "Declaration",
                "Covenant",
                "Treaty",
                "General comment",
                "General recommendation",
                "Véase",
                "Ver",
                "Vid.",
                "Declaración",
                "Convención",
                "Pacto",
                "Tratado",
                "Observación general",
                "Recomendación general",
                "art.",
                "apartado",
                "párrafo",
            ]),
            institutional_prefixes: strings(&[
                "A/HRC/",
                "A/RES/",
                "A/CONF.",
                "E/CN.4/",
                "E/C.12/",
                "CEDAW/C/",
                "CCPR/C/",
                "CERD/C/",
                "CAT/C/",
                "CRC/C/",
                "CMW/C/",
                "CRPD/C/",
                "CED/C/",
                "HRI/GEN/",
            ]),
            parenthesized_year_is_citation: true,
            section_keywords: strings(&[
                "INTRODUCTION",
                "CONCLUSIONS",
                "RECOMMENDATIONS",
                "ANNEX",
                "ANNEXES",
                "INTRODUCCIÓN",
                "CONCLUSIONES",
                "RECOMENDACIONES",
                "ANEXO",
                "ANEXOS",
            ]),
            footnote_safe_words: strings(&[
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
                "Member",
                "States",
                "Estados",
            ]),
            connector_words: strings(&[
                "and",
                "or",
                "but",
                "nor",
                "however",
                "which",
                "whereas",
                "y",
                "o",
                "u",
                "e",
                "ni",
                "pero",
                "sino",
                "aunque",
                "sin embargo",
                "no obstante",
                "además",
                "también",
                "así como",
                "porque",
                "pues",
                "otra",
                "otras",
            ]),
            separator_min_run: 2,
        }
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

// ── Annotation ───────────────────────────────────────────────────────────

/// Configuration for keyword annotation of extracted paragraphs.
///
/// Built via [`AnnotationConfig::builder()`] or using
/// [`AnnotationConfig::default()`].
#[derive(Clone)]
pub struct AnnotationConfig {
    /// LLM model identifier, e.g. "deepseek-chat", "gpt-4.1-nano".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per paragraph. Default: 1024.
    pub max_tokens: usize,

    /// Number of keywords requested and the cap applied to the parsed list. Default: 15.
    pub max_keywords: usize,

    /// Maximum retry attempts on a failed call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::keyword_system_prompt`].
    pub system_prompt: Option<String>,

    /// Paragraphs annotated concurrently. Default: 4.
    pub concurrency: usize,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional per-paragraph progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 1024,
            max_keywords: crate::prompts::DEFAULT_KEYWORD_COUNT,
            max_retries: 3,
            retry_backoff_ms: 500,
            system_prompt: None,
            concurrency: 4,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnnotationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_keywords", &self.max_keywords)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnnotationProgressCallback>"),
            )
            .finish()
    }
}

impl AnnotationConfig {
    /// Create a new builder for `AnnotationConfig`.
    pub fn builder() -> AnnotationConfigBuilder {
        AnnotationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnnotationConfig`].
#[derive(Debug)]
pub struct AnnotationConfigBuilder {
    config: AnnotationConfig,
}

impl AnnotationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_keywords(mut self, n: usize) -> Self {
        self.config.max_keywords = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnnotationConfig, ParagraphError> {
        let c = &self.config;
        if c.max_keywords == 0 {
            return Err(ParagraphError::InvalidConfig(
                "max_keywords must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(ParagraphError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ParagraphError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Ingestion ────────────────────────────────────────────────────────────

/// Options for turning an input path, URL or byte buffer into text.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            password: None,
            download_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_permissive() {
        let config = ExtractionConfig::default();
        assert_eq!(config.policy, NumberingPolicy::Permissive);
        assert!(config.footnote_recovery);
        assert_eq!(config.rules.separator_min_run, 2);
    }

    #[test]
    fn builder_rejects_short_separator() {
        let err = ExtractionConfig::builder()
            .separator_min_run(1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("separator_min_run"));
    }

    #[test]
    fn builder_rejects_empty_word() {
        let err = ExtractionConfig::builder()
            .connector_words(vec!["and".into(), "  ".into()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("connector_words"));
    }

    #[test]
    fn rules_json_keeps_defaults_for_missing_fields() {
        let config = ExtractionConfig::from_json_str(
            r#"{ "policy": "strict", "rules": { "citation_intro_words": ["Supra"] } }"#,
        )
        .unwrap();
        assert_eq!(config.policy, NumberingPolicy::Strict);
        assert_eq!(config.rules.citation_intro_words, vec!["Supra".to_string()]);
        assert_eq!(
            config.rules.section_keywords,
            ClassifierRules::default().section_keywords
        );
        assert!(config.footnote_recovery);
    }

    #[test]
    fn rules_json_rejects_garbage() {
        assert!(ExtractionConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn annotation_builder_defaults() {
        let config = AnnotationConfig::builder().build().unwrap();
        assert_eq!(config.max_keywords, 15);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn annotation_builder_rejects_zero_keywords() {
        assert!(AnnotationConfig::builder().max_keywords(0).build().is_err());
    }

    #[test]
    fn annotation_builder_clamps() {
        let config = AnnotationConfig::builder()
            .temperature(9.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.concurrency, 1);
    }
}
