//! Keyword annotation of extracted paragraphs.
//!
//! Each paragraph is sent to an LLM that answers with keywords wrapped in
//! asterisks (`*vivienda*, *desalojo*, …`). The annotator trait keeps the
//! batch logic independent of the provider so tests can substitute a fake.
//!
//! ## Retry Strategy
//!
//! Rate limits and transient 5xx errors are common under concurrent load.
//! Failed calls are retried with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`); each call is also bounded by
//! `api_timeout_secs`. A paragraph that still fails keeps an empty keyword
//! list and carries an [`AnnotationError`]; the batch continues.

use crate::config::AnnotationConfig;
use crate::error::{AnnotationError, ParagraphError};
use crate::output::{
    AnnotatedParagraph, Annotation, AnnotationOutput, KeywordIndexEntry, KeywordReference,
    ParagraphRecord, TokenSummary, TokenUsage,
};
use crate::prompts::keyword_system_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Characters of paragraph text kept in a keyword-index preview.
pub const PREVIEW_CHARS: usize = 100;

/// Produces keywords for one paragraph.
#[async_trait]
pub trait KeywordAnnotator: Send + Sync {
    async fn annotate(&self, number: u32, text: &str) -> Result<Annotation, AnnotationError>;
}

// ── LLM annotator ────────────────────────────────────────────────────────

/// [`KeywordAnnotator`] backed by an `edgequake_llm` provider.
pub struct LlmAnnotator {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    max_keywords: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
}

impl LlmAnnotator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnnotationConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| keyword_system_prompt(config.max_keywords)),
            options: build_options(config),
            max_keywords: config.max_keywords,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve the provider from `config` (see [`resolve_provider`]).
    pub fn from_config(config: &AnnotationConfig) -> Result<Self, ParagraphError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl KeywordAnnotator for LlmAnnotator {
    async fn annotate(&self, number: u32, text: &str) -> Result<Annotation, AnnotationError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(text),
        ];
        let limit = Duration::from_secs(self.api_timeout_secs);

        let mut last_err: Option<String> = None;
        let mut timed_out = false;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "Paragraph {}: retry {}/{} after {}ms",
                    number, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(limit, self.provider.chat(&messages, Some(&self.options))).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Paragraph {}: {} input tokens, {} output tokens",
                        number, response.prompt_tokens, response.completion_tokens
                    );
                    let full_response = response.content.trim().to_string();
                    let keywords = parse_keywords(&full_response, self.max_keywords);
                    let prompt = response.prompt_tokens;
                    let completion = response.completion_tokens;
                    return Ok(Annotation {
                        full_response,
                        keywords,
                        token_usage: TokenUsage {
                            prompt,
                            completion,
                            total: prompt + completion,
                        },
                    });
                }
                Ok(Err(e)) => {
                    let err_msg = e.to_string();
                    warn!("Paragraph {}: attempt {} failed: {}", number, attempt + 1, err_msg);
                    timed_out = false;
                    last_err = Some(err_msg);
                }
                Err(_) => {
                    warn!(
                        "Paragraph {}: attempt {} timed out after {}s",
                        number,
                        attempt + 1,
                        self.api_timeout_secs
                    );
                    timed_out = true;
                }
            }
        }

        if timed_out {
            return Err(AnnotationError::Timeout {
                number,
                secs: self.api_timeout_secs,
            });
        }
        Err(AnnotationError::LlmFailed {
            number,
            retries: self.max_retries,
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

fn build_options(config: &AnnotationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is;
/// 2. `config.provider_name` with `config.model` (or [`DEFAULT_MODEL`]);
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set;
/// 4. `OPENAI_API_KEY` → OpenAI;
/// 5. [`ProviderFactory::from_env`] auto-detection.
pub fn resolve_provider(config: &AnnotationConfig) -> Result<Arc<dyn LLMProvider>, ParagraphError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ParagraphError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ParagraphError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ParagraphError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

// ── Response parsing ─────────────────────────────────────────────────────

static RE_ASTERISK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{2,}").unwrap());

static RE_STARRED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]*)\*").unwrap());

/// Keywords from `*…*` spans, in reply order.
///
/// Markdown bold (`**word**`) counts as one span. Entries are trimmed, and
/// entries without a letter or digit are dropped, as are case-insensitive
/// repeats. At most `max` are kept.
pub fn parse_keywords(response: &str, max: usize) -> Vec<String> {
    let normalised = RE_ASTERISK_RUN.replace_all(response, "*");
    let mut seen = HashSet::new();
    RE_STARRED
        .captures_iter(&normalised)
        .map(|caps| caps[1].trim().to_string())
        .filter(|keyword| keyword.chars().any(char::is_alphanumeric))
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .take(max)
        .collect()
}

// ── Batch ────────────────────────────────────────────────────────────────

/// Annotate `records` concurrently, keeping their order.
///
/// At most `config.concurrency` calls are in flight. Progress callbacks
/// fire per paragraph.
pub async fn annotate_paragraphs(
    records: Vec<ParagraphRecord>,
    annotator: &dyn KeywordAnnotator,
    config: &AnnotationConfig,
) -> AnnotationOutput {
    let total = records.len();
    let callback = config.progress_callback.as_ref();
    info!("Annotating {} paragraphs", total);

    if let Some(cb) = callback {
        cb.on_annotation_start(total);
    }

    let results: Vec<(AnnotatedParagraph, usize)> =
        stream::iter(records.into_iter().enumerate().map(|(index, record)| async move {
            if let Some(cb) = callback {
                cb.on_paragraph_start(record.number, index, total);
            }
            match annotator.annotate(record.number, &record.text).await {
                Ok(annotation) => {
                    if let Some(cb) = callback {
                        cb.on_paragraph_complete(
                            record.number,
                            index,
                            total,
                            annotation.keywords.len(),
                        );
                    }
                    let tokens = annotation.token_usage.total;
                    let paragraph = AnnotatedParagraph {
                        record,
                        ai_analysis: annotation.full_response,
                        keywords: annotation.keywords,
                        error: None,
                    };
                    (paragraph, tokens)
                }
                Err(e) => {
                    if let Some(cb) = callback {
                        cb.on_paragraph_error(record.number, index, total, &e.to_string());
                    }
                    let mut paragraph = AnnotatedParagraph::bare(record);
                    paragraph.error = Some(e);
                    (paragraph, 0)
                }
            }
        }))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let total_tokens: usize = results.iter().map(|(_, tokens)| tokens).sum();
    let paragraphs: Vec<AnnotatedParagraph> = results.into_iter().map(|(p, _)| p).collect();
    let succeeded = paragraphs.iter().filter(|p| p.error.is_none()).count();

    if let Some(cb) = callback {
        cb.on_annotation_complete(total, succeeded);
    }

    let token_usage = TokenSummary::from_paragraphs(total_tokens, paragraphs.len());
    info!(
        "Annotation complete: {}/{} paragraphs, {} tokens ({} per paragraph)",
        succeeded, total, token_usage.total, token_usage.average_per_paragraph
    );

    AnnotationOutput {
        keyword_index: build_keyword_index(&paragraphs),
        paragraphs,
        token_usage,
    }
}

/// Wrap records without calling any model.
pub fn without_annotation(records: Vec<ParagraphRecord>) -> AnnotationOutput {
    AnnotationOutput {
        paragraphs: records.into_iter().map(AnnotatedParagraph::bare).collect(),
        keyword_index: Vec::new(),
        token_usage: TokenSummary::default(),
    }
}

/// Group paragraphs by keyword, in first-seen order.
pub fn build_keyword_index(paragraphs: &[AnnotatedParagraph]) -> Vec<KeywordIndexEntry> {
    let mut index: Vec<KeywordIndexEntry> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for paragraph in paragraphs {
        let mut seen_here = HashSet::new();
        for keyword in &paragraph.keywords {
            if !seen_here.insert(keyword.as_str()) {
                continue;
            }
            let pos = *positions.entry(keyword.as_str()).or_insert_with(|| {
                index.push(KeywordIndexEntry {
                    keyword: keyword.clone(),
                    paragraphs: Vec::new(),
                });
                index.len() - 1
            });
            index[pos].paragraphs.push(KeywordReference {
                number: paragraph.record.number,
                text: preview(&paragraph.record.text),
            });
        }
    }

    index
}

/// Exponential delay before retry `attempt` (1-based), capped at `u64::MAX`.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
