//! Records produced by extraction and annotation.
//!
//! Field names serialise in camelCase so the HTTP service and the CLI's
//! `--json` output share one wire shape.

use crate::error::AnnotationError;
use serde::{Deserialize, Serialize};

/// One reconstructed paragraph.
///
/// `text` never contains a line break, the leading `<n>.` marker, a run of
/// spaces, or surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub number: u32,
    pub text: String,
}

/// A document plus the paragraph numbers wanted from it.
///
/// Duplicated numbers are kept; each yields its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub document_text: String,
    pub requested_numbers: Vec<u32>,
}

/// Token counts reported by the model for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: usize,
    pub completion: usize,
    pub total: usize,
}

/// What a [`crate::pipeline::annotate::KeywordAnnotator`] returns for one
/// paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// The model's raw reply.
    pub full_response: String,
    pub keywords: Vec<String>,
    pub token_usage: TokenUsage,
}

/// A paragraph with its keyword annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedParagraph {
    #[serde(flatten)]
    pub record: ParagraphRecord,
    pub ai_analysis: String,
    pub keywords: Vec<String>,
    /// Set when the annotation call failed; `keywords` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnnotationError>,
}

impl AnnotatedParagraph {
    /// A record carrying no annotation, used when no annotator is configured.
    pub fn bare(record: ParagraphRecord) -> Self {
        Self {
            record,
            ai_analysis: String::new(),
            keywords: Vec::new(),
            error: None,
        }
    }
}

/// A paragraph mentioned under a keyword, with a short preview of its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordReference {
    pub number: u32,
    pub text: String,
}

/// All paragraphs sharing one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordIndexEntry {
    pub keyword: String,
    pub paragraphs: Vec<KeywordReference>,
}

/// Batch-level token totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub total: usize,
    /// `total / paragraphs`, rounded; 0 for an empty batch.
    pub average_per_paragraph: usize,
}

impl TokenSummary {
    pub fn from_paragraphs(total: usize, paragraphs: usize) -> Self {
        let average_per_paragraph = if paragraphs == 0 {
            0
        } else {
            (total as f64 / paragraphs as f64).round() as usize
        };
        Self {
            total,
            average_per_paragraph,
        }
    }
}

/// Result of annotating a batch of paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationOutput {
    #[serde(rename = "extractedParagraphs")]
    pub paragraphs: Vec<AnnotatedParagraph>,
    pub keyword_index: Vec<KeywordIndexEntry>,
    pub token_usage: TokenSummary,
}
