//! # edgequake-paragraphs
//!
//! Reconstruct numbered paragraphs from the noisy plain text of converted
//! reports.
//!
//! ## Why this crate?
//!
//! The text layer of a UN-style report interleaves the paragraphs you want
//! with everything you don't: running page numbers (`-4-`), document symbols
//! (`08-63561`), format markers (`(S)`), footnote blocks under a separator
//! rule, citation lines and section headings. Paragraph `12` typically
//! starts on one page and ends on the next, with a footnote block in
//! between. This crate classifies every line, filters the furniture out,
//! works out which numbers really open paragraphs, and stitches each
//! requested paragraph back together as one clean string.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Noise filter  footnote blocks, page numbers, document codes, blanks
//!  ├─ 2. Registry      recognised paragraph numbers (strict or permissive)
//!  ├─ 3. Assembler     start line + continuations, minus citations/footnotes
//!  └─ 4. Output        ParagraphRecord { number, text } in request order
//! ```
//!
//! Around the engine sit optional glue stages: ingestion of PDFs and text
//! files ([`pipeline::ingest`]), LLM keyword annotation
//! ([`pipeline::annotate`]), an in-memory document store ([`store`]) and an
//! HTTP service (`server` feature).
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_paragraphs::{extract_paragraphs, NumberingPolicy};
//!
//! let text = "\
//! 1. Primera oración del párrafo uno.
//! 2. Segunda oración del párrafo dos que continúa
//! en la siguiente línea.
//! 08-63561
//! 3. Tercer párrafo.";
//!
//! let records = extract_paragraphs(text, &[2], NumberingPolicy::Permissive).unwrap();
//! assert_eq!(records[0].text, "Segunda oración del párrafo dos que continúa en la siguiente línea.");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | The `parex` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | The [`server`] module and `parex-server` binary (axum + tower-http) |
//!
//! ```toml
//! edgequake-paragraphs = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AnnotationConfig, AnnotationConfigBuilder, ClassifierRules, ExtractionConfig,
    ExtractionConfigBuilder, IngestConfig, NumberingPolicy,
};
pub use error::{AnnotationError, ParagraphError};
pub use extract::{
    extract_paragraphs, format_records, parse_requested_numbers, write_output, ParagraphExtractor,
};
pub use output::{
    AnnotatedParagraph, Annotation, AnnotationOutput, ExtractionRequest, KeywordIndexEntry,
    KeywordReference, ParagraphRecord, TokenSummary, TokenUsage,
};
pub use pipeline::annotate::{annotate_paragraphs, KeywordAnnotator, LlmAnnotator};
pub use pipeline::classify::{LineClassifier, LineKind};
pub use pipeline::ingest::{ingest, ingest_bytes, IngestedDocument};
pub use pipeline::registry::ParagraphNumbers;
pub use progress::{AnnotationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{DocumentStore, StoredDocument};
