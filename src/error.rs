//! Error types for the edgequake-paragraphs library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ParagraphError`] is **fatal**: the call cannot proceed at all
//!   (malformed paragraph list, unreadable input file, provider not
//!   configured, unknown document id). Returned as `Err(ParagraphError)`.
//!
//! * [`AnnotationError`] is **non-fatal**: keyword annotation of a single
//!   paragraph failed. Stored inside
//!   [`crate::output::AnnotatedParagraph`] so the remaining paragraphs of the
//!   batch are still returned.
//!
//! The paragraph engine itself never produces either type for anomalies in
//! the document text: a number with no start line is simply omitted.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-paragraphs library.
///
/// Per-paragraph annotation failures use [`AnnotationError`] and are stored
/// in [`crate::output::AnnotatedParagraph`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ParagraphError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The requested paragraph numbers are not a valid integer sequence.
    #[error("Invalid paragraph numbers '{input}': {reason}")]
    InvalidRequest { input: String, reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are neither a PDF nor UTF-8 text.
    #[error("'{name}' is neither a PDF nor UTF-8 text\nFirst bytes: {magic:?}")]
    UnsupportedInput { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction from PDF files needs a pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium, or\n\
  • install libpdfium system-wide, or\n\
  • convert the PDF to plain text first and pass the .txt file.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Annotation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Store errors ──────────────────────────────────────────────────────
    /// No stored document carries this id.
    #[error("Document '{id}' not found")]
    DocumentNotFound { id: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a rule list could not be compiled.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParagraphError {
    pub(crate) fn invalid_request(input: &str, reason: impl Into<String>) -> Self {
        ParagraphError::InvalidRequest {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A non-fatal error for a single paragraph's keyword annotation.
///
/// The batch continues; the paragraph is returned with an empty keyword list
/// and this error attached.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AnnotationError {
    /// LLM call failed after retries.
    #[error("Paragraph {number}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        number: u32,
        retries: u32,
        detail: String,
    },

    /// LLM call timed out.
    #[error("Paragraph {number}: LLM call timed out after {secs}s")]
    Timeout { number: u32, secs: u64 },
}
