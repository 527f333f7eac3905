//! HTTP service: upload a document, edit its text, extract paragraphs.
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /process-pdf` | multipart, field `pdf` | `{rawText, pdfId}` |
//! | `POST /save-edited-text` | `{pdfId, editedText}` | `{success, message}` |
//! | `POST /extract-from-edited` | `{pdfId, paragraphNumbers}` | [`AnnotationOutput`](crate::output::AnnotationOutput) |
//! | `POST /extract-all-paragraphs` | `{pdfId}` | [`AnnotationOutput`](crate::output::AnnotationOutput) |
//!
//! Errors come back as `{"error": "..."}` with 400 (bad request), 404
//! (unknown document) or 500.

pub mod handlers;
pub mod models;

use crate::config::{AnnotationConfig, IngestConfig};
use crate::extract::ParagraphExtractor;
use crate::pipeline::annotate::KeywordAnnotator;
use crate::store::DocumentStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub store: DocumentStore,
    pub extractor: ParagraphExtractor,
    pub ingest: IngestConfig,
    /// Keyword annotator; `None` returns records with empty keyword lists.
    pub annotator: Option<Arc<dyn KeywordAnnotator>>,
    pub annotation: AnnotationConfig,
}

impl AppState {
    /// State with an empty store and no annotator.
    pub fn new(extractor: ParagraphExtractor) -> Self {
        Self {
            store: DocumentStore::new(),
            extractor,
            ingest: IngestConfig::default(),
            annotator: None,
            annotation: AnnotationConfig::default(),
        }
    }

    pub fn with_annotator(
        mut self,
        annotator: Arc<dyn KeywordAnnotator>,
        config: AnnotationConfig,
    ) -> Self {
        self.annotator = Some(annotator);
        self.annotation = config;
        self
    }

    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/process-pdf", post(handlers::process_pdf))
        .route("/save-edited-text", post(handlers::save_edited_text))
        .route("/extract-from-edited", post(handlers::extract_from_edited))
        .route("/extract-all-paragraphs", post(handlers::extract_all_paragraphs))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
