use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ParagraphError;
use crate::extract::{numbers_from_json, parse_requested_numbers};
use crate::output::{AnnotationOutput, ParagraphRecord};
use crate::pipeline::annotate::{annotate_paragraphs, without_annotation};
use crate::pipeline::ingest::ingest_bytes;

use super::models::{
    ExtractAllRequest, ExtractRequest, ProcessResponse, SaveEditedRequest, SaveResponse,
};
use super::AppState;

/// An error answered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ParagraphError> for ApiError {
    fn from(e: ParagraphError) -> Self {
        let status = match &e {
            ParagraphError::InvalidRequest { .. }
            | ParagraphError::InvalidInput { .. }
            | ParagraphError::UnsupportedInput { .. }
            | ParagraphError::PasswordRequired { .. }
            | ParagraphError::WrongPassword { .. } => StatusCode::BAD_REQUEST,
            ParagraphError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", e);
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Handlers ─────────────────────────────────────────────────────────────

/// `POST /process-pdf`: ingest the uploaded `pdf` field and store its text.
pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<ProcessResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read form field: {e}")))?
    {
        if field.name() != Some("pdf") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file data: {e}")))?
            .to_vec();
        upload = Some((file_name, data));
    }

    let (file_name, data) = upload.ok_or_else(|| ApiError::bad_request("No PDF file uploaded."))?;
    let document = ingest_bytes(&file_name, data, &state.ingest).await?;
    let pdf_id = state.store.create(&document.file_name, document.text.clone())?;
    info!("Processed upload '{}' as {}", document.file_name, pdf_id);

    Ok(Json(ProcessResponse {
        raw_text: document.text,
        pdf_id,
    }))
}

/// `POST /save-edited-text`: replace a document's working text.
pub async fn save_edited_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveEditedRequest>,
) -> ApiResult<SaveResponse> {
    let (Some(pdf_id), Some(edited_text)) = (req.pdf_id, req.edited_text) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    state.store.update_edited(&pdf_id, edited_text)?;
    Ok(Json(SaveResponse {
        success: true,
        message: "Text edited successfully".to_string(),
    }))
}

/// `POST /extract-from-edited`: extract the requested paragraphs.
pub async fn extract_from_edited(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> ApiResult<AnnotationOutput> {
    let (Some(pdf_id), Some(numbers)) = (req.pdf_id, req.paragraph_numbers) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let text = state.store.edited_text(&pdf_id)?;
    let requested = requested_numbers(&numbers)?;
    let records = state.extractor.extract(&text, &requested)?;
    Ok(Json(annotate(&state, records).await))
}

/// `POST /extract-all-paragraphs`: extract the document's whole numbering.
pub async fn extract_all_paragraphs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractAllRequest>,
) -> ApiResult<AnnotationOutput> {
    let Some(pdf_id) = req.pdf_id else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let text = state.store.edited_text(&pdf_id)?;
    let records = state.extractor.extract_all(&text);
    Ok(Json(annotate(&state, records).await))
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// `paragraphNumbers` may be an array or a string holding one.
fn requested_numbers(value: &serde_json::Value) -> Result<Vec<u32>, ApiError> {
    match value {
        serde_json::Value::Array(values) => Ok(numbers_from_json(values)?),
        serde_json::Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(serde_json::Value::Array(values)) => Ok(numbers_from_json(&values)?),
            _ => Ok(parse_requested_numbers(s)?),
        },
        _ => Err(ApiError::bad_request("paragraphNumbers must be an array.")),
    }
}

async fn annotate(state: &AppState, records: Vec<ParagraphRecord>) -> AnnotationOutput {
    match &state.annotator {
        Some(annotator) => {
            annotate_paragraphs(records, annotator.as_ref(), &state.annotation).await
        }
        None => without_annotation(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_arrays_and_strings() {
        assert_eq!(requested_numbers(&json!([3, 1])).unwrap(), vec![3, 1]);
        assert_eq!(requested_numbers(&json!("[2, 2]")).unwrap(), vec![2, 2]);
        assert_eq!(requested_numbers(&json!("4-6")).unwrap(), vec![4, 5, 6]);
        assert!(requested_numbers(&json!(7)).is_err());
        assert!(requested_numbers(&json!("[\"x\"]")).is_err());
    }

    #[test]
    fn error_statuses() {
        let not_found: ApiError = ParagraphError::DocumentNotFound { id: "x".into() }.into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        let bad: ApiError = ParagraphError::invalid_request("0", "zero").into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        let internal: ApiError = ParagraphError::Internal("boom".into()).into();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
