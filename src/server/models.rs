use serde::{Deserialize, Serialize};

// ── Requests ─────────────────────────────────────────────────────────────
//
// Fields are optional so a missing one is answered with a 400 naming it,
// not a generic deserialisation rejection.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEditedRequest {
    pub pdf_id: Option<String>,
    pub edited_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub pdf_id: Option<String>,
    /// A JSON array of numbers, or a string holding one.
    pub paragraph_numbers: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractAllRequest {
    pub pdf_id: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub raw_text: String,
    pub pdf_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
}
