//! Text ingestion: turn a path, URL or uploaded buffer into document text.
//!
//! The paragraph engine only ever sees a `&str`. This stage finds the bytes
//! (local file or HTTP download), decides what they are, and produces text:
//!
//! * bytes starting with `%PDF` go through pdfium's text layer, one page
//!   after another, joined by line breaks;
//! * any other bytes that are valid UTF-8 are taken as text verbatim;
//! * anything else is rejected with [`ParagraphError::UnsupportedInput`].
//!
//! pdfium is a blocking C library, so PDF work runs on `spawn_blocking`.

use crate::config::IngestConfig;
use crate::error::ParagraphError;
use crate::pipeline::normalize::clean_document_text;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Text extracted from one input, ready for the paragraph engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedDocument {
    /// File name of the input, used for display and document ids.
    pub file_name: String,
    pub text: String,
    /// Page count for PDF inputs; `None` for plain text.
    pub page_count: Option<usize>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read a local file or download a URL, then extract its text.
pub async fn ingest(
    input: &str,
    config: &IngestConfig,
) -> Result<IngestedDocument, ParagraphError> {
    let input = input.trim();
    if input.is_empty() || (input.contains("://") && !is_url(input)) {
        return Err(ParagraphError::InvalidInput {
            input: input.to_string(),
        });
    }

    info!("Ingesting: {}", input);
    let (file_name, bytes) = if is_url(input) {
        download_url(input, config.download_timeout_secs).await?
    } else {
        read_local(input).await?
    };

    ingest_bytes(&file_name, bytes, config).await
}

/// Extract text from an in-memory buffer, e.g. an HTTP upload.
pub async fn ingest_bytes(
    file_name: &str,
    bytes: Vec<u8>,
    config: &IngestConfig,
) -> Result<IngestedDocument, ParagraphError> {
    let (raw_text, page_count) = if bytes.starts_with(b"%PDF") {
        let name = file_name.to_string();
        let password = config.password.clone();
        let (text, pages) = tokio::task::spawn_blocking(move || {
            pdf_text_blocking(&name, &bytes, password.as_deref())
        })
        .await
        .map_err(|e| ParagraphError::Internal(format!("PDF text task panicked: {e}")))??;
        (text, Some(pages))
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => (text, None),
            Err(e) => {
                let magic = e.as_bytes().iter().take(4).copied().collect();
                return Err(ParagraphError::UnsupportedInput {
                    name: file_name.to_string(),
                    magic,
                });
            }
        }
    };

    let text = clean_document_text(&raw_text);
    info!(
        "Ingested '{}': {} lines{}",
        file_name,
        text.lines().count(),
        page_count.map(|p| format!(", {p} pages")).unwrap_or_default()
    );

    Ok(IngestedDocument {
        file_name: file_name.to_string(),
        text,
        page_count,
    })
}

// ── Sources ──────────────────────────────────────────────────────────────

async fn read_local(path_str: &str) -> Result<(String, Vec<u8>), ParagraphError> {
    let path = PathBuf::from(path_str);
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            ParagraphError::PermissionDenied { path: path.clone() }
        }
        _ => ParagraphError::FileNotFound { path: path.clone() },
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok((file_name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<(String, Vec<u8>), ParagraphError> {
    info!("Downloading: {}", url);

    let failed = |reason: String| ParagraphError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ParagraphError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ParagraphError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    debug!("Downloaded {} bytes", bytes.len());
    Ok((file_name_from_url(url), bytes.to_vec()))
}

/// Last path segment of `url`, or `downloaded` when there is none.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "downloaded".to_string())
}

// ── PDF text layer ───────────────────────────────────────────────────────

/// Bind pdfium: `PDFIUM_LIB_PATH` first, then the system library.
fn bind_pdfium() -> Result<Pdfium, ParagraphError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ParagraphError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

fn pdf_text_blocking(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<(String, usize), ParagraphError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ParagraphError::WrongPassword { name: name.to_string() }
            } else {
                ParagraphError::PasswordRequired { name: name.to_string() }
            }
        } else {
            ParagraphError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    let mut page_texts = Vec::with_capacity(page_count);

    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| ParagraphError::CorruptPdf {
            name: name.to_string(),
            detail: format!("page {}: {e:?}", idx + 1),
        })?;
        page_texts.push(text.all());
    }

    debug!("Extracted text layer of {} pages from '{}'", page_count, name);
    Ok((page_texts.join("\n"), page_count))
}
