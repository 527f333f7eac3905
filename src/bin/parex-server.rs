//! HTTP service for edgequake-paragraphs.
//!
//! Upload a report, edit its text, then extract (and optionally annotate)
//! numbered paragraphs over JSON.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_paragraphs::pipeline::annotate::resolve_provider;
use edgequake_paragraphs::server::{router, AppState};
use edgequake_paragraphs::{
    AnnotationConfig, ExtractionConfig, IngestConfig, LlmAnnotator, ParagraphExtractor,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "parex-server",
    version,
    about = "HTTP service for numbered-paragraph extraction"
)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// JSON file with extraction settings and word lists.
    #[arg(long, env = "PAREX_CONFIG")]
    config: Option<PathBuf>,

    /// Serve extraction without keyword annotation.
    #[arg(long, env = "PAREX_NO_KEYWORDS")]
    no_keywords: bool,

    /// LLM model ID for keyword annotation.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider for keyword annotation.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Number of concurrent LLM calls per request.
    #[arg(long, env = "PAREX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAREX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match cli.config {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            ExtractionConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config file {:?}", path))?
        }
        None => ExtractionConfig::default(),
    };
    let extractor = ParagraphExtractor::new(config).context("Invalid extraction rules")?;

    let mut state = AppState::new(extractor).with_ingest(IngestConfig {
        password: None,
        download_timeout_secs: cli.download_timeout,
    });

    if !cli.no_keywords {
        let mut builder = AnnotationConfig::builder().concurrency(cli.concurrency);
        if let Some(ref model) = cli.model {
            builder = builder.model(model.clone());
        }
        if let Some(ref provider) = cli.provider {
            builder = builder.provider_name(provider.clone());
        }
        let annotation = builder.build().context("Invalid annotation settings")?;

        // A missing API key downgrades the service instead of stopping it.
        match resolve_provider(&annotation) {
            Ok(provider) => {
                info!("Keyword annotation enabled");
                let annotator = Arc::new(LlmAnnotator::new(provider, &annotation));
                state = state.with_annotator(annotator, annotation);
            }
            Err(e) => warn!("Keyword annotation disabled: {}", e),
        }
    }

    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    println!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
