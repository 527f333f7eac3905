//! CLI binary for edgequake-paragraphs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` / `AnnotationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_paragraphs::pipeline::annotate::without_annotation;
use edgequake_paragraphs::{
    annotate_paragraphs, format_records, ingest, parse_requested_numbers, write_output,
    AnnotationConfig, AnnotationOutput, AnnotationProgressCallback, ExtractionConfig, IngestConfig,
    LlmAnnotator, NumberingPolicy, ParagraphExtractor, ParagraphRecord, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar for keyword annotation. Paragraphs complete out of
/// order, so the bar counts completions rather than positions.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl AnnotationProgressCallback for CliProgressCallback {
    fn on_annotation_start(&self, total: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} paragraphs  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total as u64);
        self.bar.set_prefix("Annotating");
        self.bar.reset_eta();
    }

    fn on_paragraph_complete(&self, number: u32, _index: usize, _total: usize, keywords: usize) {
        self.bar.println(format!(
            "  {} Paragraph {:>4}  {}",
            green("✓"),
            number,
            dim(&format!("{keywords} keywords")),
        ));
        self.bar.inc(1);
    }

    fn on_paragraph_error(&self, number: u32, _index: usize, _total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Paragraph {:>4}  {}", red("✗"), number, red(&msg)));
        self.bar.inc(1);
    }

    fn on_annotation_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} paragraphs annotated",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} paragraphs annotated  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every paragraph of the main numbering (stdout)
  parex report.pdf

  # Selected paragraphs, ranges allowed
  parex report.pdf --paragraphs "3, 7-9, 12"

  # Only trust an unbroken 1, 2, 3, … numbering
  parex report.txt --all --policy strict

  # Which paragraph numbers were recognised?
  parex report.pdf --list-numbers

  # Keywords per paragraph, as JSON, to a file
  parex report.pdf --paragraphs 1-20 --keywords --json -o paragraphs.json

  # Custom word lists (JSON with the ExtractionConfig fields)
  parex informe.pdf --config rules.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (keyword annotation)
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory holding libpdfium (PDF inputs)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Reconstruct numbered paragraphs from converted reports.
#[derive(Parser, Debug)]
#[command(
    name = "parex",
    version,
    about = "Reconstruct numbered paragraphs from PDF or text reports",
    long_about = "Extract numbered paragraphs from the text layer of a PDF (or a plain-text \
rendering of one), removing page numbers, document codes, footnote blocks and citations. \
Optionally annotates each paragraph with keywords from an LLM.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF/text file path or HTTP/HTTPS URL.
    input: String,

    /// Paragraph numbers: "1,3,5", "2-8", or a JSON array.
    #[arg(short, long, env = "PAREX_PARAGRAPHS", conflicts_with = "all")]
    paragraphs: Option<String>,

    /// Extract every paragraph of the main numbering (the default).
    #[arg(long)]
    all: bool,

    /// Print the recognised paragraph numbers only.
    #[arg(long, conflicts_with_all = ["paragraphs", "all", "keywords"])]
    list_numbers: bool,

    /// Numbering policy; overrides the one in --config.
    #[arg(long, env = "PAREX_POLICY", value_enum)]
    policy: Option<PolicyArg>,

    /// JSON file with extraction settings and word lists.
    #[arg(long, env = "PAREX_CONFIG")]
    config: Option<PathBuf>,

    /// Keep capitalised lines that follow a footnote line.
    #[arg(long, env = "PAREX_NO_FOOTNOTE_RECOVERY")]
    no_footnote_recovery: bool,

    /// Annotate each paragraph with LLM keywords.
    #[arg(short, long, env = "PAREX_KEYWORDS")]
    keywords: bool,

    /// LLM model ID for --keywords.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider for --keywords: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Keywords requested per paragraph.
    #[arg(long, env = "PAREX_MAX_KEYWORDS", default_value_t = 15)]
    max_keywords: usize,

    /// Number of concurrent LLM calls.
    #[arg(short, long, env = "PAREX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per paragraph on LLM failure.
    #[arg(long, env = "PAREX_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PAREX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Per-paragraph LLM call timeout in seconds.
    #[arg(long, env = "PAREX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output JSON instead of text.
    #[arg(long, env = "PAREX_JSON")]
    json: bool,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "PAREX_OUTPUT")]
    output: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAREX_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAREX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "PAREX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAREX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAREX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Strict,
    Permissive,
}

impl From<PolicyArg> for NumberingPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Strict => NumberingPolicy::Strict,
            PolicyArg::Permissive => NumberingPolicy::Permissive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let started = Instant::now();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is shown.
    let show_progress = cli.keywords && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build extractor ──────────────────────────────────────────────────
    let extractor = ParagraphExtractor::new(build_extraction_config(&cli).await?)
        .context("Invalid extraction rules")?;

    // ── Ingest ───────────────────────────────────────────────────────────
    let ingest_config = IngestConfig {
        password: cli.password.clone(),
        download_timeout_secs: cli.download_timeout,
    };
    let document = ingest(&cli.input, &ingest_config)
        .await
        .with_context(|| format!("Failed to read '{}'", cli.input))?;

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_numbers {
        let numbers = extractor.recognized_numbers(&document.text).to_vec();
        let rendered = if cli.json {
            serde_json::to_string_pretty(&numbers).context("Failed to serialise numbers")?
        } else {
            numbers
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        return emit(&cli, &format!("{rendered}\n")).await;
    }

    // ── Extract ──────────────────────────────────────────────────────────
    let records: Vec<ParagraphRecord> = match cli.paragraphs {
        Some(ref list) => {
            let requested = parse_requested_numbers(list).context("Invalid --paragraphs")?;
            extractor
                .extract(&document.text, &requested)
                .context("Extraction failed")?
        }
        None => extractor.extract_all(&document.text),
    };

    // ── Annotate (optional) ──────────────────────────────────────────────
    let rendered = if cli.keywords {
        let progress: Option<ProgressCallback> = if show_progress {
            Some(CliProgressCallback::new() as Arc<dyn AnnotationProgressCallback>)
        } else {
            None
        };
        let config = build_annotation_config(&cli, progress).await?;
        let annotator =
            LlmAnnotator::from_config(&config).context("Keyword annotation unavailable")?;
        let output = annotate_paragraphs(records, &annotator, &config).await;
        render_annotated(&cli, &output)?
    } else if cli.json {
        let output = without_annotation(records);
        serde_json::to_string_pretty(&output.paragraphs)
            .context("Failed to serialise output")?
            + "\n"
    } else {
        format_records(&records)
    };

    emit(&cli, &rendered).await?;

    if !cli.quiet {
        eprintln!(
            "{}  '{}'  {}",
            green("✔"),
            document.file_name,
            dim(&format!("{}ms", started.elapsed().as_millis())),
        );
    }
    Ok(())
}

/// Load `--config` and apply the flags that override it.
async fn build_extraction_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            ExtractionConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config file {:?}", path))?
        }
        None => ExtractionConfig::default(),
    };

    if let Some(policy) = cli.policy {
        config.policy = policy.into();
    }
    if cli.no_footnote_recovery {
        config.footnote_recovery = false;
    }
    Ok(config)
}

/// Map CLI args to `AnnotationConfig`.
async fn build_annotation_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
) -> Result<AnnotationConfig> {
    let mut builder = AnnotationConfig::builder()
        .max_keywords(cli.max_keywords)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn render_annotated(cli: &Cli, output: &AnnotationOutput) -> Result<String> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        return Ok(json + "\n");
    }

    let mut text = String::new();
    for (i, paragraph) in output.paragraphs.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&format!("{}. {}\n", paragraph.record.number, paragraph.record.text));
        match paragraph.error {
            Some(ref e) => text.push_str(&format!("   keywords: (failed: {e})\n")),
            None => text.push_str(&format!("   keywords: {}\n", paragraph.keywords.join(", "))),
        }
    }
    text.push_str(&format!(
        "\n{} tokens total, {} per paragraph\n",
        output.token_usage.total, output.token_usage.average_per_paragraph
    ));
    Ok(text)
}

/// Write to `--output` (atomically) or stdout.
async fn emit(cli: &Cli, contents: &str) -> Result<()> {
    match cli.output {
        Some(ref path) => write_output(path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")
        }
    }
}
