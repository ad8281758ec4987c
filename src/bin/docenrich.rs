//! CLI binary for edgequake-docenrich.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docenrich::{
    DocumentRef, ExtractionSummary, Pipeline, PipelineConfig, PipelineObserver, PipelineResult,
    RunOptions, StepName,
};
use edgequake_docenrich::output::ExtractionOutcome;
use edgequake_docenrich::pipeline::input::{is_data_uri, is_url};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner that follows the run through its stages and logs each attempt.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineObserver for CliObserver {
    fn on_stage_start(&self, step: StepName) {
        let (prefix, msg) = match step {
            StepName::Download => ("Download", "fetching bytes…"),
            StepName::Classify => ("Classify", "detecting format…"),
            StepName::Extract => ("Extract", "extracting text…"),
            StepName::Enrich => ("Enrich", "summarizing…"),
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_attempt_complete(&self, outcome: &ExtractionOutcome) {
        let line = match (&outcome.failure, &outcome.text) {
            (None, Some(text)) => format!(
                "  {} {:<32} {}",
                green("✓"),
                outcome.attempt.strategy.as_str(),
                dim(&format!("{:>6} chars", text.chars().count()))
            ),
            (Some(f), _) => {
                let msg = if f.message.chars().count() > 80 {
                    format!("{}\u{2026}", f.message.chars().take(79).collect::<String>())
                } else {
                    f.message.clone()
                };
                format!("  {} {:<32} {}", red("✗"), outcome.attempt.strategy.as_str(), red(&msg))
            }
            (None, None) => return,
        };
        self.bar.println(line);
    }

    fn on_run_complete(&self, result: &PipelineResult) {
        self.bar.finish_and_clear();
        if result.success {
            eprintln!(
                "{} {} document  {}ms",
                green("✔"),
                bold(result.document_kind.label()),
                result.stats.total_ms
            );
        } else {
            eprintln!(
                "{} failed at {}",
                red("✘"),
                bold(result.failure_step.map(|s| s.as_str()).unwrap_or("?"))
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize and tag a remote PDF
  docenrich https://example.com/resume.pdf

  # Local file, declared type overrides the extension
  docenrich --type application/pdf scan.bin

  # Full JSON record
  docenrich --json letter.docx > letter.json

  # Extracted text only
  docenrich --text-only page.html

  # Custom instruction; {text} is replaced by the extracted text
  docenrich --instruction prompts/dates.txt certificate.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium (PDF rasterisation)
"#;

/// Extract text from documents and summarize and tag them with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docenrich",
    version,
    about = "Extract text from documents and summarize and tag them with an LLM",
    long_about = "Extract plain text from PDFs, images, Office documents, HTML and text \
(local files, URLs or data URIs), then ask a language model for a short summary and tags. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path, HTTP/HTTPS URL, or data: URI.
    input: String,

    /// Declared type: a MIME type (application/pdf) or extension (docx).
    #[arg(long = "type", env = "DOCENRICH_TYPE")]
    declared_type: Option<String>,

    /// Document name used for classification and in the prompt.
    #[arg(long, env = "DOCENRICH_NAME")]
    name: Option<String>,

    /// Text file with a custom instruction template; `{text}` is replaced by the extracted text.
    #[arg(long, env = "DOCENRICH_INSTRUCTION")]
    instruction: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Maximum characters of extracted text sent to the model.
    #[arg(long, env = "DOCENRICH_CHAR_CAP", default_value_t = edgequake_docenrich::DEFAULT_ENRICHMENT_CHAR_CAP)]
    char_cap: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCENRICH_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "DOCENRICH_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// PDF pages sent to the vision model.
    #[arg(long, env = "DOCENRICH_VISION_PAGES", default_value_t = 10)]
    vision_pages: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCENRICH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Timeout per extraction attempt in seconds.
    #[arg(long, env = "DOCENRICH_EXTRACTION_TIMEOUT", default_value_t = 120)]
    extraction_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOCENRICH_MODEL_TIMEOUT", default_value_t = 60)]
    model_timeout: u64,

    /// Output the full result as JSON.
    #[arg(long, env = "DOCENRICH_JSON", conflicts_with = "text_only")]
    json: bool,

    /// Print only the extracted text.
    #[arg(long, env = "DOCENRICH_TEXT_ONLY")]
    text_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCENRICH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCENRICH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCENRICH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.text_only;
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

    let config = build_config(&cli, show_progress)?;
    let pipeline = Pipeline::from_config(config).context("Failed to initialise pipeline")?;

    let doc = document_ref(&cli.input).await?;
    let opts = RunOptions {
        declared_type: cli.declared_type.clone(),
        file_name: cli.name.clone(),
    };

    // ── Custom-instruction variant ───────────────────────────────────────
    if let Some(ref path) = cli.instruction {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction template from {:?}", path))?;
        let output = pipeline
            .run_with_custom_instruction(doc, &opts, &template)
            .await
            .context("Custom instruction failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
        } else {
            write_stdout(&output.text)?;
            if !cli.quiet {
                print_extraction(&output.extraction);
            }
        }
        return Ok(());
    }

    // ── Summarize and tag ────────────────────────────────────────────────
    let result = pipeline.run(doc, &opts).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise output")?
        );
    } else if !result.success {
        eprintln!(
            "{} {} failed ({}): {}",
            red("error:"),
            result.failure_step.map(|s| s.as_str()).unwrap_or("run"),
            result.error_kind.map(|k| k.as_str()).unwrap_or("unknown"),
            result.error_message.as_deref().unwrap_or("")
        );
    } else if cli.text_only {
        write_stdout(&result.extracted_text)?;
    } else {
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", bold("Summary:"), result.summary));
        out.push_str(&format!("{} {}\n", bold("Tags:   "), result.tags.join(", ")));
        out.push('\n');
        out.push_str(&result.extracted_text);
        write_stdout(&out)?;
        if !cli.quiet {
            if let Some(ref extraction) = result.extraction {
                print_extraction(extraction);
            }
            if result.is_enrichment_degraded() {
                eprintln!(
                    "{} enrichment degraded ({:?})",
                    red("⚠"),
                    result.enrichment_status
                );
            }
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .enrichment_char_cap(cli.char_cap)
        .download_timeout_secs(cli.download_timeout)
        .extraction_timeout_secs(cli.extraction_timeout)
        .model_timeout_secs(cli.model_timeout)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .vision_max_pages(cli.vision_pages);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if show_progress {
        builder = builder.observer(CliObserver::new());
    }

    builder.build().context("Invalid configuration")
}

/// URL and data URI pass through; anything else is read from disk.
async fn document_ref(input: &str) -> Result<DocumentRef> {
    if is_url(input) {
        return Ok(DocumentRef::url(input));
    }
    if is_data_uri(input) {
        return Ok(DocumentRef::data_uri(input));
    }

    let path = Path::new(input);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let doc = DocumentRef::bytes(bytes);
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => doc.with_file_name(name),
        None => doc,
    })
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_extraction(extraction: &ExtractionSummary) {
    let status = if extraction.succeeded {
        green("ok")
    } else {
        red("failed")
    };
    eprintln!(
        "{}",
        dim(&format!("extracted with {} ({})", extraction.strategy, status))
    );
}
