//! CLI binary for pdf2fields.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2fields::config::{DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use pdf2fields::{extract_fields, extract_fields_to_file, extract_text, ExtractionConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner(prefix: &'static str, msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS),
    );
    bar.set_prefix(prefix);
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract PO Number, Total Amount and Delivery Address
  pdf2fields invoice.pdf

  # Same, as JSON
  pdf2fields --json invoice.pdf

  # Read the PDF from stdin, write JSON to a file
  cat invoice.pdf | pdf2fields - -o fields.json

  # Just show the layout text that would be sent (no API key needed)
  pdf2fields --text-only invoice.pdf

  # Different model or an OpenAI-compatible server
  pdf2fields --model gpt-3.5-turbo-instruct invoice.pdf
  pdf2fields --endpoint http://localhost:8000/v1/completions invoice.pdf

  # Custom instructions (the file must contain {document})
  pdf2fields --prompt my-prompt.txt invoice.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY           Bearer credential for the completion endpoint
  PDF2FIELDS_ENDPOINT      Completion URL
  PDF2FIELDS_MODEL         Model ID
  PDFIUM_LIB_PATH          Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR    Override the default pdfium cache directory
  RUST_LOG                 tracing filter (overrides -v / -q)
"#;

/// Extract named fields from a PDF with a text-completion LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2fields",
    version,
    about = "Extract named fields from a PDF with a text-completion LLM",
    long_about = "Extract the layout text of a PDF, send it to a text-completion endpoint \
with a fixed instruction, and print the JSON fields the model returns.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path, or `-` to read from stdin.
    input: String,

    /// Write the fields as JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2FIELDS_OUTPUT")]
    output: Option<PathBuf>,

    /// Bearer credential for the completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion endpoint URL.
    #[arg(long, env = "PDF2FIELDS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model ID placed in the request body.
    #[arg(long, env = "PDF2FIELDS_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF2FIELDS_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, env = "PDF2FIELDS_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Path to a text file with a custom prompt template containing {document}.
    #[arg(long, env = "PDF2FIELDS_PROMPT")]
    prompt: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2FIELDS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print the fields as pretty JSON.
    #[arg(long, env = "PDF2FIELDS_JSON")]
    json: bool,

    /// Print the extracted layout text and stop (no API call).
    #[arg(long)]
    text_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDF2FIELDS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2FIELDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2FIELDS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────────
    // The first run downloads the library (~30 MB) to
    //   ~/.cache/pdf2fields/pdfium-{VERSION}/
    // Later runs only check that path.
    if !pdfium_auto::is_pdfium_cached() {
        if show_progress {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(SPINNER_TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_and_clear();
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Text-only mode ───────────────────────────────────────────────────
    if cli.text_only {
        let text = extract_text(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to extract text")?;
        write_stdout(&text)?;
        return Ok(());
    }

    let config = build_config(&cli).await?;

    let bar = show_progress.then(|| spinner("Extracting", "reading PDF and querying model…"));

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let result = extract_fields_to_file(&cli.input, output_path, &config).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let output = result.context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} fields  {}ms  →  {}",
                green("✔"),
                output.answer.len(),
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let result = extract_fields(&cli.input, &config).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let output = result.context("Extraction failed")?;

        if cli.json {
            let json = serde_json::to_string_pretty(&output.answer)
                .context("Failed to serialise answer")?;
            write_stdout(&json)?;
        } else {
            write_stdout(&output.answer.to_string())?;
        }

        if !cli.quiet {
            eprintln!(
                "{}",
                dim(&format!(
                    "{} chars of text  →  {} fields  in {}ms",
                    output.stats.document_chars,
                    output.answer.len(),
                    output.stats.total_duration_ms
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .endpoint(&cli.endpoint)
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);

    if let Some(ref path) = cli.prompt {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.credential(key);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }

    builder.build().context("Invalid configuration")
}

/// Write `s` to stdout, ensuring a trailing newline.
fn write_stdout(s: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(s.as_bytes())
        .context("Failed to write to stdout")?;
    if !s.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
