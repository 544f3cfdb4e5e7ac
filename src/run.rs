//! Top-level entry points: extract → call → parse, once, in order.
//!
//! Nothing here runs concurrently. The single completion request is awaited
//! before the answer is parsed, and any fatal error stops the run before
//! later stages start.

use crate::config::ExtractionConfig;
use crate::error::Pdf2FieldsError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::answer::Answer;
use crate::pipeline::completion::{self, CompletionTransport};
use crate::pipeline::input::{self, PdfSource};
use crate::pipeline::extract;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Extract the configured fields from a PDF file (or `-` for stdin).
///
/// Uses the reqwest-backed transport. See [`extract_fields_with`] to supply
/// another one.
///
/// # Errors
/// Returns `Err(Pdf2FieldsError)` for every fatal failure:
/// - no credential configured
/// - file not found / not a PDF / corrupt PDF
/// - the endpoint could not be reached
/// - the body, or the answer inside it, is not valid JSON
///
/// A response without `choices[0].text` is not an error; the returned
/// answer is simply empty.
pub async fn extract_fields(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    let transport = completion::default_transport();
    extract_fields_with(input_str, config, transport.as_ref()).await
}

/// [`extract_fields`] with an explicit transport.
pub async fn extract_fields_with(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
    transport: &dyn CompletionTransport,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // Fail before touching the PDF if the request could never be sent.
    config.require_credential()?;

    let source = input::resolve_input(input_str).await?;
    run_pipeline(source, config, transport).await
}

/// Extract fields from PDF bytes already in memory.
pub async fn extract_fields_from_bytes(
    bytes: Vec<u8>,
    config: &ExtractionConfig,
    transport: &dyn CompletionTransport,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    config.require_credential()?;
    let source = PdfSource::from_bytes("<memory>", bytes)?;
    run_pipeline(source, config, transport).await
}

/// Run only the Prompt Caller and Answer Extractor on text you already have.
pub async fn fields_from_text(
    document_text: &str,
    config: &ExtractionConfig,
    transport: &dyn CompletionTransport,
) -> Result<Answer, Pdf2FieldsError> {
    let body = completion::call_completion(config, transport, document_text).await?;
    Answer::from_completion(&body)
}

/// Run only the Extractor and return the layout text.
///
/// Needs neither a credential nor network access.
pub async fn extract_text(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<String, Pdf2FieldsError> {
    let source = input::resolve_input(input_str.as_ref()).await?;
    extract::extract_text(source, password).await
}

/// Synchronous wrapper around [`extract_fields`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_fields_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2FieldsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_fields(input_str, config))
}

/// Extract fields and write them as pretty JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_fields_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    let output = extract_fields(input_str, config).await?;
    let json = serde_json::to_string_pretty(&output.answer)
        .map_err(|e| Pdf2FieldsError::Internal(format!("Failed to serialise answer: {e}")))?;
    write_atomic(output_path.as_ref(), format!("{json}\n").as_bytes()).await?;
    Ok(output)
}

/// Write `contents` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Pdf2FieldsError> {
    let write_err = |source: std::io::Error| Pdf2FieldsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    tokio::fs::write(tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    source: PdfSource,
    config: &ExtractionConfig,
    transport: &dyn CompletionTransport,
) -> Result<ExtractionOutput, Pdf2FieldsError> {
    let total_start = Instant::now();

    // ── Step 1: Extract layout text ──────────────────────────────────────
    let extract_start = Instant::now();
    let text = extract::extract_text(source, config.password.as_deref()).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars of text in {}ms",
        text.chars().count(),
        extract_duration_ms
    );

    // ── Step 2: Call the completion endpoint ─────────────────────────────
    let completion_start = Instant::now();
    let body = completion::call_completion(config, transport, &text).await?;
    let completion_duration_ms = completion_start.elapsed().as_millis() as u64;

    // ── Step 3: Parse the answer ─────────────────────────────────────────
    let answer = Answer::from_completion(&body)?;
    if answer.is_empty() {
        info!("Completion response carried no answer; returning empty result");
    } else {
        info!("Extracted {} fields", answer.len());
    }

    let stats = ExtractionStats {
        document_chars: text.chars().count(),
        response_bytes: body.len(),
        extract_duration_ms,
        completion_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(ExtractionOutput { answer, stats })
}
