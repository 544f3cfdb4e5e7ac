//! Input resolution: turn a user-supplied path (or `-` for stdin) into PDF
//! bytes.
//!
//! pdfium can parse straight from memory, so the whole input is read up
//! front. We validate the PDF magic bytes (`%PDF`) before returning so callers
//! get a meaningful error rather than an opaque pdfium failure.

use crate::error::Pdf2FieldsError;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Name used in messages when the PDF arrives on stdin.
pub const STDIN_NAME: &str = "<stdin>";

/// PDF bytes plus a human-readable name for error messages.
#[derive(Debug, Clone)]
pub struct PdfSource {
    /// File path, or `<stdin>`.
    pub name: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

impl PdfSource {
    /// Wrap bytes that are already in memory, validating the PDF magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Pdf2FieldsError> {
        let name = name.into();
        check_magic(&name, &bytes)?;
        Ok(Self { name, bytes })
    }
}

/// Check if the input string asks for stdin.
pub fn is_stdin(input: &str) -> bool {
    input == "-"
}

/// Resolve the input string to PDF bytes.
pub async fn resolve_input(input: &str) -> Result<PdfSource, Pdf2FieldsError> {
    if is_stdin(input) {
        read_stdin().await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<PdfSource, Pdf2FieldsError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2FieldsError::FileNotFound { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2FieldsError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(Pdf2FieldsError::ReadFailed {
                source_name: path.display().to_string(),
                source: e,
            });
        }
    };

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    PdfSource::from_bytes(path.display().to_string(), bytes)
}

async fn read_stdin() -> Result<PdfSource, Pdf2FieldsError> {
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| Pdf2FieldsError::ReadFailed {
            source_name: STDIN_NAME.to_string(),
            source: e,
        })?;

    debug!("Read PDF from stdin ({} bytes)", bytes.len());
    PdfSource::from_bytes(STDIN_NAME, bytes)
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), Pdf2FieldsError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    Err(Pdf2FieldsError::NotAPdf {
        source_name: name.to_string(),
        magic: bytes.iter().take(4).copied().collect(),
    })
}
