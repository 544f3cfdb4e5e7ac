//! Error types for the pdf2fields library.
//!
//! Every variant here is **fatal**: the run stops and nothing is printed.
//! The one recoverable situation in the pipeline, a completion response that
//! simply lacks the expected `choices[0].text` shape, is not an error at all.
//! It produces an empty [`crate::Answer`] instead.
//!
//! Variants are grouped by the stage that raises them so callers can match
//! on the failure class (input, PDF, transport, JSON, config) without
//! parsing messages.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2fields library.
#[derive(Debug, Error)]
pub enum Pdf2FieldsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input was read, but it does not start with the `%PDF` magic.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    /// Reading the input stream failed part-way.
    #[error("Failed to read '{source_name}': {source}")]
    ReadFailed {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt or truncated and cannot be parsed.
    #[error("PDF '{source_name}' is corrupt: {detail}")]
    CorruptPdf { source_name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{source_name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { source_name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{source_name}'")]
    WrongPassword { source_name: String },

    /// pdfium opened the document but could not read a page's text layer.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    // ── Completion errors ─────────────────────────────────────────────────
    /// The completion endpoint could not be reached (DNS, refused, TLS, …).
    #[error("Request to completion endpoint '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not valid JSON.
    #[error("Completion response is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// `choices[0].text` is present but does not hold a JSON object.
    #[error("Model answer is not a JSON object: {0}")]
    MalformedAnswer(#[source] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// No bearer credential was supplied.
    #[error(
        "No API credential configured.\n\
Set OPENAI_API_KEY or pass --api-key <KEY>."
    )]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2FieldsError {
    /// True for failures that happened before or while reading the PDF.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::PermissionDenied { .. }
                | Self::NotAPdf { .. }
                | Self::ReadFailed { .. }
                | Self::CorruptPdf { .. }
                | Self::PasswordRequired { .. }
                | Self::WrongPassword { .. }
                | Self::TextExtractionFailed { .. }
                | Self::PdfiumBindingFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_mentions_env_var() {
        let msg = Pdf2FieldsError::MissingCredential.to_string();
        assert!(msg.contains("OPENAI_API_KEY"), "got: {msg}");
    }

    #[test]
    fn not_a_pdf_display() {
        let e = Pdf2FieldsError::NotAPdf {
            source_name: "invoice.txt".into(),
            magic: b"hell".to_vec(),
        };
        assert!(e.to_string().contains("invoice.txt"));
    }

    #[test]
    fn malformed_answer_display() {
        let inner = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e = Pdf2FieldsError::MalformedAnswer(inner);
        assert!(e.to_string().starts_with("Model answer is not a JSON object"));
    }

    #[test]
    fn extraction_failures_are_classified() {
        assert!(Pdf2FieldsError::CorruptPdf {
            source_name: "a.pdf".into(),
            detail: "bad xref".into(),
        }
        .is_extraction_failure());
        assert!(!Pdf2FieldsError::MissingCredential.is_extraction_failure());
        assert!(!Pdf2FieldsError::InvalidConfig("x".into()).is_extraction_failure());
    }
}
