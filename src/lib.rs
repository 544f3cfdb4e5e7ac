//! # pdf2fields
//!
//! Pull named fields ("PO Number", "Total Amount", "Delivery Address") out of
//! a PDF by handing its text to a text-completion LLM.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract  layout-preserving text via pdfium (spawn_blocking)
//!  ├─ 2. Call     fill the prompt template, one POST to the completion endpoint
//!  └─ 3. Parse    choices[0].text → JSON object → field map
//! ```
//!
//! Each stage runs exactly once. There is no retry and no chunking: the whole
//! document goes into one prompt, and if the service rejects it as too long,
//! its error body simply yields an empty answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2fields::{extract_fields, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from OPENAI_API_KEY
//!     let config = ExtractionConfig::from_env();
//!     let output = extract_fields("sample-invoice.pdf", &config).await?;
//!     println!("{}", output.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2fields` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::Pdf2FieldsError;
pub use output::{ExtractionOutput, ExtractionStats};
pub use pipeline::answer::{Answer, CompletionBody};
pub use pipeline::completion::{CompletionRequest, CompletionTransport, HttpTransport};
pub use run::{
    extract_fields, extract_fields_from_bytes, extract_fields_sync, extract_fields_to_file,
    extract_fields_with, extract_text, fields_from_text,
};
