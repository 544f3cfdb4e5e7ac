//! The Extractor: PDF bytes → layout-preserving plain text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads are never stalled by parsing.
//!
//! pdfium only supplies characters and their boxes here; turning those into
//! lines and columns is the job of [`super::layout`].

use super::input::PdfSource;
use super::layout::{self, Glyph};
use crate::error::Pdf2FieldsError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Extract the layout-rendered text of every page of `source`.
///
/// Any parse failure (corrupt, truncated, encrypted without the right
/// password) is fatal: no partial text is returned.
pub async fn extract_text(
    source: PdfSource,
    password: Option<&str>,
) -> Result<String, Pdf2FieldsError> {
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_text_blocking(&source, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2FieldsError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    source: &PdfSource,
    password: Option<&str>,
) -> Result<String, Pdf2FieldsError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| Pdf2FieldsError::PdfiumBindingFailed(e.to_string()))?;

    let pages = collect_glyphs(&pdfium, source, password)?;
    let text = layout::render_document(&pages);
    debug!("Rendered {} chars of layout text", text.len());
    Ok(text)
}

/// Load the document and gather every page's positioned characters.
fn collect_glyphs(
    pdfium: &Pdfium,
    source: &PdfSource,
    password: Option<&str>,
) -> Result<Vec<Vec<Glyph>>, Pdf2FieldsError> {
    let document = pdfium
        .load_pdf_from_byte_slice(&source.bytes, password)
        .map_err(|e| classify_load_error(&source.name, password, e))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut result = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| Pdf2FieldsError::TextExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let mut glyphs = Vec::new();
        for ch in text.chars().iter() {
            let Some(c) = ch.unicode_char() else {
                continue;
            };
            // Generated characters (pdfium's synthetic spaces and line
            // breaks) have no box; positions carry that information anyway.
            let Ok(bounds) = ch.loose_bounds() else {
                continue;
            };
            glyphs.push(Glyph::new(
                c,
                bounds.left().value,
                bounds.bottom().value,
                bounds.width().value,
                bounds.height().value,
            ));
        }

        debug!("Page {}: {} glyphs", idx + 1, glyphs.len());
        result.push(glyphs);
    }

    Ok(result)
}

fn classify_load_error(
    source_name: &str,
    password: Option<&str>,
    e: PdfiumError,
) -> Pdf2FieldsError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2FieldsError::WrongPassword {
                source_name: source_name.to_string(),
            }
        } else {
            Pdf2FieldsError::PasswordRequired {
                source_name: source_name.to_string(),
            }
        }
    } else {
        Pdf2FieldsError::CorruptPdf {
            source_name: source_name.to_string(),
            detail: err_str,
        }
    }
}
