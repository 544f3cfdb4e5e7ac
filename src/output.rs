//! Result types returned by the top-level entry points.

use crate::pipeline::answer::Answer;
use serde::Serialize;

/// Everything a run produced: the fields plus timing and size stats.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    /// Extracted fields (possibly empty).
    pub answer: Answer,
    pub stats: ExtractionStats,
}

/// Sizes and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Characters of layout text produced by the Extractor.
    pub document_chars: usize,
    /// Bytes of the raw completion response body.
    pub response_bytes: usize,
    pub extract_duration_ms: u64,
    pub completion_duration_ms: u64,
    pub total_duration_ms: u64,
}
