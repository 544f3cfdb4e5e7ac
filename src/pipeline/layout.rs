//! Layout-aware text rendering: positioned glyphs → plain text grid.
//!
//! pdfium hands back characters in content-stream order, which for invoices
//! and forms is often nothing like reading order (a right-hand address block
//! may be emitted before the left-hand header). This stage ignores that order
//! and places every glyph on a fixed-pitch character grid derived from its
//! page coordinates, so text that is visually on the same line ends up on the
//! same output line and columns stay roughly aligned.
//!
//! The stage is pure: it knows nothing about pdfium, which keeps it testable
//! with hand-built glyphs.
//!
//! ## Grid rules
//!
//! * Rows: glyphs are clustered by baseline (`bottom`), top of the page first.
//!   Two glyphs share a row when their baselines differ by at most half the
//!   median glyph height.
//! * Columns: `round(left / pitch)`, where `pitch` is the median glyph width
//!   (never below 1pt). A glyph that starts within 0.3 pitch of its
//!   predecessor's right edge is appended directly so proportional fonts do
//!   not split words; any other glyph gets at least one space before it.
//!   Columns are capped at [`MAX_COLUMNS`], so text placed far off the page
//!   lands at the right margin instead of after a run of padding.
//! * A glyph repeating its predecessor's character within a quarter pitch
//!   is an overprint (fake bold) and is dropped.
//! * A vertical gap larger than twice the median glyph height produces one
//!   blank line. Whitespace glyphs are dropped; spacing comes from positions.

/// Widest column a glyph is placed at before its predecessors are counted.
pub const MAX_COLUMNS: usize = 1000;

/// One visible character with its bounding box in page points
/// (origin bottom-left, y grows upward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Glyph {
    pub fn new(ch: char, left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            ch,
            left,
            bottom,
            width,
            height,
        }
    }

    fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Render every page and join them with a blank line.
///
/// The result ends with a newline unless it is empty.
pub fn render_document(pages: &[Vec<Glyph>]) -> String {
    let rendered: Vec<String> = pages
        .iter()
        .map(|g| render_page(g))
        .filter(|p| !p.is_empty())
        .collect();

    let mut text = rendered.join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Render one page's glyphs as lines of text (no trailing newline).
pub fn render_page(glyphs: &[Glyph]) -> String {
    let mut visible: Vec<Glyph> = glyphs
        .iter()
        .copied()
        .filter(|g| !g.ch.is_whitespace() && !g.ch.is_control())
        .collect();
    if visible.is_empty() {
        return String::new();
    }

    let pitch = median(visible.iter().map(|g| g.width).filter(|w| *w > 0.0)).max(1.0);
    let line_height = median(visible.iter().map(|g| g.height).filter(|h| *h > 0.0)).max(1.0);
    let row_tolerance = line_height / 2.0;

    // Top of page first, then left to right.
    visible.sort_by(|a, b| b.bottom.total_cmp(&a.bottom).then(a.left.total_cmp(&b.left)));

    let mut rows: Vec<(f32, Vec<Glyph>)> = Vec::new();
    for g in visible {
        match rows.last_mut() {
            Some((baseline, row)) if (*baseline - g.bottom).abs() <= row_tolerance => row.push(g),
            _ => rows.push((g.bottom, vec![g])),
        }
    }

    let mut lines: Vec<String> = Vec::with_capacity(rows.len());
    let mut prev_baseline: Option<f32> = None;
    for (baseline, mut row) in rows {
        if let Some(prev) = prev_baseline {
            if prev - baseline > line_height * 2.0 {
                lines.push(String::new());
            }
        }
        prev_baseline = Some(baseline);

        row.sort_by(|a, b| a.left.total_cmp(&b.left));
        lines.push(render_row(&row, pitch));
    }

    lines.join("\n")
}

fn render_row(row: &[Glyph], pitch: f32) -> String {
    let mut line = String::new();
    let mut cursor = 0usize;
    let mut prev: Option<&Glyph> = None;

    for g in row {
        if prev.is_some_and(|p| p.ch == g.ch && (g.left - p.left).abs() < pitch * 0.25) {
            continue;
        }

        let touching = prev.is_some_and(|p| g.left - p.right() < pitch * 0.3);
        let target = if touching {
            cursor
        } else {
            let col = ((g.left.max(0.0) / pitch).round() as usize).min(MAX_COLUMNS);
            if prev.is_some() {
                col.max(cursor + 1)
            } else {
                col
            }
        };

        line.extend(std::iter::repeat(' ').take(target - cursor));
        line.push(g.ch);
        cursor = target + 1;
        prev = Some(g);
    }

    line
}

fn median(values: impl Iterator<Item = f32>) -> f32 {
    let mut v: Vec<f32> = values.collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    v[v.len() / 2]
}
