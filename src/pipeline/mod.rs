//! Pipeline stages for PDF field extraction.
//!
//! Each submodule implements exactly one transformation step, run once and
//! in order. Keeping stages separate makes each independently testable; the
//! completion stage in particular can be driven by a stub transport.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ layout ──▶ completion ──▶ answer
//! (bytes)   (pdfium)    (grid)     (one POST)     (fields)
//! ```
//!
//! 1. [`input`]: read the PDF from a path or stdin, checking `%PDF`
//! 2. [`extract`]: collect positioned characters; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`layout`]: place characters on a text grid (pure)
//! 4. [`completion`]: fill the prompt template and POST it; the only stage
//!    with network I/O
//! 5. [`answer`]: pull `choices[0].text` out of the body and parse it

pub mod answer;
pub mod completion;
pub mod extract;
pub mod input;
pub mod layout;
