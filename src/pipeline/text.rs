//! Text preparation: bound document text before it goes into a prompt.
//!
//! The extraction pass only sees a leading window of the document, which keeps
//! the cheap first pass within the model's context. Refinement targets
//! specific missing fields that may live anywhere in the document, so it gets
//! the full text.

/// Default size of the extraction window, in characters.
pub const DEFAULT_CONTEXT_CHARS: usize = 10_000;

/// Which pipeline path the text is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareMode {
    /// First pass: keep at most `max_chars` leading characters.
    Extraction { max_chars: usize },
    /// Refinement: keep everything.
    Refinement,
}

/// Prepare `text` for the given mode.
///
/// Truncation is silent and counts Unicode scalar values, so a multi-byte
/// character is never split.
pub fn prepare(text: &str, mode: PrepareMode) -> &str {
    match mode {
        PrepareMode::Extraction { max_chars } => leading_chars(text, max_chars),
        PrepareMode::Refinement => text,
    }
}

/// Whether the text carries no content at all.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn leading_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
