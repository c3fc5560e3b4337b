//! Pipeline stages for variable extraction and refinement.
//!
//! Each submodule implements exactly one step so it can be tested on its own
//! and swapped (e.g. a different text extractor) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! pdf ──▶ text ──▶ prompts ──▶ llm ──▶ validate ──▶ merge
//! (pdfium) (window)  (pair)   (Ollama)  (strict)   (refine only)
//! ```
//!
//! 1. [`pdf`]: bytes to best-effort text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`text`]: bound the text: leading window for extraction, full text
//!    for refinement
//! 3. [`llm`]: the single network call; no validation, no retry
//! 4. [`validate`]: parse the response into variables or reject it whole
//! 5. [`merge`]: fold refined variables back into the caller's list

pub mod llm;
pub mod merge;
pub mod pdf;
pub mod text;
pub mod validate;
