//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async code. Callers run
//! [`TextExtractor::extract_text`] inside `tokio::task::spawn_blocking` (see
//! [`extract_text_blocking`]) so Tokio worker threads never stall on parsing.
//!
//! ## Page cap
//!
//! Very large documents are not read to the end. Once more than `page_cap`
//! pages have been read *and* more than `char_cap` characters collected, the
//! extractor stops; the page that crossed both limits is still included. The
//! extraction pass only looks at a small leading window anyway, so the cap
//! trades completeness of refinement context for bounded latency.

use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of pages read before the cap can apply.
pub const DEFAULT_PAGE_CAP: usize = 50;

/// Default number of characters collected before the cap can apply.
pub const DEFAULT_CHAR_CAP: usize = 20_000;

/// Environment variable naming an existing pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Best-effort conversion of document bytes to plain text.
///
/// Implementations are blocking and must be shareable across threads.
pub trait TextExtractor: Send + Sync {
    /// Extract the document's text.
    ///
    /// # Errors
    /// [`ExtractError::UnreadablePdf`] when the document cannot be opened.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// [`TextExtractor`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumTextExtractor {
    page_cap: usize,
    char_cap: usize,
}

impl Default for PdfiumTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CAP, DEFAULT_CHAR_CAP)
    }
}

impl PdfiumTextExtractor {
    pub fn new(page_cap: usize, char_cap: usize) -> Self {
        Self { page_cap, char_cap }
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let pdfium = bind_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractError::UnreadablePdf {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let page_texts = pages.iter().enumerate().map(|(idx, page)| match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                warn!("Skipping text of page {}: {:?}", idx + 1, e);
                String::new()
            }
        });
        let text = collect_pages(page_texts, self.page_cap, self.char_cap);

        debug!("Extracted {} bytes of text", text.len());
        Ok(text)
    }
}

/// Concatenate page texts as-is, stopping once the cap is reached.
///
/// No separator is inserted between pages; whatever line breaks pdfium reports
/// at the end of a page are kept.
fn collect_pages<I>(page_texts: I, page_cap: usize, char_cap: usize) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut cap = PageCap::new(page_cap, char_cap);
    let mut text = String::new();

    for page_text in page_texts {
        text.push_str(&page_text);
        if cap.record_page(&page_text) {
            info!(
                "Stopping text extraction after page {} ({} chars)",
                cap.pages, cap.chars
            );
            break;
        }
    }
    text
}

/// Run `extractor` on a blocking-pool thread.
pub async fn extract_text_blocking(
    extractor: Arc<dyn TextExtractor>,
    bytes: Vec<u8>,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
        .await
        .map_err(|e| ExtractError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Bind pdfium from `PDFIUM_LIB_PATH`, the working directory, or the system.
fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !path.is_empty() {
            return Pdfium::bind_to_library(path.as_str())
                .map(Pdfium::new)
                .map_err(|e| ExtractError::PdfiumUnavailable(format!("{path}: {e:?}")));
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumUnavailable(format!("{e:?}")))
}

/// Running page/character totals for the extraction cap.
#[derive(Debug)]
struct PageCap {
    page_cap: usize,
    char_cap: usize,
    pages: usize,
    chars: usize,
}

impl PageCap {
    fn new(page_cap: usize, char_cap: usize) -> Self {
        Self {
            page_cap,
            char_cap,
            pages: 0,
            chars: 0,
        }
    }

    /// Account for one more page; returns `true` when reading should stop.
    fn record_page(&mut self, page_text: &str) -> bool {
        self.pages += 1;
        self.chars += page_text.chars().count();
        self.pages > self.page_cap && self.chars > self.char_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_needs_both_limits() {
        let mut cap = PageCap::new(2, 10);
        assert!(!cap.record_page("0123456789ab")); // chars over, pages not
        assert!(!cap.record_page(""));
        assert!(cap.record_page("")); // page 3 > 2 and 12 > 10
    }

    #[test]
    fn cap_not_reached_on_short_long_document() {
        let mut cap = PageCap::new(DEFAULT_PAGE_CAP, DEFAULT_CHAR_CAP);
        for _ in 0..200 {
            assert!(!cap.record_page("short page"));
        }
    }

    #[test]
    fn cap_counts_characters() {
        let mut cap = PageCap::new(0, 3);
        assert!(!cap.record_page("£££"));
        assert!(cap.record_page("£"));
    }

    #[test]
    fn pages_are_concatenated_without_separator() {
        let pages = ["Invoice ", "Date: 2023-10-25\n", "Total"].map(String::from);
        assert_eq!(
            collect_pages(pages, DEFAULT_PAGE_CAP, DEFAULT_CHAR_CAP),
            "Invoice Date: 2023-10-25\nTotal"
        );
    }

    #[test]
    fn collection_stops_after_triggering_page() {
        // Each page is 1 000 chars, so the char cap is long exceeded when
        // page 51 pushes the page count over 50.
        let pages = (0..60).map(|i| format!("{}", i % 10).repeat(1_000));
        let text = collect_pages(pages, DEFAULT_PAGE_CAP, DEFAULT_CHAR_CAP);
        assert_eq!(text.chars().count(), 51 * 1_000);
        assert!(text.ends_with(&"0".repeat(1_000)));
    }

    #[test]
    fn default_extractor_uses_default_caps() {
        let e = PdfiumTextExtractor::default();
        assert_eq!(e.page_cap, DEFAULT_PAGE_CAP);
        assert_eq!(e.char_cap, DEFAULT_CHAR_CAP);
    }

    struct Fixed(&'static str);

    impl TextExtractor for Fixed {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn blocking_wrapper_returns_extractor_output() {
        let text = extract_text_blocking(Arc::new(Fixed("hello")), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }
}
