//! Extraction and refinement entry points.
//!
//! ## Two operations, one pipeline
//!
//! [`extract`] reads a PDF, shows the model a leading window of its text and
//! returns every variable the model finds. [`refine`] takes the full text back
//! together with the caller's edited variable list, asks the model to fill in
//! the gaps, and merges the answer into the caller's list by field name.
//!
//! Both are stateless: everything a call needs arrives in its arguments and
//! the [`ExtractorConfig`], and nothing outlives the call.

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::output::AnalysisResult;
use crate::pipeline::llm::ModelInvoker;
use crate::pipeline::merge::merge_refined;
use crate::pipeline::text::{self, PrepareMode};
use crate::pipeline::{pdf, validate};
use crate::prompts::{self, PromptPair};
use crate::schema::variable_list_schema;
use crate::variable::{RefinementRequest, Variable};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Media type accepted by [`extract`].
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Extract variables from an in-memory PDF.
///
/// # Arguments
/// * `bytes`: raw document bytes
/// * `filename`: name reported back in the result
/// * `content_type`: declared media type; must be `application/pdf`
/// * `config`: model endpoint and limits
///
/// # Errors
/// - [`ExtractError::InvalidContentType`] for anything but a PDF
/// - [`ExtractError::UnreadablePdf`] when pdfium cannot open the bytes
/// - [`ExtractError::NoExtractableText`] when the PDF yields only whitespace
/// - [`ExtractError::Upstream`] / [`ExtractError::ModelNotFound`] when the
///   model call fails
/// - [`ExtractError::InvalidModelOutput`] when the answer is not a valid
///   variable array
pub async fn extract(
    bytes: &[u8],
    filename: impl Into<String>,
    content_type: impl Into<String>,
    config: &ExtractorConfig,
) -> Result<AnalysisResult, ExtractError> {
    let total_start = Instant::now();
    let filename = filename.into();
    let content_type = content_type.into();
    info!("Starting extraction: {} ({} bytes)", filename, bytes.len());

    // ── Step 1: Check preconditions ──────────────────────────────────────
    if !is_pdf_content_type(&content_type) {
        return Err(ExtractError::InvalidContentType { content_type });
    }
    let invoker = config.resolve_invoker()?;

    // ── Step 2: Extract text ─────────────────────────────────────────────
    let extractor = config.resolve_text_extractor();
    let document_text = pdf::extract_text_blocking(extractor, bytes.to_vec()).await?;
    if text::is_blank(&document_text) {
        return Err(ExtractError::NoExtractableText);
    }
    debug!("Extracted {} chars of text", document_text.chars().count());

    // ── Step 3: Bound text and compose prompts ───────────────────────────
    let context = text::prepare(
        &document_text,
        PrepareMode::Extraction {
            max_chars: config.context_chars,
        },
    );
    let prompts = prompts::extraction_prompts(context);

    // ── Step 4: Call the model and validate ──────────────────────────────
    let variables = run_model(invoker.as_ref(), &prompts, "Initial Analysis").await?;

    info!(
        "Extraction complete: {} variables from {} in {}ms",
        variables.len(),
        filename,
        total_start.elapsed().as_millis()
    );

    Ok(AnalysisResult {
        variables,
        filename,
        content_type,
        size_bytes: bytes.len() as u64,
        document_text,
    })
}

/// Extract variables from a PDF on disk.
///
/// The filename is taken from the path and the content type from the file's
/// leading bytes (`%PDF`), so a non-PDF file fails with
/// [`ExtractError::InvalidContentType`] before any text extraction.
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &ExtractorConfig,
) -> Result<AnalysisResult, ExtractError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| ExtractError::UnreadablePdf {
        detail: format!("{}: {}", path.display(), e),
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    extract(&bytes, filename, sniff_content_type(&bytes), config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    bytes: &[u8],
    filename: impl Into<String>,
    content_type: impl Into<String>,
    config: &ExtractorConfig,
) -> Result<AnalysisResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(bytes, filename, content_type, config))
}

/// Complete the caller's variable list against the full document text.
///
/// The result has exactly as many variables as `request.current_variables`,
/// in the same order. Rows the model fills in are replaced by the model's
/// record; rows it skips are returned unchanged.
///
/// # Errors
/// - [`ExtractError::EmptyDocumentText`] / [`ExtractError::EmptyVariables`]
///   for an incomplete request
/// - [`ExtractError::Upstream`] / [`ExtractError::ModelNotFound`] when the
///   model call fails
/// - [`ExtractError::InvalidModelOutput`] when the answer is not a valid
///   variable array
pub async fn refine(
    request: &RefinementRequest,
    config: &ExtractorConfig,
) -> Result<AnalysisResult, ExtractError> {
    let total_start = Instant::now();

    if text::is_blank(&request.document_text) {
        return Err(ExtractError::EmptyDocumentText);
    }
    if request.current_variables.is_empty() {
        return Err(ExtractError::EmptyVariables);
    }
    info!(
        "Current variables count for refinement: {}",
        request.current_variables.len()
    );

    let invoker = config.resolve_invoker()?;
    let full_text = text::prepare(&request.document_text, PrepareMode::Refinement);
    let prompts = prompts::refinement_prompts(full_text, &request.current_variables)?;

    let refined = run_model(invoker.as_ref(), &prompts, "Refinement").await?;
    if refined.len() != request.current_variables.len() {
        debug!(
            "Model returned {} variables for {} inputs",
            refined.len(),
            request.current_variables.len()
        );
    }

    let outcome = merge_refined(&request.current_variables, refined);
    info!(
        "Refinement successful: {} variables ({} refined, {} kept) in {}ms",
        outcome.variables.len(),
        outcome.matched,
        outcome.retained,
        total_start.elapsed().as_millis()
    );

    Ok(AnalysisResult::refined(
        outcome.variables,
        request.document_text.clone(),
    ))
}

/// Synchronous wrapper around [`refine`].
pub fn refine_sync(
    request: &RefinementRequest,
    config: &ExtractorConfig,
) -> Result<AnalysisResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(refine(request, config))
}

/// Whether a declared media type denotes PDF. Parameters are ignored.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}

/// Media type of `bytes` judged by the `%PDF` magic.
fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        PDF_CONTENT_TYPE
    } else {
        "application/octet-stream"
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Send `prompts` with the variable-list schema and validate the answer.
async fn run_model(
    invoker: &dyn ModelInvoker,
    prompts: &PromptPair,
    stage: &str,
) -> Result<Vec<Variable>, ExtractError> {
    let llm_start = Instant::now();
    let raw = invoker
        .generate(&prompts.system, &prompts.user, variable_list_schema())
        .await?;
    debug!("[{}] Model call took {}ms", stage, llm_start.elapsed().as_millis());

    validate::parse_variables(&raw).map_err(|e| {
        error!("[{}] Failed to validate structured JSON from model: {}", stage, e);
        ExtractError::InvalidModelOutput(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_check() {
        assert!(is_pdf_content_type("application/pdf"));
        assert!(is_pdf_content_type("Application/PDF"));
        assert!(is_pdf_content_type("application/pdf; charset=binary"));
        assert!(!is_pdf_content_type("application/x-pdf-but-not"));
        assert!(!is_pdf_content_type("image/png"));
        assert!(!is_pdf_content_type(""));
    }

    use crate::pipeline::llm::ModelInvoker;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct Canned(&'static str);

    #[async_trait]
    impl ModelInvoker for Canned {
        async fn generate(&self, _: &str, _: &str, _: &Value) -> Result<String, ExtractError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn refine_checks_request_before_model() {
        // No invoker and no reachable host: the request check must fire first.
        let config = ExtractorConfig::builder().host("http://127.0.0.1:9").build().unwrap();
        let request = RefinementRequest::new("Invoice Date: 2023-10-25", vec![]);
        let err = tokio_test::block_on(refine(&request, &config)).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyVariables), "got {err:?}");
    }

    #[test]
    fn refine_sync_runs_full_pipeline() {
        let config = ExtractorConfig::builder()
            .invoker(Arc::new(Canned(
                r#"[{"field_name":"Discount","value":"10%","type":"percentage","description":"Applied discount rate"}]"#,
            )))
            .build()
            .unwrap();
        let request = RefinementRequest::new(
            "Discount: 10%",
            vec![Variable::placeholder("discount"), Variable::placeholder("Total")],
        );

        let result = refine_sync(&request, &config).unwrap();

        assert_eq!(result.variables.len(), 2);
        assert_eq!(result.variables[0].value, "10%");
        assert_eq!(result.variables[1], Variable::placeholder("Total"));
        assert_eq!(result.filename, crate::output::REFINED_FILENAME);
    }

    #[test]
    fn extract_sync_rejects_non_pdf() {
        let config = ExtractorConfig::builder()
            .invoker(Arc::new(Canned("[]")))
            .build()
            .unwrap();
        let err = extract_sync(b"GIF89a", "a.gif", "image/gif", &config).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidContentType { .. }), "got {err:?}");
    }

    #[test]
    fn sniff_pdf_magic() {
        assert_eq!(sniff_content_type(b"%PDF-1.7\n..."), PDF_CONTENT_TYPE);
        assert_eq!(sniff_content_type(b"PK\x03\x04"), "application/octet-stream");
        assert_eq!(sniff_content_type(b""), "application/octet-stream");
    }
}
