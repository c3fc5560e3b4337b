//! Error types for the pdf2vars library.
//!
//! Two error types reflect two layers of failure:
//!
//! * [`ExtractError`] is **fatal**: the extract or refine call cannot produce a
//!   result. Every public entry point returns `Err(ExtractError)`; there is no
//!   partial-success mode.
//!
//! * [`ValidationError`] is the specific reason a model response was rejected
//!   by [`crate::pipeline::validate`]. It is carried inside
//!   [`ExtractError::InvalidModelOutput`] so callers can log the exact cause.
//!
//! [`ErrorClass`] groups the variants into the four categories a transport
//! layer needs to decide between a client-side and a server-side failure.

use thiserror::Error;

/// All fatal errors returned by the pdf2vars library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded document is not declared as a PDF.
    #[error("Invalid file type '{content_type}'. Only PDF files are accepted.")]
    InvalidContentType { content_type: String },

    /// The PDF was readable but produced no usable text.
    #[error("The PDF contains no extractable text.")]
    NoExtractableText,

    /// Refinement was requested with empty document text.
    #[error("Missing document text for refinement.")]
    EmptyDocumentText,

    /// Refinement was requested with an empty variable list.
    #[error("Missing variable list for refinement.")]
    EmptyVariables,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// pdfium could not open or read the document.
    #[error("Could not read PDF file content: {detail}")]
    UnreadablePdf { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium on the library search path."
    )]
    PdfiumUnavailable(String),

    // ── Model output errors ───────────────────────────────────────────────
    /// The model answered, but not with a valid variable array.
    #[error("AI returned an invalid structured output: {0}")]
    InvalidModelOutput(#[from] ValidationError),

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The model endpoint was unreachable, timed out, or returned an error.
    #[error("Model endpoint error: {message}")]
    Upstream { message: String },

    /// The endpoint answered 404 for the configured model.
    #[error("Model '{model}' is not available on the endpoint.\nTry: ollama pull {model}")]
    ModelNotFound { model: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a model response failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The response text is not JSON.
    #[error("response is not valid JSON: {0}")]
    Parse(String),

    /// The response is JSON, but not an array.
    #[error("expected a JSON array of variables, got {found}")]
    NotAnArray { found: &'static str },

    /// An array element violates the variable contract.
    #[error("element {index} is not a valid variable: {detail}")]
    InvalidElement { index: usize, detail: String },
}

/// Broad failure category of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller violated a precondition.
    Input,
    /// The document could not be turned into text.
    Extraction,
    /// The model response failed parsing or schema validation.
    ModelOutput,
    /// The model endpoint failed.
    Upstream,
    /// Anything else.
    Internal,
}

impl ExtractError {
    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ExtractError::InvalidContentType { .. }
            | ExtractError::NoExtractableText
            | ExtractError::EmptyDocumentText
            | ExtractError::EmptyVariables
            | ExtractError::InvalidConfig(_) => ErrorClass::Input,
            ExtractError::UnreadablePdf { .. } | ExtractError::PdfiumUnavailable(_) => {
                ErrorClass::Extraction
            }
            ExtractError::InvalidModelOutput(_) => ErrorClass::ModelOutput,
            ExtractError::Upstream { .. } | ExtractError::ModelNotFound { .. } => {
                ErrorClass::Upstream
            }
            ExtractError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Whether the failure is the caller's fault (bad input or an unusable document).
    ///
    /// A missing pdfium library is a deployment problem, not a bad document.
    pub fn is_client_error(&self) -> bool {
        match self.class() {
            ErrorClass::Input => true,
            ErrorClass::Extraction => matches!(self, ExtractError::UnreadablePdf { .. }),
            _ => false,
        }
    }

    /// HTTP status an outer transport should answer with.
    pub fn http_status(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}
