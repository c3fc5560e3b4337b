//! Configuration for extraction and refinement.
//!
//! All pipeline behaviour is controlled through [`ExtractorConfig`], built via
//! [`ExtractorConfigBuilder`]. The model endpoint is part of this value and is
//! passed explicitly into every call; nothing is held in process-wide state.

use crate::error::ExtractError;
use crate::pipeline::llm::{self, ModelInvoker, OllamaInvoker, DEFAULT_MODEL};
use crate::pipeline::pdf::{PdfiumTextExtractor, TextExtractor, DEFAULT_CHAR_CAP, DEFAULT_PAGE_CAP};
use crate::pipeline::text::DEFAULT_CONTEXT_CHARS;
use std::fmt;
use std::sync::Arc;

/// Configuration for extract and refine calls.
///
/// # Example
/// ```rust
/// use pdf2vars::ExtractorConfig;
///
/// let config = ExtractorConfig::builder()
///     .host("http://localhost:11434")
///     .model("llama3")
///     .context_chars(8_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Ollama address. If None, uses `OLLAMA_HOST` or `http://127.0.0.1:11434`.
    pub host: Option<String>,

    /// Model name. Default: `llama3`.
    pub model: String,

    /// Characters of document text the extraction pass sees. Default: 10 000.
    ///
    /// Refinement always sees the full text.
    pub context_chars: usize,

    /// Pages read before the text-extraction cap can apply. Default: 50.
    pub page_cap: usize,

    /// Characters collected before the text-extraction cap can apply. Default: 20 000.
    pub char_cap: usize,

    /// Per-model-call timeout in seconds. Default: None (wait indefinitely).
    ///
    /// Local inference on a long document can take minutes; callers that need
    /// a bound should set one here or cancel the future themselves.
    pub api_timeout_secs: Option<u64>,

    /// Pre-constructed model invoker. Takes precedence over `host`/`model`.
    pub invoker: Option<Arc<dyn ModelInvoker>>,

    /// Pre-constructed text extractor. Takes precedence over the pdfium default.
    pub text_extractor: Option<Arc<dyn TextExtractor>>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            host: None,
            model: DEFAULT_MODEL.to_string(),
            context_chars: DEFAULT_CONTEXT_CHARS,
            page_cap: DEFAULT_PAGE_CAP,
            char_cap: DEFAULT_CHAR_CAP,
            api_timeout_secs: None,
            invoker: None,
            text_extractor: None,
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("host", &self.host)
            .field("model", &self.model)
            .field("context_chars", &self.context_chars)
            .field("page_cap", &self.page_cap)
            .field("char_cap", &self.char_cap)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("invoker", &self.invoker.as_ref().map(|_| "<dyn ModelInvoker>"))
            .field(
                "text_extractor",
                &self.text_extractor.as_ref().map(|_| "<dyn TextExtractor>"),
            )
            .finish()
    }
}

impl ExtractorConfig {
    /// Create a new builder for `ExtractorConfig`.
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the model invoker: the injected one, else Ollama at `host`.
    pub(crate) fn resolve_invoker(&self) -> Result<Arc<dyn ModelInvoker>, ExtractError> {
        if let Some(ref invoker) = self.invoker {
            return Ok(Arc::clone(invoker));
        }
        let host = match self.host {
            Some(ref h) => llm::normalize_host(h),
            None => llm::host_from_env(),
        };
        let invoker = OllamaInvoker::with_timeout(&host, &self.model, self.api_timeout_secs)?;
        Ok(Arc::new(invoker))
    }

    /// Resolve the text extractor: the injected one, else pdfium with this config's caps.
    pub(crate) fn resolve_text_extractor(&self) -> Arc<dyn TextExtractor> {
        match self.text_extractor {
            Some(ref extractor) => Arc::clone(extractor),
            None => Arc::new(PdfiumTextExtractor::new(self.page_cap, self.char_cap)),
        }
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn context_chars(mut self, n: usize) -> Self {
        self.config.context_chars = n;
        self
    }

    pub fn page_cap(mut self, n: usize) -> Self {
        self.config.page_cap = n;
        self
    }

    pub fn char_cap(mut self, n: usize) -> Self {
        self.config.char_cap = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.config.invoker = Some(invoker);
        self
    }

    pub fn text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.text_extractor = Some(extractor);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractorConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() && c.invoker.is_none() {
            return Err(ExtractError::InvalidConfig("Model name must not be empty".into()));
        }
        if c.context_chars == 0 {
            return Err(ExtractError::InvalidConfig(
                "Context window must be ≥ 1 character".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
