//! # pdf2vars
//!
//! Extract structured variables from PDF documents with a locally hosted
//! language model, then refine them iteratively against the document text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Text     pdfium text extraction (spawn_blocking, page cap)
//!  ├─ 2. Window   first 10 000 chars for extraction, full text for refinement
//!  ├─ 3. Prompt   system + user prompt, JSON Schema for Variable[]
//!  ├─ 4. Model    Ollama /api/generate, temperature 0, schema as `format`
//!  ├─ 5. Validate strict JSON array of {field_name, value, type, description}
//!  └─ 6. Merge    refinement only: by field name, input order and count kept
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2vars::{extract_file, refine, ExtractorConfig, RefinementRequest, Variable};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractorConfig::builder().model("llama3").build()?;
//!
//!     let first = extract_file("invoice.pdf", &config).await?;
//!     for v in &first.variables {
//!         println!("{}: {}", v.field_name, v.value);
//!     }
//!
//!     // Add a field the first pass missed and let the model fill it in.
//!     let mut vars = first.variables.clone();
//!     vars.push(Variable::placeholder("Discount"));
//!     let refined = refine(&RefinementRequest::new(first.document_text, vars), &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&refined)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2vars` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod variable;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use error::{ErrorClass, ExtractError, ValidationError};
pub use extract::{extract, extract_file, extract_sync, refine, refine_sync};
pub use output::AnalysisResult;
pub use pipeline::llm::{ModelInvoker, OllamaInvoker};
pub use pipeline::merge::{merge_refined, MergeOutcome};
pub use pipeline::pdf::{PdfiumTextExtractor, TextExtractor};
pub use schema::variable_list_schema;
pub use variable::{RefinementRequest, Variable};
