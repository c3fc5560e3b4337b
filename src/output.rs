//! The response envelope returned by both extraction and refinement.

use crate::variable::Variable;
use serde::{Deserialize, Serialize};

/// Filename reported for refinement results, which have no uploaded file.
pub const REFINED_FILENAME: &str = "Refined Data";

/// Content type reported for refinement results.
pub const REFINED_CONTENT_TYPE: &str = "application/json";

/// Result of an extract or refine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Variables in meaningful order.
    pub variables: Vec<Variable>,
    pub filename: String,
    pub content_type: String,
    /// Size of the uploaded document; `0` for refinement.
    pub size_bytes: u64,
    /// Full extracted text, returned so the caller can refine later.
    pub document_text: String,
}

impl AnalysisResult {
    /// Envelope for a refinement result.
    pub fn refined(variables: Vec<Variable>, document_text: impl Into<String>) -> Self {
        Self {
            variables,
            filename: REFINED_FILENAME.to_string(),
            content_type: REFINED_CONTENT_TYPE.to_string(),
            size_bytes: 0,
            document_text: document_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_has_fixed_field_names() {
        let r = AnalysisResult {
            variables: vec![Variable::new("Invoice Date", "2023-10-25", "date", "Date of invoice")],
            filename: "invoice.pdf".into(),
            content_type: "application/pdf".into(),
            size_bytes: 1024,
            document_text: "Invoice Date: 2023-10-25".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        for key in ["variables", "filename", "content_type", "size_bytes", "document_text"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["size_bytes"], 1024);
        assert_eq!(json["variables"][0]["field_name"], "Invoice Date");
    }

    #[test]
    fn refined_envelope() {
        let r = AnalysisResult::refined(vec![], "text");
        assert_eq!(r.filename, REFINED_FILENAME);
        assert_eq!(r.content_type, REFINED_CONTENT_TYPE);
        assert_eq!(r.size_bytes, 0);
        assert_eq!(r.document_text, "text");
    }
}
