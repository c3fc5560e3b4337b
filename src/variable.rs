//! The variable entity and the refinement request that carries it.

use serde::{Deserialize, Serialize};

/// `type` value given to rows a caller adds by hand before refining.
pub const USER_ADDED_TYPE: &str = "user_added_field";

/// `description` value given to rows a caller adds by hand before refining.
pub const USER_ADDED_DESCRIPTION: &str =
    "New variable added by user. Click Refine to fill details.";

/// One extracted data point.
///
/// All four fields are required strings on the wire; a JSON object missing any
/// of them, or holding a non-string in one, does not deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Category or title of the data point, e.g. `"Invoice Date"`.
    pub field_name: String,
    /// The literal value found in the document, e.g. `"2023-10-25"`.
    pub value: String,
    /// Free-form type tag such as `"date"`, `"percentage"` or `"string"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short explanation of the data point's context.
    pub description: String,
}

impl Variable {
    /// Wire names of the four fields, in schema order.
    pub const FIELD_NAMES: [&'static str; 4] = ["field_name", "value", "type", "description"];

    pub fn new(
        field_name: impl Into<String>,
        value: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// A caller-added row with only `field_name` meaningful, waiting for refinement.
    pub fn placeholder(field_name: impl Into<String>) -> Self {
        Self::new(field_name, "", USER_ADDED_TYPE, USER_ADDED_DESCRIPTION)
    }

    /// Merge identity: `field_name` trimmed and lower-cased.
    ///
    /// Returns `None` when the trimmed name is empty; such rows never match.
    pub fn identity_key(&self) -> Option<String> {
        normalize_field_name(&self.field_name)
    }
}

/// Normalise a field name to its merge identity.
pub fn normalize_field_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Input to the refinement path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    /// Full document text as returned by a previous extraction.
    pub document_text: String,
    /// The caller's current, possibly incomplete, variables in display order.
    pub current_variables: Vec<Variable>,
}

impl RefinementRequest {
    pub fn new(document_text: impl Into<String>, current_variables: Vec<Variable>) -> Self {
        Self {
            document_text: document_text.into(),
            current_variables,
        }
    }
}
