//! JSON Schema for the model's structured output.
//!
//! The schema is passed to Ollama as the `format` constraint so the model can
//! only emit an array of [`Variable`] objects. It is written out by hand from
//! [`Variable::FIELD_NAMES`] rather than derived from the Rust type, so the
//! wire contract stays visible in one place.

use crate::variable::Variable;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

/// Per-field descriptions shown to the model, in [`Variable::FIELD_NAMES`] order.
const FIELD_DESCRIPTIONS: [&str; 4] = [
    "The inferred Category or Field Name for the value (e.g., 'Geburtsdatum', 'Discount Rate', 'Performance Metric').",
    "The specific, extracted value or item found in the text (e.g., '21. November 2002', '10%', 'Maximum Load').",
    "The data type of the value (e.g., 'date', 'percentage', 'string').",
    "A concise explanation of the data point's context or significance from the document.",
];

static VARIABLE_LIST_SCHEMA: Lazy<Value> = Lazy::new(build_variable_list_schema);

/// Schema for a JSON array of variables.
pub fn variable_list_schema() -> &'static Value {
    &VARIABLE_LIST_SCHEMA
}

/// Schema for a single variable object.
pub fn variable_schema() -> Value {
    let mut properties = Map::new();
    for (name, description) in Variable::FIELD_NAMES.iter().zip(FIELD_DESCRIPTIONS) {
        properties.insert(
            (*name).to_string(),
            json!({ "type": "string", "description": description }),
        );
    }

    json!({
        "type": "object",
        "title": "Variable",
        "properties": properties,
        "required": Variable::FIELD_NAMES,
        "additionalProperties": false,
    })
}

fn build_variable_list_schema() -> Value {
    json!({
        "type": "array",
        "items": variable_schema(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_schema_is_array_of_objects() {
        let schema = variable_list_schema();
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["type"], "object");
        assert_eq!(schema["items"]["additionalProperties"], false);
    }

    #[test]
    fn every_field_is_a_required_string() {
        let item = &variable_list_schema()["items"];
        let required: Vec<&str> = item["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, Variable::FIELD_NAMES);

        let props = item["properties"].as_object().unwrap();
        assert_eq!(props.len(), 4);
        for name in Variable::FIELD_NAMES {
            assert_eq!(props[name]["type"], "string", "field {name}");
            assert!(props[name]["description"].as_str().is_some_and(|d| !d.is_empty()));
        }
    }

    #[test]
    fn schema_is_deterministic() {
        assert_eq!(variable_schema(), variable_schema());
        assert_eq!(
            serde_json::to_string(variable_list_schema()).unwrap(),
            serde_json::to_string(&build_variable_list_schema()).unwrap()
        );
    }
}
