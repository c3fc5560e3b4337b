//! Response validation: turn raw model text into variables or reject it.
//!
//! Validation is all-or-nothing. A response with one bad element is discarded
//! entirely; there is no fence stripping, no coercion of numbers into strings,
//! and no skipping of malformed entries.

use crate::error::ValidationError;
use crate::variable::Variable;
use serde_json::Value;
use tracing::debug;

/// Parse `raw` as a JSON array of [`Variable`] objects.
///
/// Surrounding whitespace is ignored. Extra keys on an element are dropped.
pub fn parse_variables(raw: &str) -> Result<Vec<Variable>, ValidationError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ValidationError::Parse(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ValidationError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    let variables = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Variable>(item).map_err(|e| {
                ValidationError::InvalidElement {
                    index,
                    detail: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Validated {} variables", variables.len());
    Ok(variables)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_array_parses() {
        let raw = r#"  [{"field_name":"Invoice Date","value":"2023-10-25","type":"date","description":"Date of invoice"}]
        "#;
        let vars = parse_variables(raw).unwrap();
        assert_eq!(
            vars,
            vec![Variable::new("Invoice Date", "2023-10-25", "date", "Date of invoice")]
        );
    }

    #[test]
    fn empty_array_is_valid() {
        assert_eq!(parse_variables("[]").unwrap(), Vec::<Variable>::new());
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = parse_variables("Here are the variables you asked for").unwrap_err();
        assert!(matches!(err, ValidationError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn fenced_json_is_rejected() {
        let raw = "```json\n[]\n```";
        assert!(matches!(parse_variables(raw), Err(ValidationError::Parse(_))));
    }

    #[test]
    fn object_is_not_an_array() {
        let raw = r#"{"field_name":"a","value":"b","type":"c","description":"d"}"#;
        assert_eq!(
            parse_variables(raw).unwrap_err(),
            ValidationError::NotAnArray { found: "an object" }
        );
    }

    #[test]
    fn element_missing_field_is_rejected_with_index() {
        let raw = r#"[
            {"field_name":"a","value":"b","type":"c","description":"d"},
            {"field_name":"a","value":"b","type":"c"}
        ]"#;
        match parse_variables(raw).unwrap_err() {
            ValidationError::InvalidElement { index, detail } => {
                assert_eq!(index, 1);
                assert!(detail.contains("description"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_field_is_rejected() {
        let raw = r#"[{"field_name":"Rate","value":10,"type":"percentage","description":"d"}]"#;
        assert!(matches!(
            parse_variables(raw),
            Err(ValidationError::InvalidElement { index: 0, .. })
        ));
    }

    #[test]
    fn null_field_is_rejected() {
        let raw = r#"[{"field_name":"Rate","value":null,"type":"percentage","description":"d"}]"#;
        assert!(parse_variables(raw).is_err());
    }

    #[test]
    fn non_object_element_is_rejected() {
        assert!(matches!(
            parse_variables(r#"["Invoice Date"]"#),
            Err(ValidationError::InvalidElement { index: 0, .. })
        ));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let raw = r#"[{"field_name":"a","value":"b","type":"c","description":"d","confidence":0.9}]"#;
        assert_eq!(parse_variables(raw).unwrap(), vec![Variable::new("a", "b", "c", "d")]);
    }
}
