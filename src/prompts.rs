//! System and user prompts for variable extraction and refinement.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect the text without a running model.
//!
//! Both system prompts forbid markdown and code fences around the answer:
//! [`crate::pipeline::validate`] parses the raw response directly and does not
//! strip anything but surrounding whitespace.

use crate::error::ExtractError;
use crate::variable::Variable;

/// System prompt for the first, exhaustive extraction pass.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert **General Data Extraction** tool. Your task is to perform an **EXHAUSTIVE** analysis of the provided document text and extract **ALL** structured data points.

**CRITICAL RULE FOR EXTRACTION:**
1.  **Output Format:** The final output MUST be a **single, valid JSON ARRAY** of objects, strictly conforming to the provided schema. Do not include any text, markdown, or code block delimiters outside the JSON array itself.
2.  **Field Definitions:**
    * **field_name**: The title/category of the data (e.g., 'Invoice Date', 'Total Price').
    * **value**: The exact data point found in the document (e.g., '2023-10-25', '£1,500.00').
    * **type**: The data type of the value (e.g., 'date', 'percentage', 'string').
    * **description**: A concise explanation of the data point's context in the document.

Generate the JSON ARRAY based ONLY on the provided document text:"#;

/// System prompt for completing a caller-edited variable list.
pub const REFINEMENT_SYSTEM_PROMPT: &str = r#"You are an expert **Data Refinement and Completion** tool.
Your task is to review the provided **DOCUMENT TEXT** and a **PARTIALLY COMPLETED JSON ARRAY** of variables.
You MUST analyze the document text to complete or correct the variables in the array.

**RULES FOR COMPLETION (STRICT JSON SCHEMA):**
1.  **Output Format:** The final output MUST be a **single, valid JSON ARRAY** of **all** variables, strictly conforming to the provided JSON schema.
2.  **No Wrapping:** Do not include any text, markdown, or code block delimiters outside the JSON array itself.
3.  **Completion Logic (STRICT):**
    * Only return the variables provided in the input array. **DO NOT ADD OR REMOVE ANY VARIABLES.**
    * The output array MUST contain exactly the same number of variables as the input array.
    * For existing variables, or for new variables added by the user (which may only have a `field_name`), use the document text to fill in all missing or placeholder fields (`value`, `type`, and `description`).
    * Keep each `field_name` exactly as given.
    * Preserve the exact order of the input array.

Generate the **COMPLETED/REFINED** JSON ARRAY now:"#;

/// A composed system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Prompts for the extraction pass over an already bounded text window.
pub fn extraction_prompts(context_text: &str) -> PromptPair {
    PromptPair {
        system: EXTRACTION_SYSTEM_PROMPT.to_string(),
        user: format!(
            "\nDocument Text:\n---\n{context_text}\n---\n\
Extract all relevant variables, parameters, or fields and present them as a JSON array now:\n"
        ),
    }
}

/// Prompts for refining `current` against the full document text.
///
/// The variables are embedded as pretty-printed JSON in their given order.
pub fn refinement_prompts(
    document_text: &str,
    current: &[Variable],
) -> Result<PromptPair, ExtractError> {
    let variables_json = serde_json::to_string_pretty(current)
        .map_err(|e| ExtractError::Internal(format!("Failed to serialise variables: {e}")))?;

    Ok(PromptPair {
        system: REFINEMENT_SYSTEM_PROMPT.to_string(),
        user: format!(
            "\nDocument Text (Full context for deep analysis):\n---\n{document_text}\n---\n\n\
Current Variables Array to Refine:\n---\n{variables_json}\n---\n"
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompts_forbid_wrapping() {
        for prompt in [EXTRACTION_SYSTEM_PROMPT, REFINEMENT_SYSTEM_PROMPT] {
            assert!(prompt.contains("JSON ARRAY"));
            assert!(prompt.contains("code block delimiters"));
        }
    }

    #[test]
    fn refinement_prompt_forbids_adding_or_removing() {
        assert!(REFINEMENT_SYSTEM_PROMPT.contains("DO NOT ADD OR REMOVE ANY VARIABLES"));
        assert!(REFINEMENT_SYSTEM_PROMPT.contains("Preserve the exact order"));
    }

    #[test]
    fn extraction_user_prompt_embeds_text() {
        let p = extraction_prompts("Invoice Date: 2023-10-25");
        assert_eq!(p.system, EXTRACTION_SYSTEM_PROMPT);
        assert!(p.user.contains("---\nInvoice Date: 2023-10-25\n---"));
        assert!(p.user.contains("as a JSON array now"));
    }

    #[test]
    fn refinement_user_prompt_embeds_text_and_variables_in_order() {
        let vars = vec![
            Variable::placeholder("Discount"),
            Variable::new("Total Price", "£1,500.00", "currency", "Amount due"),
        ];
        let p = refinement_prompts("full text here", &vars).unwrap();
        assert_eq!(p.system, REFINEMENT_SYSTEM_PROMPT);
        assert!(p.user.contains("full text here"));

        let discount = p.user.find("\"Discount\"").unwrap();
        let total = p.user.find("\"Total Price\"").unwrap();
        assert!(discount < total);
        assert!(p.user.contains("\"type\": \"user_added_field\""));
    }

    #[test]
    fn prompts_are_deterministic() {
        let vars = vec![Variable::placeholder("A")];
        assert_eq!(extraction_prompts("x"), extraction_prompts("x"));
        assert_eq!(
            refinement_prompts("x", &vars).unwrap(),
            refinement_prompts("x", &vars).unwrap()
        );
    }
}
