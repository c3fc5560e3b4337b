//! Merge refined variables back into the caller's list.
//!
//! The model is told not to add, drop or reorder variables, but nothing forces
//! it to comply. This stage is where count and order are actually guaranteed:
//! the output always has one entry per input entry, in input order.
//!
//! Matching uses the normalised `field_name` (trimmed, lower-cased). A matched
//! input row is replaced by the model's full record, including the model's
//! spelling of `field_name`. Unmatched rows, including rows with an empty
//! name, are kept exactly as the caller sent them.

use crate::variable::Variable;
use std::collections::HashMap;

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Final variables, same length and order as the input.
    pub variables: Vec<Variable>,
    /// Input rows replaced by a model record.
    pub matched: usize,
    /// Input rows kept unchanged.
    pub retained: usize,
}

/// Merge `refined` (model output) into `input` (caller list).
///
/// When the model returns two entries with the same normalised name, the later
/// one wins.
pub fn merge_refined(input: &[Variable], refined: Vec<Variable>) -> MergeOutcome {
    let mut by_key: HashMap<String, Variable> = HashMap::with_capacity(refined.len());
    for var in refined {
        if let Some(key) = var.identity_key() {
            by_key.insert(key, var);
        }
    }

    let mut matched = 0;
    let variables: Vec<Variable> = input
        .iter()
        .map(|original| {
            match original.identity_key().and_then(|key| by_key.get(&key)) {
                Some(replacement) => {
                    matched += 1;
                    replacement.clone()
                }
                None => original.clone(),
            }
        })
        .collect();

    MergeOutcome {
        retained: variables.len() - matched,
        variables,
        matched,
    }
}
