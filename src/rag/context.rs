//! Context assembly.
//!
//! Joins retrieved passages into one bounded block of prompt context. A
//! passage is either included whole or not at all.

use serde::{Deserialize, Serialize};

use crate::types::RetrievedPassage;

/// Default separator between passages.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Concatenates passages under a character budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextAssembler {
    pub separator: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ContextAssembler {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Join passage texts in order, keeping the longest prefix whose total
    /// length (separators included) is at most `max_chars`.
    ///
    /// Length counts Unicode scalar values, not bytes.
    pub fn assemble(&self, results: &[RetrievedPassage], max_chars: usize) -> String {
        let separator_len = self.separator.chars().count();
        let mut context = String::new();
        let mut used = 0usize;

        for (i, passage) in results.iter().enumerate() {
            let extra = if i == 0 { 0 } else { separator_len };
            let needed = extra + passage.text.chars().count();
            if used + needed > max_chars {
                break;
            }
            if i > 0 {
                context.push_str(&self.separator);
            }
            context.push_str(&passage.text);
            used += needed;
        }

        context
    }
}
