//! Default negative prompts keyed by model family and content mode.

use crate::generation::domain::ContentMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Family key matching every model family.
pub const WILDCARD_FAMILY: &str = "*";

/// One row of the negative-prompt table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativePromptEntry {
    /// Model family, or [`WILDCARD_FAMILY`].
    pub model_family: String,
    /// Content mode the prompt applies to.
    pub content_mode: ContentMode,
    /// Negative prompt text.
    pub negative_prompt: String,
}

/// Lookup of default negative prompts.
///
/// An exact family match wins over the wildcard entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NegativePromptEntry>", into = "Vec<NegativePromptEntry>")]
pub struct NegativePromptTable {
    entries: HashMap<(String, ContentMode), String>,
}

impl NegativePromptTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(
        &mut self,
        model_family: impl Into<String>,
        content_mode: ContentMode,
        negative_prompt: impl Into<String>,
    ) {
        self.entries
            .insert((model_family.into(), content_mode), negative_prompt.into());
    }

    /// Returns the default negative prompt for a family and mode.
    #[must_use]
    pub fn lookup(&self, model_family: &str, content_mode: ContentMode) -> Option<&str> {
        self.entries
            .get(&(model_family.to_owned(), content_mode))
            .or_else(|| {
                self.entries
                    .get(&(WILDCARD_FAMILY.to_owned(), content_mode))
            })
            .map(String::as_str)
            .filter(|prompt| !prompt.trim().is_empty())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<NegativePromptEntry>> for NegativePromptTable {
    fn from(entries: Vec<NegativePromptEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.model_family, entry.content_mode, entry.negative_prompt);
        }
        table
    }
}

impl From<NegativePromptTable> for Vec<NegativePromptEntry> {
    fn from(table: NegativePromptTable) -> Self {
        let mut entries: Self = table
            .entries
            .into_iter()
            .map(|((model_family, content_mode), negative_prompt)| NegativePromptEntry {
                model_family,
                content_mode,
                negative_prompt,
            })
            .collect();
        entries.sort_by(|left, right| {
            (&left.model_family, left.content_mode).cmp(&(&right.model_family, right.content_mode))
        });
        entries
    }
}
