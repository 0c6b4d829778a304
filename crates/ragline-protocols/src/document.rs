//! Source document types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Free-form string metadata attached to a document and carried
/// verbatim onto every passage derived from it.
pub type Metadata = HashMap<String, String>;

/// A raw unit of text submitted for ingestion, before chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full text content.
    pub text: String,
    /// Provenance metadata (e.g. source, page number).
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata key/value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
