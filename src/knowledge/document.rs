// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document model for the knowledge store.
//!
//! A document is a piece of embeddable text plus the metadata describing
//! where it came from. Metadata is an enum tagged by `source`, so every
//! document carries its source tag and exactly the fields that source
//! defines.

use serde::{Deserialize, Serialize};

/// Metadata attached to a document and to every chunk derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DocumentMetadata {
    /// A vulnerability record from the feed.
    Vulnerability {
        record_id: String,
        severity: String,
        score: f32,
        published_at: String,
    },
    /// An infrastructure asset description.
    Infrastructure {
        asset_name: String,
        asset_type: String,
    },
}

impl DocumentMetadata {
    /// The source tag as serialized.
    pub fn source(&self) -> &'static str {
        match self {
            DocumentMetadata::Vulnerability { .. } => "vulnerability",
            DocumentMetadata::Infrastructure { .. } => "infrastructure",
        }
    }
}

/// A unit of embeddable text with its provenance.
///
/// The chunker also produces `Document`s: a chunk is a fragment of the
/// parent's content carrying a verbatim copy of the parent's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}
