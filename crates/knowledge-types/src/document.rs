//! Document and chunk types.
//!
//! Documents are the unit of ingestion; chunks are the unit of embedding
//! and retrieval. Both are soft-deleted, never hard-removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Free-form note
    Note,
    /// Operational manual or runbook
    Manual,
    /// Generated report
    Report,
    /// Conversation transcript
    Transcript,
    /// Scraped or uploaded web content
    Web,
    /// Anything else
    Other,
}

impl DocumentType {
    /// Short code used in filters and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Note => "note",
            DocumentType::Manual => "manual",
            DocumentType::Report => "report",
            DocumentType::Transcript => "transcript",
            DocumentType::Web => "web",
            DocumentType::Other => "other",
        }
    }

    /// Parse from code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "note" => Some(DocumentType::Note),
            "manual" => Some(DocumentType::Manual),
            "report" => Some(DocumentType::Report),
            "transcript" => Some(DocumentType::Transcript),
            "web" => Some(DocumentType::Web),
            "other" => Some(DocumentType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (ULID)
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Full text content
    pub content: String,
    /// Document kind
    pub doc_type: DocumentType,
    /// Where the document came from (upload path, URL, agent name)
    pub source: Option<String>,
    /// Free-form side data, opaque to everything but the caller
    pub metadata: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last content/field update
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a new document with current timestamps.
    pub fn new(
        id: String,
        title: String,
        content: String,
        doc_type: DocumentType,
        source: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            content,
            doc_type,
            source,
            metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Check whether the document is live (not soft-deleted).
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A bounded-size slice of a document's text.
///
/// Chunk content always satisfies the chunker's min/max bounds, and the
/// index is unique within its parent document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (ULID)
    pub id: String,
    /// Parent document id
    pub document_id: String,
    /// Position within the document (0-based, paragraph order)
    pub index: u32,
    /// Chunk text
    pub content: String,
    /// Whether an embedding was successfully generated for this chunk.
    /// Chunks without embeddings are persisted but excluded from vector
    /// search until retried.
    pub embedding_generated: bool,
    /// Binary-encoded embedding vector (little-endian f32), if generated
    #[serde(default)]
    pub embedding: Option<Vec<u8>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker, set together with the parent document's
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Chunk {
    /// Create a new chunk without an embedding.
    pub fn new(id: String, document_id: String, index: u32, content: String) -> Self {
        Self {
            id,
            document_id,
            index,
            content,
            embedding_generated: false,
            embedding: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Check whether the chunk is live (not soft-deleted).
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}
