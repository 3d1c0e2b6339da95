//! # knowledge-types
//!
//! Shared domain types for the agent knowledge & memory subsystem.
//!
//! This crate defines the entities persisted by the storage layer and
//! exchanged between components:
//! - Documents and their bounded-size chunks
//! - Conversations and messages (including synthetic compressed messages)
//! - Knowledge domains and document-domain mappings
//! - Topic clusters over conversations
//! - Importance score breakdowns and compression records

pub mod cluster;
pub mod compression;
pub mod conversation;
pub mod document;
pub mod domain;
pub mod score;

pub use cluster::Cluster;
pub use compression::{CompressionRecord, CompressionTier, TierBreakdown};
pub use conversation::{
    Conversation, ConversationSource, Message, MessageMetadata, MessageRole, SyntheticKind,
};
pub use document::{Chunk, Document, DocumentType};
pub use domain::{DocumentDomainMap, DomainRecord, KnowledgeDomain};
pub use score::ScoreBreakdown;
