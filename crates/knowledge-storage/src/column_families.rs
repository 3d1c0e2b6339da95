//! Column family definitions for RocksDB.
//!
//! Each column family isolates one logical table:
//! - documents / chunks: knowledge-store content (compressed, read-mostly)
//! - conversations / messages: conversation history
//! - message_backups / message_archive: compressor backup and ancient-tier
//!   archive stores
//! - clusters / conversation_tags: clustering output
//! - importance_scores: score breakdowns
//! - domains / doc_domains / conversation_scopes: domain access control
//! - audit_log: domain-aware query and god-mode grant audit trail

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family for document rows
pub const CF_DOCUMENTS: &str = "documents";

/// Column family for chunk rows (content + binary embedding)
pub const CF_CHUNKS: &str = "chunks";

/// Column family for conversation rows
pub const CF_CONVERSATIONS: &str = "conversations";

/// Column family for active message history
pub const CF_MESSAGES: &str = "messages";

/// Column family for pre-compression message backups
pub const CF_MESSAGE_BACKUPS: &str = "message_backups";

/// Column family for ancient-tier archived messages
pub const CF_MESSAGE_ARCHIVE: &str = "message_archive";

/// Column family for cluster records
pub const CF_CLUSTERS: &str = "clusters";

/// Column family for auto-tags written by clustering
pub const CF_CONVERSATION_TAGS: &str = "conversation_tags";

/// Column family for importance score breakdowns
pub const CF_IMPORTANCE_SCORES: &str = "importance_scores";

/// Column family for the domain registry
pub const CF_DOMAINS: &str = "domains";

/// Column family for document-domain mappings
pub const CF_DOC_DOMAINS: &str = "doc_domains";

/// Column family for per-conversation domain scope + god-mode grants
pub const CF_CONVERSATION_SCOPES: &str = "conversation_scopes";

/// Column family for the access audit log
pub const CF_AUDIT_LOG: &str = "audit_log";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_DOCUMENTS,
    CF_CHUNKS,
    CF_CONVERSATIONS,
    CF_MESSAGES,
    CF_MESSAGE_BACKUPS,
    CF_MESSAGE_ARCHIVE,
    CF_CLUSTERS,
    CF_CONVERSATION_TAGS,
    CF_IMPORTANCE_SCORES,
    CF_DOMAINS,
    CF_DOC_DOMAINS,
    CF_CONVERSATION_SCOPES,
    CF_AUDIT_LOG,
];

/// Options for bulky text content (documents, chunks, messages).
fn content_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Options for the append-only audit log.
fn audit_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors.
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_DOCUMENTS, content_options()),
        ColumnFamilyDescriptor::new(CF_CHUNKS, content_options()),
        ColumnFamilyDescriptor::new(CF_CONVERSATIONS, Options::default()),
        ColumnFamilyDescriptor::new(CF_MESSAGES, content_options()),
        ColumnFamilyDescriptor::new(CF_MESSAGE_BACKUPS, content_options()),
        ColumnFamilyDescriptor::new(CF_MESSAGE_ARCHIVE, content_options()),
        ColumnFamilyDescriptor::new(CF_CLUSTERS, Options::default()),
        ColumnFamilyDescriptor::new(CF_CONVERSATION_TAGS, Options::default()),
        ColumnFamilyDescriptor::new(CF_IMPORTANCE_SCORES, Options::default()),
        ColumnFamilyDescriptor::new(CF_DOMAINS, Options::default()),
        ColumnFamilyDescriptor::new(CF_DOC_DOMAINS, Options::default()),
        ColumnFamilyDescriptor::new(CF_CONVERSATION_SCOPES, Options::default()),
        ColumnFamilyDescriptor::new(CF_AUDIT_LOG, audit_options()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_count_matches_names() {
        assert_eq!(build_cf_descriptors().len(), ALL_CF_NAMES.len());
    }
}
