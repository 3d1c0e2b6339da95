//! Key encoding and decoding for the storage layer.
//!
//! Keys are plain-text, colon-separated, and zero-padded so lexicographic
//! order matches logical order. This enables prefix iteration for
//! per-document chunk scans and per-conversation, time-ordered message
//! scans.

use ulid::Ulid;

use crate::error::StorageError;

/// Key for a document row: `doc:{ulid}`
pub fn document_key(document_id: &str) -> String {
    format!("doc:{}", document_id)
}

/// Key for a chunk row: `chunk:{document_id}:{index:05}`
pub fn chunk_key(document_id: &str, index: u32) -> String {
    format!("chunk:{}:{:05}", document_id, index)
}

/// Prefix for all chunks of a document.
pub fn chunk_prefix(document_id: &str) -> String {
    format!("chunk:{}:", document_id)
}

/// Stable chunk reference used as the vector index id:
/// `{document_id}/{index:05}`.
///
/// Resolvable back to a storage key without a secondary lookup.
pub fn chunk_ref(document_id: &str, index: u32) -> String {
    format!("{}/{:05}", document_id, index)
}

/// Split a chunk reference into `(document_id, index)`.
pub fn parse_chunk_ref(chunk_ref: &str) -> Result<(String, u32), StorageError> {
    let (doc_id, index) = chunk_ref
        .rsplit_once('/')
        .ok_or_else(|| StorageError::Key(format!("Invalid chunk ref: {}", chunk_ref)))?;
    let index: u32 = index
        .parse()
        .map_err(|e| StorageError::Key(format!("Invalid chunk index in {}: {}", chunk_ref, e)))?;
    Ok((doc_id.to_string(), index))
}

/// Key for a conversation row: `conv:{ulid}`
pub fn conversation_key(conversation_id: &str) -> String {
    format!("conv:{}", conversation_id)
}

/// Key for a tag row: `tag:{conversation_id}:{tag}`
pub fn tag_key(conversation_id: &str, tag: &str) -> String {
    format!("tag:{}:{}", conversation_id, tag)
}

/// Prefix for all tags of a conversation.
pub fn tag_prefix(conversation_id: &str) -> String {
    format!("tag:{}:", conversation_id)
}

/// Key for a score breakdown: `score:{conversation_id}`
pub fn score_key(conversation_id: &str) -> String {
    format!("score:{}", conversation_id)
}

/// Key for a cluster record: `cluster:{ulid}`
pub fn cluster_key(cluster_id: &str) -> String {
    format!("cluster:{}", cluster_id)
}

/// Key for a domain registry entry: `domain:{code}`
pub fn domain_key(code: &str) -> String {
    format!("domain:{}", code)
}

/// Key for a document-domain mapping: `docdom:{document_id}:{code}`
pub fn doc_domain_key(document_id: &str, code: &str) -> String {
    format!("docdom:{}:{}", document_id, code)
}

/// Prefix for all domain mappings of a document.
pub fn doc_domain_prefix(document_id: &str) -> String {
    format!("docdom:{}:", document_id)
}

/// A pre-1970 timestamp would put a sign character in the zero-padded
/// field and sort before every digit; clamp to the epoch at encode time.
fn clamp_epoch_ms(timestamp_ms: i64) -> i64 {
    timestamp_ms.max(0)
}

/// Key for a message row in the active, backup, or archive store.
///
/// Format: `msg:{conversation_id}:{timestamp_ms:013}:{ulid}`. The same
/// encoding is used in all three column families so the backup and archive
/// mirror active history exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageKey {
    /// Parent conversation ULID string
    pub conversation_id: String,
    /// Message timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Message ULID
    pub ulid: Ulid,
}

impl MessageKey {
    /// Build a key from message parts.
    pub fn from_parts(
        conversation_id: &str,
        timestamp_ms: i64,
        message_id: &str,
    ) -> Result<Self, StorageError> {
        let ulid: Ulid = message_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid message ULID: {}", e)))?;
        Ok(Self {
            conversation_id: conversation_id.to_string(),
            timestamp_ms,
            ulid,
        })
    }

    /// Encode key to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "msg:{}:{:013}:{}",
            self.conversation_id,
            clamp_epoch_ms(self.timestamp_ms),
            self.ulid
        )
        .into_bytes()
    }

    /// Prefix matching every message of a conversation.
    pub fn conversation_prefix(conversation_id: &str) -> Vec<u8> {
        format!("msg:{}:", conversation_id).into_bytes()
    }
}

/// Key for an audit log entry: `audit:{timestamp_ms:013}:{ulid}`
pub fn audit_key(timestamp_ms: i64, entry_id: &str) -> String {
    format!("audit:{:013}:{}", clamp_epoch_ms(timestamp_ms), entry_id)
}

/// Prefix for audit entries at or after `start_ms`.
pub fn audit_prefix_start(start_ms: i64) -> String {
    format!("audit:{:013}:", clamp_epoch_ms(start_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_keys_sort_by_index() {
        let a = chunk_key("01ARZ3NDEKTSV4RRFFQ69G5FAV", 2);
        let b = chunk_key("01ARZ3NDEKTSV4RRFFQ69G5FAV", 10);
        assert!(a < b, "zero-padded indexes must sort numerically");
    }

    #[test]
    fn test_chunk_ref_round_trip() {
        let r = chunk_ref("01ARZ3NDEKTSV4RRFFQ69G5FAV", 7);
        let (doc, index) = parse_chunk_ref(&r).unwrap();
        assert_eq!(doc, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(index, 7);
    }

    #[test]
    fn test_chunk_ref_invalid() {
        assert!(parse_chunk_ref("no-separator").is_err());
        assert!(parse_chunk_ref("doc/notanumber").is_err());
    }

    #[test]
    fn test_message_keys_sort_by_time() {
        let id1 = Ulid::new().to_string();
        let id2 = Ulid::new().to_string();
        let k1 = MessageKey::from_parts("conv1", 1_000, &id1).unwrap();
        let k2 = MessageKey::from_parts("conv1", 2_000, &id2).unwrap();
        assert!(k1.to_bytes() < k2.to_bytes());
    }

    #[test]
    fn test_pre_epoch_timestamps_clamp_and_keep_order() {
        let id1 = Ulid::new().to_string();
        let id2 = Ulid::new().to_string();
        let before = MessageKey::from_parts("conv1", -86_400_000, &id1).unwrap();
        let after = MessageKey::from_parts("conv1", 1_000, &id2).unwrap();
        assert!(before.to_bytes() < after.to_bytes());
        // No sign character survives into the padded field.
        assert!(!before.to_bytes().contains(&b'-'));

        assert!(audit_key(-5, "01ARZ3NDEKTSV4RRFFQ69G5FAV") < audit_key(5, "01ARZ3NDEKTSV4RRFFQ69G5FAV"));
    }

    #[test]
    fn test_message_key_rejects_bad_ulid() {
        assert!(MessageKey::from_parts("conv1", 0, "not-a-ulid").is_err());
    }

    #[test]
    fn test_message_prefix_scopes_single_conversation() {
        let prefix = MessageKey::conversation_prefix("conv1");
        let id = Ulid::new().to_string();
        let key = MessageKey::from_parts("conv1", 5, &id).unwrap().to_bytes();
        assert!(key.starts_with(&prefix));

        let other = MessageKey::from_parts("conv2", 5, &id).unwrap().to_bytes();
        assert!(!other.starts_with(&prefix));
    }
}
