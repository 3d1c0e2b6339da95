//! RocksDB wrapper for the knowledge subsystem.
//!
//! Provides:
//! - Database open with column family setup
//! - Typed CRUD for documents, chunks, conversations, messages, clusters,
//!   tags, scores, domains, and domain mappings
//! - Atomic write batches for document ingest, cluster replacement, and
//!   the compressor's backup-then-replace message swap
//! - Generic key-value access so satellite crates can manage their own
//!   records in the shared column families

use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

use knowledge_types::{
    Chunk, Cluster, Conversation, Document, DocumentDomainMap, DomainRecord, KnowledgeDomain,
    Message, ScoreBreakdown,
};

use crate::column_families::{
    build_cf_descriptors, CF_CHUNKS, CF_CLUSTERS, CF_CONVERSATIONS, CF_CONVERSATION_TAGS,
    CF_DOCUMENTS, CF_DOC_DOMAINS, CF_DOMAINS, CF_IMPORTANCE_SCORES, CF_MESSAGES,
    CF_MESSAGE_ARCHIVE, CF_MESSAGE_BACKUPS,
};
use crate::error::StorageError;
use crate::keys::{
    chunk_key, chunk_prefix, cluster_key, conversation_key, doc_domain_key, doc_domain_prefix,
    document_key, domain_key, score_key, tag_key, tag_prefix, MessageKey,
};

/// Main storage interface for the knowledge subsystem.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening knowledge storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // --- Generic access (used by satellite crates for their own records) ---

    /// Put a raw key/value pair into a column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Get a raw value from a column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_cf(&cf, key)?)
    }

    /// Delete a key from a column family.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }

    /// Collect all `(key, value)` pairs whose key starts with `prefix`.
    pub fn scan_prefix(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self.cf(cf_name)?;
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));
        for result in iter {
            let (key, value) = result?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }

    /// Deserialize every value whose key starts with `prefix`.
    fn scan_prefix_json<T: DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>, StorageError> {
        self.scan_prefix(cf_name, prefix)?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(StorageError::from))
            .collect()
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        match self.get(cf_name, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    // --- Documents & chunks ---

    /// Save a document row (no chunk changes).
    pub fn put_document(&self, document: &Document) -> Result<(), StorageError> {
        let key = document_key(&document.id);
        self.put(CF_DOCUMENTS, key.as_bytes(), &serde_json::to_vec(document)?)
    }

    /// Get a document by id.
    pub fn get_document(&self, document_id: &str) -> Result<Option<Document>, StorageError> {
        self.get_json(CF_DOCUMENTS, document_key(document_id).as_bytes())
    }

    /// All document rows, including soft-deleted ones.
    pub fn all_documents(&self) -> Result<Vec<Document>, StorageError> {
        self.scan_prefix_json(CF_DOCUMENTS, b"doc:")
    }

    /// Write a document and its chunks as one atomic batch, replacing any
    /// chunks the document had before.
    ///
    /// This is the ingest/update transaction: either the document row and
    /// every chunk row land together, or nothing does.
    pub fn put_document_with_chunks(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), StorageError> {
        let docs_cf = self.cf(CF_DOCUMENTS)?;
        let chunks_cf = self.cf(CF_CHUNKS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &docs_cf,
            document_key(&document.id).as_bytes(),
            serde_json::to_vec(document)?,
        );

        // Drop prior chunk rows for this document before writing the new set.
        let prefix = chunk_prefix(&document.id);
        for (key, _) in self.scan_prefix(CF_CHUNKS, prefix.as_bytes())? {
            batch.delete_cf(&chunks_cf, key);
        }

        for chunk in chunks {
            batch.put_cf(
                &chunks_cf,
                chunk_key(&chunk.document_id, chunk.index).as_bytes(),
                serde_json::to_vec(chunk)?,
            );
        }

        self.db.write(batch)?;
        debug!(
            document_id = %document.id,
            chunk_count = chunks.len(),
            "Stored document with chunks"
        );
        Ok(())
    }

    /// Update a single chunk row (embedding retry path).
    pub fn put_chunk(&self, chunk: &Chunk) -> Result<(), StorageError> {
        let key = chunk_key(&chunk.document_id, chunk.index);
        self.put(CF_CHUNKS, key.as_bytes(), &serde_json::to_vec(chunk)?)
    }

    /// Get a chunk by document id and index.
    pub fn get_chunk(&self, document_id: &str, index: u32) -> Result<Option<Chunk>, StorageError> {
        self.get_json(CF_CHUNKS, chunk_key(document_id, index).as_bytes())
    }

    /// All chunks of a document, in index order.
    pub fn chunks_for_document(&self, document_id: &str) -> Result<Vec<Chunk>, StorageError> {
        self.scan_prefix_json(CF_CHUNKS, chunk_prefix(document_id).as_bytes())
    }

    /// Every chunk row in the store (index rebuild path).
    pub fn all_chunks(&self) -> Result<Vec<Chunk>, StorageError> {
        self.scan_prefix_json(CF_CHUNKS, b"chunk:")
    }

    // --- Conversations & messages ---

    /// Save a conversation row.
    pub fn put_conversation(&self, conversation: &Conversation) -> Result<(), StorageError> {
        let key = conversation_key(&conversation.id);
        self.put(
            CF_CONVERSATIONS,
            key.as_bytes(),
            &serde_json::to_vec(conversation)?,
        )
    }

    /// Get a conversation by id.
    pub fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StorageError> {
        self.get_json(CF_CONVERSATIONS, conversation_key(conversation_id).as_bytes())
    }

    /// All conversation rows, including soft-deleted ones.
    pub fn all_conversations(&self) -> Result<Vec<Conversation>, StorageError> {
        self.scan_prefix_json(CF_CONVERSATIONS, b"conv:")
    }

    /// Append a message to a conversation's active history.
    pub fn append_message(&self, message: &Message) -> Result<(), StorageError> {
        let key = MessageKey::from_parts(
            &message.conversation_id,
            message.created_at.timestamp_millis(),
            &message.id,
        )?;
        self.put(CF_MESSAGES, &key.to_bytes(), &serde_json::to_vec(message)?)
    }

    /// Active messages of a conversation, in time order.
    pub fn messages_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, StorageError> {
        self.scan_prefix_json(CF_MESSAGES, &MessageKey::conversation_prefix(conversation_id))
    }

    /// Backed-up messages of a conversation (pre-compression originals).
    pub fn backup_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StorageError> {
        self.scan_prefix_json(
            CF_MESSAGE_BACKUPS,
            &MessageKey::conversation_prefix(conversation_id),
        )
    }

    /// Archived (ancient-tier) messages of a conversation.
    pub fn archived_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StorageError> {
        self.scan_prefix_json(
            CF_MESSAGE_ARCHIVE,
            &MessageKey::conversation_prefix(conversation_id),
        )
    }

    /// The compressor's backup-then-replace swap, as one atomic batch:
    /// originals are copied into the backup store, ancient-tier messages
    /// into the archive store, the active set is deleted, and the
    /// replacement set inserted. A reader can never observe the
    /// intermediate empty history, and any failure before the single
    /// `write()` leaves the originals untouched.
    pub fn swap_messages(
        &self,
        conversation_id: &str,
        originals: &[Message],
        archived: &[Message],
        replacements: &[Message],
    ) -> Result<(), StorageError> {
        let messages_cf = self.cf(CF_MESSAGES)?;
        let backups_cf = self.cf(CF_MESSAGE_BACKUPS)?;
        let archive_cf = self.cf(CF_MESSAGE_ARCHIVE)?;

        let mut batch = WriteBatch::default();

        for message in originals {
            let key = MessageKey::from_parts(
                conversation_id,
                message.created_at.timestamp_millis(),
                &message.id,
            )?;
            let bytes = serde_json::to_vec(message)?;
            batch.put_cf(&backups_cf, key.to_bytes(), &bytes);
            batch.delete_cf(&messages_cf, key.to_bytes());
        }

        for message in archived {
            let key = MessageKey::from_parts(
                conversation_id,
                message.created_at.timestamp_millis(),
                &message.id,
            )?;
            batch.put_cf(&archive_cf, key.to_bytes(), serde_json::to_vec(message)?);
        }

        for message in replacements {
            let key = MessageKey::from_parts(
                conversation_id,
                message.created_at.timestamp_millis(),
                &message.id,
            )?;
            batch.put_cf(&messages_cf, key.to_bytes(), serde_json::to_vec(message)?);
        }

        self.db.write(batch)?;
        debug!(
            conversation_id = %conversation_id,
            original_count = originals.len(),
            replacement_count = replacements.len(),
            archived_count = archived.len(),
            "Swapped message history"
        );
        Ok(())
    }

    /// Hard-delete a conversation: row, messages, tags, and score go in
    /// one batch. Irreversible; backups and archive are left in place.
    pub fn delete_conversation_hard(&self, conversation_id: &str) -> Result<(), StorageError> {
        let conv_cf = self.cf(CF_CONVERSATIONS)?;
        let messages_cf = self.cf(CF_MESSAGES)?;
        let tags_cf = self.cf(CF_CONVERSATION_TAGS)?;
        let scores_cf = self.cf(CF_IMPORTANCE_SCORES)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&conv_cf, conversation_key(conversation_id).as_bytes());
        batch.delete_cf(&scores_cf, score_key(conversation_id).as_bytes());

        let msg_prefix = MessageKey::conversation_prefix(conversation_id);
        for (key, _) in self.scan_prefix(CF_MESSAGES, &msg_prefix)? {
            batch.delete_cf(&messages_cf, key);
        }
        let tag_pref = tag_prefix(conversation_id);
        for (key, _) in self.scan_prefix(CF_CONVERSATION_TAGS, tag_pref.as_bytes())? {
            batch.delete_cf(&tags_cf, key);
        }

        self.db.write(batch)?;
        Ok(())
    }

    // --- Tags ---

    /// Replace all tags of a conversation with the given set.
    pub fn replace_tags(&self, conversation_id: &str, tags: &[String]) -> Result<(), StorageError> {
        let tags_cf = self.cf(CF_CONVERSATION_TAGS)?;
        let mut batch = WriteBatch::default();

        let prefix = tag_prefix(conversation_id);
        for (key, _) in self.scan_prefix(CF_CONVERSATION_TAGS, prefix.as_bytes())? {
            batch.delete_cf(&tags_cf, key);
        }
        for tag in tags {
            batch.put_cf(&tags_cf, tag_key(conversation_id, tag).as_bytes(), b"1");
        }

        self.db.write(batch)?;
        Ok(())
    }

    /// All tags of a conversation.
    pub fn tags_for_conversation(&self, conversation_id: &str) -> Result<Vec<String>, StorageError> {
        let prefix = tag_prefix(conversation_id);
        let pairs = self.scan_prefix(CF_CONVERSATION_TAGS, prefix.as_bytes())?;
        pairs
            .into_iter()
            .map(|(key, _)| {
                let key = String::from_utf8(key)
                    .map_err(|e| StorageError::Key(format!("Invalid tag key: {}", e)))?;
                Ok(key[prefix.len()..].to_string())
            })
            .collect()
    }

    // --- Importance scores ---

    /// Save a score breakdown.
    pub fn put_score(&self, breakdown: &ScoreBreakdown) -> Result<(), StorageError> {
        let key = score_key(&breakdown.conversation_id);
        self.put(
            CF_IMPORTANCE_SCORES,
            key.as_bytes(),
            &serde_json::to_vec(breakdown)?,
        )
    }

    /// Get the score breakdown of a conversation.
    pub fn get_score(&self, conversation_id: &str) -> Result<Option<ScoreBreakdown>, StorageError> {
        self.get_json(CF_IMPORTANCE_SCORES, score_key(conversation_id).as_bytes())
    }

    // --- Clusters ---

    /// Replace every cluster record with the output of a new clustering
    /// run, as one atomic batch.
    pub fn replace_clusters(&self, clusters: &[Cluster]) -> Result<(), StorageError> {
        let clusters_cf = self.cf(CF_CLUSTERS)?;
        let mut batch = WriteBatch::default();

        for (key, _) in self.scan_prefix(CF_CLUSTERS, b"cluster:")? {
            batch.delete_cf(&clusters_cf, key);
        }
        for cluster in clusters {
            batch.put_cf(
                &clusters_cf,
                cluster_key(&cluster.id).as_bytes(),
                serde_json::to_vec(cluster)?,
            );
        }

        self.db.write(batch)?;
        Ok(())
    }

    /// All cluster records.
    pub fn all_clusters(&self) -> Result<Vec<Cluster>, StorageError> {
        self.scan_prefix_json(CF_CLUSTERS, b"cluster:")
    }

    /// Get a cluster by id.
    pub fn get_cluster(&self, cluster_id: &str) -> Result<Option<Cluster>, StorageError> {
        self.get_json(CF_CLUSTERS, cluster_key(cluster_id).as_bytes())
    }

    // --- Domains ---

    /// Save a domain registry entry.
    pub fn put_domain_record(&self, record: &DomainRecord) -> Result<(), StorageError> {
        let key = domain_key(record.domain.code());
        self.put(CF_DOMAINS, key.as_bytes(), &serde_json::to_vec(record)?)
    }

    /// Get a domain registry entry.
    pub fn get_domain_record(
        &self,
        domain: KnowledgeDomain,
    ) -> Result<Option<DomainRecord>, StorageError> {
        self.get_json(CF_DOMAINS, domain_key(domain.code()).as_bytes())
    }

    /// All domain registry entries.
    pub fn all_domain_records(&self) -> Result<Vec<DomainRecord>, StorageError> {
        self.scan_prefix_json(CF_DOMAINS, b"domain:")
    }

    /// Save a document-domain mapping (one row per document-domain pair).
    pub fn put_doc_domain(&self, mapping: &DocumentDomainMap) -> Result<(), StorageError> {
        let key = doc_domain_key(&mapping.document_id, mapping.domain.code());
        self.put(CF_DOC_DOMAINS, key.as_bytes(), &serde_json::to_vec(mapping)?)
    }

    /// All domain mappings of a document.
    pub fn domains_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentDomainMap>, StorageError> {
        self.scan_prefix_json(CF_DOC_DOMAINS, doc_domain_prefix(document_id).as_bytes())
    }

    /// Every document-domain mapping in the store.
    pub fn all_doc_domains(&self) -> Result<Vec<DocumentDomainMap>, StorageError> {
        self.scan_prefix_json(CF_DOC_DOMAINS, b"docdom:")
    }

    /// Flush all memtables to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use knowledge_types::{ConversationSource, DocumentType, MessageRole};
    use tempfile::TempDir;
    use ulid::Ulid;

    fn open_temp() -> (TempDir, Storage) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::open(temp.path()).unwrap();
        (temp, storage)
    }

    fn make_document(id: &str) -> Document {
        Document::new(
            id.to_string(),
            "Title".to_string(),
            "Some content for testing".to_string(),
            DocumentType::Note,
            None,
            serde_json::Value::Null,
        )
    }

    fn make_message(conversation_id: &str, content: &str) -> Message {
        Message::new(
            Ulid::new().to_string(),
            conversation_id.to_string(),
            MessageRole::User,
            content.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_document_round_trip() {
        let (_temp, storage) = open_temp();
        let doc = make_document("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        storage.put_document(&doc).unwrap();

        let loaded = storage.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Title");
        assert!(storage.get_document("01BX5ZZKBKACTAV9WEVGEMMVRY").unwrap().is_none());
    }

    #[test]
    fn test_put_document_with_chunks_replaces_old_set() {
        let (_temp, storage) = open_temp();
        let doc = make_document("01ARZ3NDEKTSV4RRFFQ69G5FAV");

        let old_chunks: Vec<Chunk> = (0..3)
            .map(|i| {
                Chunk::new(
                    Ulid::new().to_string(),
                    doc.id.clone(),
                    i,
                    format!("old chunk {}", i),
                )
            })
            .collect();
        storage.put_document_with_chunks(&doc, &old_chunks).unwrap();
        assert_eq!(storage.chunks_for_document(&doc.id).unwrap().len(), 3);

        let new_chunks: Vec<Chunk> = (0..2)
            .map(|i| {
                Chunk::new(
                    Ulid::new().to_string(),
                    doc.id.clone(),
                    i,
                    format!("new chunk {}", i),
                )
            })
            .collect();
        storage.put_document_with_chunks(&doc, &new_chunks).unwrap();

        let chunks = storage.chunks_for_document(&doc.id).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.content.starts_with("new")));
        // Index order preserved.
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_messages_ordered_by_time() {
        let (_temp, storage) = open_temp();
        let now = Utc::now();

        for offset in [3i64, 1, 2] {
            let msg = Message::new(
                Ulid::new().to_string(),
                "conv1".to_string(),
                MessageRole::User,
                format!("message {}", offset),
                now + chrono::Duration::seconds(offset),
            );
            storage.append_message(&msg).unwrap();
        }

        let messages = storage.messages_for_conversation("conv1").unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "message 1");
        assert_eq!(messages[2].content, "message 3");
    }

    #[test]
    fn test_swap_messages_backs_up_and_replaces() {
        let (_temp, storage) = open_temp();
        let originals: Vec<Message> = (0..4)
            .map(|i| make_message("conv1", &format!("original {}", i)))
            .collect();
        for msg in &originals {
            storage.append_message(msg).unwrap();
        }

        let replacement = vec![make_message("conv1", "summary of four messages")];
        let archived = vec![originals[0].clone()];
        storage
            .swap_messages("conv1", &originals, &archived, &replacement)
            .unwrap();

        let active = storage.messages_for_conversation("conv1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].content, "summary of four messages");

        let backups = storage.backup_messages("conv1").unwrap();
        assert_eq!(backups.len(), 4);

        let archive = storage.archived_messages("conv1").unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].content, "original 0");
    }

    #[test]
    fn test_swap_messages_scoped_to_one_conversation() {
        let (_temp, storage) = open_temp();
        let mine = make_message("conv1", "mine");
        let other = make_message("conv2", "other");
        storage.append_message(&mine).unwrap();
        storage.append_message(&other).unwrap();

        storage
            .swap_messages("conv1", &[mine], &[], &[])
            .unwrap();

        assert!(storage.messages_for_conversation("conv1").unwrap().is_empty());
        assert_eq!(storage.messages_for_conversation("conv2").unwrap().len(), 1);
    }

    #[test]
    fn test_replace_tags() {
        let (_temp, storage) = open_temp();
        storage
            .replace_tags("conv1", &["inventory".to_string(), "stock".to_string()])
            .unwrap();
        storage.replace_tags("conv1", &["security".to_string()]).unwrap();

        let tags = storage.tags_for_conversation("conv1").unwrap();
        assert_eq!(tags, vec!["security".to_string()]);
    }

    #[test]
    fn test_replace_clusters_wholesale() {
        let (_temp, storage) = open_temp();
        let first = vec![Cluster::new(
            Ulid::new().to_string(),
            "first".to_string(),
            vec![],
            vec!["c1".to_string()],
        )];
        storage.replace_clusters(&first).unwrap();

        let second = vec![
            Cluster::new(Ulid::new().to_string(), "a".to_string(), vec![], vec![]),
            Cluster::new(Ulid::new().to_string(), "b".to_string(), vec![], vec![]),
        ];
        storage.replace_clusters(&second).unwrap();

        let clusters = storage.all_clusters().unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.label != "first"));
    }

    #[test]
    fn test_hard_delete_conversation() {
        let (_temp, storage) = open_temp();
        let conv = Conversation::new(
            "conv1".to_string(),
            "Title".to_string(),
            ConversationSource::User,
        );
        storage.put_conversation(&conv).unwrap();
        storage.append_message(&make_message("conv1", "hello")).unwrap();
        storage.replace_tags("conv1", &["tag".to_string()]).unwrap();

        storage.delete_conversation_hard("conv1").unwrap();

        assert!(storage.get_conversation("conv1").unwrap().is_none());
        assert!(storage.messages_for_conversation("conv1").unwrap().is_empty());
        assert!(storage.tags_for_conversation("conv1").unwrap().is_empty());
    }

    #[test]
    fn test_domain_registry_and_mappings() {
        let (_temp, storage) = open_temp();
        for domain in KnowledgeDomain::all() {
            storage
                .put_domain_record(&DomainRecord::new(*domain, domain.code()))
                .unwrap();
        }
        assert_eq!(storage.all_domain_records().unwrap().len(), 6);

        let mapping = DocumentDomainMap::new("d1".to_string(), KnowledgeDomain::Wiki, 0.8);
        storage.put_doc_domain(&mapping).unwrap();

        let mappings = storage.domains_for_document("d1").unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].domain, KnowledgeDomain::Wiki);
    }
}
