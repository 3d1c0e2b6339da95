//! Knowledge store service.
//!
//! Owns documents, chunks, and the vector index entries derived from
//! them. Search embeds the query, asks the index for candidates, merges
//! in chunk/document metadata, and re-sorts by similarity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};
use ulid::Ulid;

use knowledge_embeddings::{binary, Embedding, EmbeddingClient};
use knowledge_storage::{chunk_ref, parse_chunk_ref, Storage};
use knowledge_types::{Chunk, Document, DocumentType};
use knowledge_vector::VectorIndex;

use crate::chunker::{chunk_text, ChunkerConfig};
use crate::error::StoreError;

/// Knowledge store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Chunk size bounds
    pub chunker: ChunkerConfig,
    /// Candidate multiplier: the index is asked for `limit * factor`
    /// matches so post-filtering still fills the page
    pub candidate_factor: usize,
    /// Default similarity floor when the caller passes none
    pub default_min_similarity: f32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            candidate_factor: 4,
            default_min_similarity: 0.25,
        }
    }
}

/// Fields of a document update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub doc_type: Option<DocumentType>,
    pub source: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// One search result: a chunk with its parent document's metadata.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Stable chunk reference (also the vector index id)
    pub chunk_ref: String,
    /// Parent document id
    pub document_id: String,
    /// Parent document title
    pub document_title: String,
    /// Parent document type
    pub doc_type: DocumentType,
    /// Chunk text
    pub content: String,
    /// Cosine similarity to the query
    pub similarity: f32,
}

/// One page of a document listing.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    /// Total matching documents across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Document ingestion and search service.
pub struct KnowledgeStore {
    storage: Arc<Storage>,
    embeddings: Arc<EmbeddingClient>,
    index: RwLock<Box<dyn VectorIndex>>,
    config: StoreConfig,
}

impl KnowledgeStore {
    /// Create a store over the given storage, embedding client, and
    /// vector index.
    pub fn new(
        storage: Arc<Storage>,
        embeddings: Arc<EmbeddingClient>,
        index: Box<dyn VectorIndex>,
        config: StoreConfig,
    ) -> Self {
        Self {
            storage,
            embeddings,
            index: RwLock::new(index),
            config,
        }
    }

    /// The underlying storage handle.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// The embedding client.
    pub fn embeddings(&self) -> &Arc<EmbeddingClient> {
        &self.embeddings
    }

    /// Ingest a document: chunk, embed, persist atomically, and index.
    ///
    /// Returns the new document id. Per-chunk embedding failures are
    /// logged and the chunk persisted as pending; they do not fail the
    /// ingest.
    pub async fn add_document(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        doc_type: DocumentType,
        metadata: Option<serde_json::Value>,
        source: Option<String>,
    ) -> Result<String, StoreError> {
        let content = content.into();
        if content.len() < self.config.chunker.min_chunk_size {
            return Err(StoreError::InvalidInput(format!(
                "content shorter than minimum chunk size {}",
                self.config.chunker.min_chunk_size
            )));
        }

        let document = Document::new(
            Ulid::new().to_string(),
            title.into(),
            content,
            doc_type,
            source,
            metadata.unwrap_or(serde_json::Value::Null),
        );

        let chunks = self.build_chunks(&document).await;
        self.storage.put_document_with_chunks(&document, &chunks)?;
        self.index_chunks(&chunks)?;

        info!(
            document_id = %document.id,
            chunk_count = chunks.len(),
            "Ingested document"
        );
        Ok(document.id)
    }

    /// Update a document. A content change triggers a full re-chunk and
    /// re-embed. Returns false when the document does not exist.
    pub async fn update_document(
        &self,
        document_id: &str,
        update: DocumentUpdate,
    ) -> Result<bool, StoreError> {
        let Some(mut document) = self.storage.get_document(document_id)? else {
            return Ok(false);
        };

        let content_changed = update
            .content
            .as_ref()
            .is_some_and(|c| *c != document.content);

        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(doc_type) = update.doc_type {
            document.doc_type = doc_type;
        }
        if let Some(source) = update.source {
            document.source = Some(source);
        }
        if let Some(metadata) = update.metadata {
            document.metadata = metadata;
        }
        if let Some(content) = update.content {
            if content.len() < self.config.chunker.min_chunk_size {
                return Err(StoreError::InvalidInput(format!(
                    "content shorter than minimum chunk size {}",
                    self.config.chunker.min_chunk_size
                )));
            }
            document.content = content;
        }
        document.updated_at = chrono::Utc::now();

        if content_changed {
            self.deindex_document(&document.id)?;
            let chunks = self.build_chunks(&document).await;
            self.storage.put_document_with_chunks(&document, &chunks)?;
            self.index_chunks(&chunks)?;
            debug!(document_id = %document.id, "Re-chunked updated document");
        } else {
            self.storage.put_document(&document)?;
        }
        Ok(true)
    }

    /// Soft-delete a document and its chunks, and drop them from the
    /// index. Returns false when the document does not exist.
    pub fn delete_document(&self, document_id: &str) -> Result<bool, StoreError> {
        let Some(mut document) = self.storage.get_document(document_id)? else {
            return Ok(false);
        };
        if document.deleted_at.is_some() {
            return Ok(true);
        }

        let now = chrono::Utc::now();
        document.deleted_at = Some(now);

        // Mark the document and every chunk in one batch.
        let mut chunks = self.storage.chunks_for_document(document_id)?;
        for chunk in &mut chunks {
            chunk.deleted_at = Some(now);
        }
        self.storage.put_document_with_chunks(&document, &chunks)?;
        self.deindex_document(document_id)?;

        info!(document_id = %document_id, "Soft-deleted document");
        Ok(true)
    }

    /// Get a document by id.
    pub fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.storage.get_document(document_id)?)
    }

    /// Search chunks by semantic similarity.
    ///
    /// Always returns a (possibly empty) ranked list; an embedding
    /// failure degrades to an empty result with a warning.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        type_filter: Option<DocumentType>,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query_embedding = match self.embeddings.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Query embedding failed; returning empty result");
                return Ok(Vec::new());
            }
        };

        let min_similarity = min_similarity.unwrap_or(self.config.default_min_similarity);
        let candidates = {
            let index = self.lock_index_read();
            index.search(
                &query_embedding,
                limit.max(1) * self.config.candidate_factor.max(1),
                min_similarity,
            )
        };

        let mut documents: HashMap<String, Document> = HashMap::new();
        let mut hits = Vec::new();

        for candidate in candidates {
            let (document_id, chunk_index) = match parse_chunk_ref(&candidate.id) {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(id = %candidate.id, error = %e, "Unresolvable index entry");
                    continue;
                }
            };

            let document = match documents.get(&document_id) {
                Some(doc) => doc.clone(),
                None => match self.storage.get_document(&document_id)? {
                    Some(doc) => {
                        documents.insert(document_id.clone(), doc.clone());
                        doc
                    }
                    None => continue,
                },
            };
            if !document.is_live() {
                continue;
            }
            if type_filter.is_some_and(|ty| ty != document.doc_type) {
                continue;
            }

            let Some(chunk) = self.storage.get_chunk(&document_id, chunk_index)? else {
                continue;
            };
            if !chunk.is_live() {
                continue;
            }

            hits.push(SearchHit {
                chunk_ref: candidate.id,
                document_id: document.id.clone(),
                document_title: document.title.clone(),
                doc_type: document.doc_type,
                content: chunk.content,
                similarity: candidate.similarity,
            });
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Paginated document listing with optional type and title/content
    /// substring filters. Page numbers are 1-based.
    pub fn list_documents(
        &self,
        page: usize,
        limit: usize,
        type_filter: Option<DocumentType>,
        text_filter: Option<&str>,
    ) -> Result<DocumentPage, StoreError> {
        let needle = text_filter.map(|t| t.to_lowercase());
        let mut documents: Vec<Document> = self
            .storage
            .all_documents()?
            .into_iter()
            .filter(|d| d.is_live())
            .filter(|d| type_filter.is_none_or(|ty| ty == d.doc_type))
            .filter(|d| {
                needle.as_ref().is_none_or(|n| {
                    d.title.to_lowercase().contains(n) || d.content.to_lowercase().contains(n)
                })
            })
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = documents.len();
        let page = page.max(1);
        let start = (page - 1).saturating_mul(limit);
        let documents = documents
            .into_iter()
            .skip(start)
            .take(limit)
            .collect();

        Ok(DocumentPage {
            documents,
            total,
            page,
            limit,
        })
    }

    /// Re-embed chunks persisted without an embedding. Returns how many
    /// were recovered.
    pub async fn retry_pending_embeddings(&self) -> Result<usize, StoreError> {
        let pending: Vec<Chunk> = self
            .storage
            .all_chunks()?
            .into_iter()
            .filter(|c| c.is_live() && !c.embedding_generated)
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = pending.iter().map(|c| c.content.clone()).collect();
        let embedded = self.embeddings.embed_batch(&texts, None).await;

        let mut recovered = 0;
        for (i, mut chunk) in pending.into_iter().enumerate() {
            let Some(embedding) = embedded.get(&i) else {
                continue;
            };
            chunk.embedding_generated = true;
            chunk.embedding = Some(binary::to_binary(&embedding.values));
            self.storage.put_chunk(&chunk)?;

            let id = chunk_ref(&chunk.document_id, chunk.index);
            let mut index = self.lock_index_write();
            if !index.contains(&id) {
                if let Err(e) = index.insert(&id, embedding) {
                    warn!(id = %id, error = %e, "Failed to index retried chunk");
                    continue;
                }
            }
            recovered += 1;
        }
        info!(recovered = recovered, "Retried pending embeddings");
        Ok(recovered)
    }

    /// Rebuild the vector index from persisted chunk vectors. Used after
    /// process restart; no provider calls are made.
    pub fn rebuild_index(&self) -> Result<usize, StoreError> {
        let chunks = self.storage.all_chunks()?;
        let mut index = self.lock_index_write();
        index.clear();

        let mut inserted = 0;
        for chunk in chunks {
            if !chunk.is_live() || !chunk.embedding_generated {
                continue;
            }
            let Some(bytes) = &chunk.embedding else {
                continue;
            };
            let values = match binary::from_binary(bytes) {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        document_id = %chunk.document_id,
                        index = chunk.index,
                        error = %e,
                        "Corrupt stored vector, skipping"
                    );
                    continue;
                }
            };
            // Stored vectors were normalized before persisting.
            let embedding = Embedding::from_normalized(values);
            let id = chunk_ref(&chunk.document_id, chunk.index);
            if let Err(e) = index.insert(&id, &embedding) {
                warn!(id = %id, error = %e, "Failed to restore index entry");
                continue;
            }
            inserted += 1;
        }
        info!(inserted = inserted, "Rebuilt vector index");
        Ok(inserted)
    }

    /// Chunk and embed a document's content, marking failed chunks as
    /// pending rather than dropping them.
    async fn build_chunks(&self, document: &Document) -> Vec<Chunk> {
        let chunk_texts = chunk_text(&document.content, &self.config.chunker);
        let embedded = self.embeddings.embed_batch(&chunk_texts, None).await;

        chunk_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut chunk = Chunk::new(
                    Ulid::new().to_string(),
                    document.id.clone(),
                    i as u32,
                    text,
                );
                if let Some(embedding) = embedded.get(&i) {
                    chunk.embedding_generated = true;
                    chunk.embedding = Some(binary::to_binary(&embedding.values));
                } else {
                    warn!(
                        document_id = %document.id,
                        chunk_index = i,
                        "Chunk persisted without embedding; excluded from search until retried"
                    );
                }
                chunk
            })
            .collect()
    }

    /// Insert embedded chunks into the vector index.
    fn index_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        let mut index = self.lock_index_write();
        for chunk in chunks {
            let Some(bytes) = &chunk.embedding else {
                continue;
            };
            let values = match binary::from_binary(bytes) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, "Skipping chunk with corrupt vector");
                    continue;
                }
            };
            let id = chunk_ref(&chunk.document_id, chunk.index);
            if let Err(e) = index.insert(&id, &Embedding::from_normalized(values)) {
                warn!(id = %id, error = %e, "Failed to index chunk");
            }
        }
        Ok(())
    }

    /// Remove every index entry belonging to a document.
    fn deindex_document(&self, document_id: &str) -> Result<(), StoreError> {
        let chunks = self.storage.chunks_for_document(document_id)?;
        let mut index = self.lock_index_write();
        for chunk in &chunks {
            index.remove(&chunk_ref(document_id, chunk.index));
        }
        Ok(())
    }

    fn lock_index_read(&self) -> std::sync::RwLockReadGuard<'_, Box<dyn VectorIndex>> {
        match self.index.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_index_write(&self) -> std::sync::RwLockWriteGuard<'_, Box<dyn VectorIndex>> {
        match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
