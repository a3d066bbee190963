//! Persistent vector store.
//!
//! A [`VectorStore`] is one named collection inside a RocksDB directory.
//! Documents and their embeddings are written atomically and mirrored in
//! memory; search is an exact scan over the mirror.

mod collection;
mod metric;
mod search;

pub use collection::CollectionInfo;
pub use metric::DistanceMetric;
pub use search::{rank, SearchRequest};

use crate::config::StoreConfig;
use crate::embeddings::EmbeddingProvider;
use crate::filter::Predicate;
use crate::storage::{keys, Storage, CF_COLLECTIONS, CF_DOCUMENTS, CF_EMBEDDINGS};
use crate::types::{DatabaseError, Document, Result, ScoredDocument, StoredDocument};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Collection name used when none is given.
pub const DEFAULT_COLLECTION: &str = "langchain";

struct Entry {
    stored: StoredDocument,
    embedding: Vec<f32>,
}

/// Embedded vector store for one collection.
pub struct VectorStore {
    path: PathBuf,
    storage: Storage,
    collection: CollectionInfo,
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<BTreeMap<Uuid, Entry>>,
}

impl VectorStore {
    /// Open (or create) a collection at `path`.
    ///
    /// An existing collection keeps the metric it was created with; its
    /// dimensions must match the embedder's.
    pub fn open<P: AsRef<Path>>(
        path: P,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if !keys::is_valid_collection_name(collection) {
            return Err(DatabaseError::InvalidArgument(format!(
                "Invalid collection name '{}': use 1-63 of [A-Za-z0-9_.-]",
                collection
            )));
        }

        let path = path.as_ref().to_path_buf();
        let storage = Storage::open(&path)?;
        let collection = Self::load_or_create_collection(&storage, collection, embedder.as_ref(), metric)?;
        let entries = Self::load_entries(&storage, &collection)?;

        info!(
            path = %path.display(),
            collection = %collection.name,
            documents = entries.len(),
            "Opened vector store"
        );

        Ok(Self {
            path,
            storage,
            collection,
            embedder,
            entries: RwLock::new(entries),
        })
    }

    /// Open the store described by a configuration.
    pub fn from_config(config: &StoreConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Self::open(&config.persist_directory, &config.collection, embedder, config.metric)
    }

    /// Embed and persist `documents` into the default collection at `persist_directory`.
    pub async fn from_documents<P: AsRef<Path>>(
        documents: Vec<Document>,
        embedder: Arc<dyn EmbeddingProvider>,
        persist_directory: P,
    ) -> Result<Self> {
        let store = Self::open(persist_directory, DEFAULT_COLLECTION, embedder, DistanceMetric::default())?;
        store.add_documents(documents).await?;
        Ok(store)
    }

    fn load_or_create_collection(
        storage: &Storage,
        name: &str,
        embedder: &dyn EmbeddingProvider,
        metric: DistanceMetric,
    ) -> Result<CollectionInfo> {
        let key = keys::encode_collection_key(name);

        if let Some(bytes) = storage.get(CF_COLLECTIONS, &key)? {
            let info: CollectionInfo = serde_json::from_slice(&bytes)?;

            if info.dimensions != embedder.dimensions() {
                return Err(DatabaseError::DimensionMismatch {
                    collection: info.name,
                    expected: info.dimensions,
                    actual: embedder.dimensions(),
                });
            }
            if info.model != embedder.model_name() {
                warn!(
                    collection = name,
                    stored = %info.model,
                    requested = embedder.model_name(),
                    "Collection was built with a different embedding model"
                );
            }
            if info.metric != metric {
                warn!(
                    collection = name,
                    stored = %info.metric,
                    requested = %metric,
                    "Ignoring requested metric, collection metric is fixed"
                );
            }
            return Ok(info);
        }

        let info = CollectionInfo::new(name, embedder.model_name(), embedder.dimensions(), metric);
        storage.put(CF_COLLECTIONS, &key, &serde_json::to_vec(&info)?)?;
        debug!(collection = name, dimensions = info.dimensions, "Created collection");

        Ok(info)
    }

    fn load_entries(storage: &Storage, collection: &CollectionInfo) -> Result<BTreeMap<Uuid, Entry>> {
        let prefix = keys::encode_document_prefix(&collection.name);
        let mut entries = BTreeMap::new();

        for value in storage.values_with_prefix(CF_DOCUMENTS, &prefix)? {
            let stored: StoredDocument = serde_json::from_slice(&value)?;
            let emb_key = keys::encode_embedding_key(&collection.name, stored.id);

            match storage.get(CF_EMBEDDINGS, &emb_key)? {
                Some(bytes) => {
                    let embedding: Vec<f32> = bincode::deserialize(&bytes)?;
                    entries.insert(stored.id, Entry { stored, embedding });
                }
                None => warn!(id = %stored.id, "Document has no stored embedding, skipping"),
            }
        }

        Ok(entries)
    }

    fn read_entries(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Uuid, Entry>>> {
        self.entries
            .read()
            .map_err(|_| DatabaseError::InternalError("entry cache lock poisoned".to_string()))
    }

    fn write_entries(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Uuid, Entry>>> {
        self.entries
            .write()
            .map_err(|_| DatabaseError::InternalError("entry cache lock poisoned".to_string()))
    }

    /// Collection descriptor.
    pub fn collection(&self) -> &CollectionInfo {
        &self.collection
    }

    /// Add documents, deriving each ID from its content.
    ///
    /// Documents already present are left untouched and not re-embedded.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<Vec<Uuid>> {
        let ids = documents
            .iter()
            .map(|doc| doc.content_id(&self.collection.name))
            .collect::<Result<Vec<_>>>()?;
        self.add_documents_with_ids(documents, ids).await
    }

    /// Build documents from texts and optional per-text metadata.
    pub async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Option<Vec<crate::types::Metadata>>,
    ) -> Result<Vec<Uuid>> {
        let documents = match metadatas {
            Some(metadatas) if metadatas.len() != texts.len() => {
                return Err(DatabaseError::InvalidArgument(format!(
                    "{} texts but {} metadata entries",
                    texts.len(),
                    metadatas.len()
                )))
            }
            Some(metadatas) => texts
                .into_iter()
                .zip(metadatas)
                .map(|(page_content, metadata)| Document { page_content, metadata })
                .collect(),
            None => texts.into_iter().map(Document::new).collect(),
        };
        self.add_documents(documents).await
    }

    /// Add documents under caller-chosen IDs (upsert).
    pub async fn add_documents_with_ids(&self, documents: Vec<Document>, ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
        if documents.len() != ids.len() {
            return Err(DatabaseError::InvalidArgument(format!(
                "{} documents but {} ids",
                documents.len(),
                ids.len()
            )));
        }
        for doc in &documents {
            doc.validate()?;
        }

        // Skip exact duplicates of what is already stored
        let pending: Vec<(Uuid, Document)> = {
            let entries = self.read_entries()?;
            ids.iter()
                .copied()
                .zip(documents)
                .filter(|(id, doc)| entries.get(id).map_or(true, |e| &e.stored.document != doc))
                .collect()
        };

        if pending.is_empty() {
            debug!(collection = %self.collection.name, "All documents already stored");
            return Ok(ids);
        }

        let texts: Vec<String> = pending.iter().map(|(_, d)| d.page_content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != pending.len() {
            return Err(DatabaseError::EmbeddingError(format!(
                "Provider returned {} embeddings for {} documents",
                embeddings.len(),
                pending.len()
            )));
        }

        let mut batch = self.storage.batch();
        let mut new_entries = Vec::with_capacity(pending.len());

        for ((id, document), embedding) in pending.into_iter().zip(embeddings) {
            self.check_dimensions(&embedding)?;

            let stored = StoredDocument::new(id, document);
            batch.put(
                CF_DOCUMENTS,
                &keys::encode_document_key(&self.collection.name, id),
                &serde_json::to_vec(&stored)?,
            )?;
            batch.put(
                CF_EMBEDDINGS,
                &keys::encode_embedding_key(&self.collection.name, id),
                &bincode::serialize(&embedding)?,
            )?;
            new_entries.push(Entry { stored, embedding });
        }

        let written = new_entries.len();
        self.storage.write_batch(batch)?;

        let mut entries = self.write_entries()?;
        for entry in new_entries {
            entries.insert(entry.stored.id, entry);
        }

        info!(
            collection = %self.collection.name,
            written,
            total = entries.len(),
            "Indexed documents"
        );

        Ok(ids)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.collection.dimensions {
            return Err(DatabaseError::DimensionMismatch {
                collection: self.collection.name.clone(),
                expected: self.collection.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Top-`k` documents most similar to `query`, optionally filtered.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Predicate>,
    ) -> Result<Vec<Document>> {
        let hits = self.similarity_search_with_score(query, k, filter).await?;
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    /// Like [`similarity_search`](Self::similarity_search), keeping distances.
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Predicate>,
    ) -> Result<Vec<ScoredDocument>> {
        let mut request = SearchRequest::new(k);
        request.filter = filter.cloned();
        self.search(query, &request).await
    }

    /// General search: embed `query`, then rank.
    pub async fn search(&self, query: &str, request: &SearchRequest) -> Result<Vec<ScoredDocument>> {
        if request.k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(query).await?;
        self.search_by_vector(&query_embedding, request)
    }

    /// Top-`k` documents nearest to an already embedded query.
    pub fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&Predicate>,
    ) -> Result<Vec<Document>> {
        let mut request = SearchRequest::new(k);
        request.filter = filter.cloned();
        let hits = self.search_by_vector(embedding, &request)?;
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    /// Rank stored documents against a query vector.
    pub fn search_by_vector(&self, embedding: &[f32], request: &SearchRequest) -> Result<Vec<ScoredDocument>> {
        self.check_dimensions(embedding)?;

        let entries = self.read_entries()?;
        let hits = rank(
            entries.values().map(|e| (&e.stored, e.embedding.as_slice())),
            embedding,
            self.collection.metric,
            request,
        );

        let filtered = request.filter.is_some() || request.document_filter.is_some();
        debug!(
            collection = %self.collection.name,
            k = request.k,
            filtered,
            hits = hits.len(),
            "Similarity search"
        );

        Ok(hits)
    }

    /// Get a document by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<StoredDocument>> {
        Ok(self.read_entries()?.get(&id).map(|e| e.stored.clone()))
    }

    /// Stored embedding of a document.
    pub fn get_embedding(&self, id: Uuid) -> Result<Option<Vec<f32>>> {
        Ok(self.read_entries()?.get(&id).map(|e| e.embedding.clone()))
    }

    /// All documents whose metadata matches `filter`, in ID order.
    pub fn get_where(&self, filter: &Predicate) -> Result<Vec<StoredDocument>> {
        Ok(self
            .read_entries()?
            .values()
            .filter(|e| filter.evaluate(&e.stored.document.metadata))
            .map(|e| e.stored.clone())
            .collect())
    }

    /// Delete documents by ID. Returns how many existed.
    pub fn delete(&self, ids: &[Uuid]) -> Result<usize> {
        let mut entries = self.write_entries()?;
        let mut batch = self.storage.batch();
        let mut removed = Vec::new();

        for id in ids {
            if entries.contains_key(id) {
                batch.delete(CF_DOCUMENTS, &keys::encode_document_key(&self.collection.name, *id))?;
                batch.delete(CF_EMBEDDINGS, &keys::encode_embedding_key(&self.collection.name, *id))?;
                removed.push(*id);
            }
        }

        if batch.is_empty() {
            return Ok(0);
        }

        self.storage.write_batch(batch)?;
        for id in &removed {
            entries.remove(id);
        }

        info!(collection = %self.collection.name, deleted = removed.len(), "Deleted documents");
        Ok(removed.len())
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_entries()?.len())
    }

    /// Flush to disk. Writes are already durable through the WAL.
    pub fn persist(&self) -> Result<()> {
        self.storage.flush()?;
        debug!(path = %self.path.display(), "Flushed vector store");
        Ok(())
    }
}
