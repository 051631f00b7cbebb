//! Index construction and querying.
//!
//! An [`IndexBuilder`] chunks and embeds documents of one modality and
//! upserts them into a named collection. The resulting [`Index`] answers
//! text queries against that collection. An index can also be attached to
//! a collection populated by an earlier run via [`Index::from_persisted`].

use std::collections::HashMap;
use std::sync::Arc;

use corpora_core::{Document, DocumentContent, Modality};
use corpora_vector::{VectorData, VectorStore};
use uuid::Uuid;

use crate::provider::embedding::Embedder;
use crate::splitter::SplitterConfig;
use crate::{Error, PipelineObserver, Result, TRACING_TARGET};

/// Builds an index by chunking, embedding, and storing documents.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    collection: String,
    splitter: SplitterConfig,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl IndexBuilder {
    /// Creates a builder targeting the given collection.
    pub fn new(embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            collection: collection.into(),
            splitter: SplitterConfig::default(),
            observer: None,
        }
    }

    /// Overrides the chunking configuration.
    pub fn with_splitter(mut self, splitter: SplitterConfig) -> Self {
        self.splitter = splitter;
        self
    }

    /// Attaches a pipeline observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Chunks, embeds, and upserts the documents, returning a queryable
    /// index.
    ///
    /// Documents whose modality does not match the embedder are skipped.
    /// An empty document set still yields a usable (empty) index.
    pub async fn build(
        self,
        store: Arc<VectorStore>,
        documents: Vec<Document>,
    ) -> Result<Index> {
        let modality = self.embedder.modality();
        let mut units = Vec::new();

        for document in documents {
            if document.modality() != modality {
                tracing::debug!(
                    target: TRACING_TARGET,
                    document = %document,
                    "Skipping document with mismatched modality"
                );
                continue;
            }
            match &document.content {
                DocumentContent::Text(text) => {
                    for chunk in self.splitter.split(text)? {
                        let mut metadata = document.metadata.clone();
                        metadata.insert("text".into(), serde_json::json!(chunk.text.clone()));
                        metadata.insert("page".into(), serde_json::json!(chunk.page));
                        units.push((Document::text(chunk.text), metadata));
                    }
                }
                DocumentContent::ImagePath(path) => {
                    let mut metadata = document.metadata.clone();
                    metadata.insert(
                        "path".into(),
                        serde_json::json!(path.display().to_string()),
                    );
                    units.push((document.clone(), metadata));
                }
            }
        }

        store
            .create_collection(&self.collection, self.embedder.ndims())
            .await?;

        if !units.is_empty() {
            let chunk_documents: Vec<Document> =
                units.iter().map(|(d, _)| d.clone()).collect();
            let vectors = self.embedder.embed_documents(&chunk_documents).await?;

            let data: Vec<VectorData> = vectors
                .into_iter()
                .zip(units)
                .map(|(vector, (_, mut metadata))| {
                    metadata.insert("modality".into(), serde_json::json!(modality.as_ref()));
                    VectorData {
                        id: Uuid::new_v4().to_string(),
                        vector,
                        metadata,
                    }
                })
                .collect();

            let count = data.len();
            store.upsert(&self.collection, data).await?;
            store.persist().await?;

            if let Some(observer) = &self.observer {
                observer.on_index(&self.collection, count);
            }
        }

        Ok(Index {
            store,
            embedder: self.embedder,
            collection: self.collection,
            observer: self.observer,
        })
    }
}

/// A queryable per-modality index over one collection.
pub struct Index {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl Index {
    /// Attaches to a collection populated by an earlier run.
    ///
    /// Fails if the collection does not exist in the store.
    pub async fn from_persisted(
        store: Arc<VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Result<Self> {
        let collection = collection.into();
        if !store.collection_exists(&collection).await? {
            return Err(Error::retrieval(format!(
                "collection '{collection}' not found in {} store",
                store.backend_name()
            )));
        }

        Ok(Self {
            store,
            embedder,
            collection,
            observer: None,
        })
    }

    /// Attaches a pipeline observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the modality this index serves.
    pub fn modality(&self) -> Modality {
        self.embedder.modality()
    }

    /// Retrieves the `top_k` most similar entries for a text query.
    ///
    /// An empty index yields an empty result set.
    pub async fn query(&self, query: &str, top_k: usize) -> Result<Vec<Retrieved>> {
        let vector = self.embedder.embed_query(query).await?;
        let results = self.store.search(&self.collection, vector, top_k).await?;

        let retrieved: Vec<Retrieved> = results
            .into_iter()
            .map(|r| {
                let text = r.metadata.get("text").and_then(|v| v.as_str()).map(String::from);
                let source = r
                    .metadata
                    .get("source")
                    .or_else(|| r.metadata.get("path"))
                    .and_then(|v| v.as_str())
                    .map(String::from);
                Retrieved {
                    id: r.id,
                    score: r.score,
                    text,
                    source,
                    metadata: r.metadata,
                }
            })
            .collect();

        if let Some(observer) = &self.observer {
            observer.on_retrieve(&self.collection, query, &retrieved);
        }

        Ok(retrieved)
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("collection", &self.collection)
            .field("modality", &self.embedder.modality())
            .finish()
    }
}

/// A single retrieved entry.
#[derive(Debug, Clone)]
pub struct Retrieved {
    /// Stored vector ID.
    pub id: String,
    /// Similarity score, higher is more similar.
    pub score: f32,
    /// Chunk text, for text collections.
    pub text: Option<String>,
    /// Source file path, when recorded.
    pub source: Option<String>,
    /// Full stored metadata.
    pub metadata: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use corpora_vector::{LocalConfig, VectorStoreConfig};

    use super::*;
    use crate::provider::embedding::testing::StubEmbedder;

    async fn memory_store() -> Arc<VectorStore> {
        let config = VectorStoreConfig::Local(LocalConfig::in_memory());
        Arc::new(VectorStore::new(config).await.unwrap())
    }

    #[derive(Default)]
    struct CountingObserver {
        indexed: AtomicUsize,
        retrieved: AtomicUsize,
    }

    impl PipelineObserver for CountingObserver {
        fn on_index(&self, _collection: &str, _count: usize) {
            self.indexed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_retrieve(&self, _collection: &str, _query: &str, _results: &[Retrieved]) {
            self.retrieved.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn build_and_query_round_trip() {
        let store = memory_store().await;
        let embedder = Arc::new(StubEmbedder::text(8));
        let documents = vec![
            Document::text("the city budget for parks"),
            Document::text("restaurant opening hours"),
        ];

        let index = IndexBuilder::new(embedder, "text-collection")
            .build(store, documents)
            .await
            .unwrap();

        let results = index.query("the city budget for parks", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text.as_deref(), Some("the city budget for parks"));
    }

    #[tokio::test]
    async fn empty_document_set_yields_empty_results() {
        let store = memory_store().await;
        let embedder = Arc::new(StubEmbedder::text(8));

        let index = IndexBuilder::new(embedder, "text-collection")
            .build(store, Vec::new())
            .await
            .unwrap();

        let results = index.query("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn mismatched_modality_documents_are_skipped() {
        let store = memory_store().await;
        let embedder = Arc::new(StubEmbedder::text(8));
        let documents = vec![
            Document::text("kept"),
            Document::image("/data/photo.png"),
        ];

        let index = IndexBuilder::new(embedder, "text-collection")
            .build(store, documents)
            .await
            .unwrap();

        let results = index.query("kept", 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn from_persisted_requires_existing_collection() {
        let store = memory_store().await;
        let embedder = Arc::new(StubEmbedder::text(8));

        let err = Index::from_persisted(store, embedder, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[tokio::test]
    async fn from_persisted_attaches_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorStoreConfig::Local(LocalConfig::persisted(dir.path()));

        {
            let store = Arc::new(VectorStore::new(config.clone()).await.unwrap());
            let embedder = Arc::new(StubEmbedder::text(8));
            IndexBuilder::new(embedder, "text-collection")
                .build(store, vec![Document::text("persisted chunk")])
                .await
                .unwrap();
        }

        let store = Arc::new(VectorStore::new(config).await.unwrap());
        let embedder = Arc::new(StubEmbedder::text(8));
        let index = Index::from_persisted(store, embedder, "text-collection")
            .await
            .unwrap();

        let results = index.query("persisted chunk", 1).await.unwrap();
        assert_eq!(results[0].text.as_deref(), Some("persisted chunk"));
    }

    #[tokio::test]
    async fn observer_sees_index_and_retrieve() {
        let store = memory_store().await;
        let embedder = Arc::new(StubEmbedder::text(8));
        let observer = Arc::new(CountingObserver::default());

        let index = IndexBuilder::new(embedder, "text-collection")
            .with_observer(observer.clone())
            .build(store, vec![Document::text("observed")])
            .await
            .unwrap();
        index.query("observed", 1).await.unwrap();

        assert_eq!(observer.indexed.load(Ordering::SeqCst), 1);
        assert_eq!(observer.retrieved.load(Ordering::SeqCst), 1);
    }
}
