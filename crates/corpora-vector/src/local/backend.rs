//! Local backend implementation.
//!
//! Collections live in memory; when a snapshot directory is configured,
//! `persist` writes each collection to `<dir>/<collection>.json` and the
//! snapshots are loaded back on startup, so a later run can attach to the
//! persisted store without re-embedding.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::TRACING_TARGET;
use crate::config::LocalConfig;
use crate::error::{VectorError, VectorResult};
use crate::store::{SearchOptions, SearchResult, VectorData, VectorStoreBackend};

/// A single named collection.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    dimensions: usize,
    vectors: Vec<VectorData>,
}

/// Local backend implementation.
pub struct LocalBackend {
    collections: RwLock<HashMap<String, Collection>>,
    persist_dir: Option<PathBuf>,
}

impl LocalBackend {
    /// Creates a new local backend, loading any snapshots present in the
    /// configured directory.
    pub async fn new(config: &LocalConfig) -> VectorResult<Self> {
        let backend = Self {
            collections: RwLock::new(HashMap::new()),
            persist_dir: config.persist_dir.clone(),
        };

        if let Some(dir) = &backend.persist_dir {
            backend.load_snapshots(dir.clone()).await?;
        }

        Ok(backend)
    }

    /// Creates an in-memory backend without persistence.
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            persist_dir: None,
        }
    }

    async fn load_snapshots(&self, dir: PathBuf) -> VectorResult<()> {
        if !dir.is_dir() {
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| VectorError::persistence(e.to_string()))?;

        let mut collections = self.collections.write().await;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VectorError::persistence(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = tokio::fs::read(&path)
                .await
                .map_err(|e| VectorError::persistence(e.to_string()))?;
            let collection: Collection = serde_json::from_slice(&content)?;

            tracing::info!(
                target: TRACING_TARGET,
                collection = %name,
                count = %collection.vectors.len(),
                "Loaded collection snapshot"
            );
            collections.insert(name.to_string(), collection);
        }

        Ok(())
    }

    async fn write_snapshot(&self, name: &str, collection: &Collection) -> VectorResult<()> {
        let Some(dir) = &self.persist_dir else {
            return Ok(());
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| VectorError::persistence(e.to_string()))?;

        let content = serde_json::to_vec(collection)?;
        let path = dir.join(format!("{name}.json"));
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| VectorError::persistence(e.to_string()))?;

        Ok(())
    }

    async fn remove_snapshot(&self, name: &str) -> VectorResult<()> {
        let Some(dir) = &self.persist_dir else {
            return Ok(());
        };

        let path = dir.join(format!("{name}.json"));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VectorError::persistence(e.to_string())),
        }
    }
}

#[async_trait]
impl VectorStoreBackend for LocalBackend {
    async fn create_collection(&self, name: &str, dimensions: usize) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_insert(Collection {
            dimensions,
            vectors: Vec::new(),
        });
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        self.collections.write().await.remove(name);
        self.remove_snapshot(name).await
    }

    async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                dimensions: vectors[0].vector.len(),
                vectors: Vec::new(),
            });

        for vector in vectors {
            if vector.vector.len() != entry.dimensions {
                return Err(VectorError::dimension_mismatch(
                    entry.dimensions,
                    vector.vector.len(),
                ));
            }
            match entry.vectors.iter_mut().find(|v| v.id == vector.id) {
                Some(existing) => *existing = vector,
                None => entry.vectors.push(vector),
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<SearchResult> = entry
            .vectors
            .iter()
            .filter(|v| matches_filter(&v.metadata, options.filter.as_ref()))
            .map(|v| SearchResult {
                id: v.id.clone(),
                score: cosine_similarity(&query, &v.vector),
                metadata: v.metadata.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn persist(&self) -> VectorResult<()> {
        let collections = self.collections.read().await;
        for (name, collection) in collections.iter() {
            self.write_snapshot(name, collection).await?;
        }
        Ok(())
    }
}

/// Checks that every filter key matches the stored metadata value exactly.
fn matches_filter(
    metadata: &HashMap<String, serde_json::Value>,
    filter: Option<&serde_json::Value>,
) -> bool {
    let Some(serde_json::Value::Object(conditions)) = filter else {
        return true;
    };
    conditions
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(id: &str, vector: Vec<f32>) -> VectorData {
        VectorData::new(id, vector)
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let backend = LocalBackend::in_memory();
        backend
            .upsert(
                "text",
                vec![
                    data("a", vec![1.0, 0.0]),
                    data("b", vec![0.0, 1.0]),
                    data("c", vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let results = backend
            .search("text", vec![1.0, 0.0], 2, SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "c");
    }

    #[tokio::test]
    async fn search_missing_collection_is_empty() {
        let backend = LocalBackend::in_memory();
        let results = backend
            .search("nothing", vec![1.0, 0.0], 5, SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let backend = LocalBackend::in_memory();
        backend
            .upsert("text", vec![data("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        backend
            .upsert("text", vec![data("a", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = backend
            .search("text", vec![0.0, 1.0], 5, SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn upsert_rejects_dimension_mismatch() {
        let backend = LocalBackend::in_memory();
        backend
            .upsert("text", vec![data("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = backend
            .upsert("text", vec![data("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn metadata_filter_restricts_results() {
        let backend = LocalBackend::in_memory();
        backend
            .upsert(
                "mixed",
                vec![
                    data("a", vec![1.0, 0.0]).with_field("modality", json!("text")),
                    data("b", vec![1.0, 0.0]).with_field("modality", json!("image")),
                ],
            )
            .await
            .unwrap();

        let results = backend
            .search(
                "mixed",
                vec![1.0, 0.0],
                5,
                SearchOptions::new().with_filter(json!({"modality": "text"})),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
    }

    #[tokio::test]
    async fn snapshot_written_only_on_persist() {
        let dir = tempfile::tempdir().unwrap();
        let config = LocalConfig::persisted(dir.path());
        let snapshot = dir.path().join("text.json");

        let backend = LocalBackend::new(&config).await.unwrap();
        backend
            .upsert("text", vec![data("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        assert!(!snapshot.exists());

        backend.persist().await.unwrap();
        assert!(snapshot.exists());
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = LocalConfig::persisted(dir.path());

        {
            let backend = LocalBackend::new(&config).await.unwrap();
            backend
                .upsert("text", vec![data("a", vec![1.0, 0.0]).with_field("source", json!("x"))])
                .await
                .unwrap();
            backend.persist().await.unwrap();
        }

        let restored = LocalBackend::new(&config).await.unwrap();
        assert!(restored.collection_exists("text").await.unwrap());

        let results = restored
            .search("text", vec![1.0, 0.0], 1, SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].metadata.get("source"), Some(&json!("x")));
    }
}
