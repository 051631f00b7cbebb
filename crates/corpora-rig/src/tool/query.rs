//! Tools that query an index.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ParamSpec, Parameters, Tool};
use crate::index::Index;
use crate::{Error, Result};

/// Default number of results returned per query.
const DEFAULT_TOP_K: usize = 10;

/// A tool that answers natural-language queries against one index.
pub struct QueryTool {
    name: String,
    description: String,
    index: Arc<Index>,
    top_k: usize,
}

impl QueryTool {
    /// Creates a query tool over the given index.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        index: Arc<Index>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides the number of results per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Parameters {
        Parameters::new().required(
            "query",
            ParamSpec::string("Natural-language query to run against the index"),
        )
    }

    async fn call(&self, args: serde_json::Value) -> Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| Error::tool(&self.name, "missing 'query' argument"))?;

        let results = self.index.query(query, self.top_k).await?;
        if results.is_empty() {
            return Ok("No matching entries found.".to_string());
        }

        let formatted: Vec<String> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let body = r
                    .text
                    .as_deref()
                    .or(r.source.as_deref())
                    .unwrap_or("(no content)");
                match &r.source {
                    Some(source) if r.text.is_some() => {
                        format!("[{}] (score {:.3}, source {source})\n{body}", i + 1, r.score)
                    }
                    _ => format!("[{}] (score {:.3})\n{body}", i + 1, r.score),
                }
            })
            .collect();

        Ok(formatted.join("\n\n"))
    }
}

impl std::fmt::Debug for QueryTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTool")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use corpora_core::Document;
    use corpora_vector::{LocalConfig, VectorStore, VectorStoreConfig};
    use serde_json::json;

    use super::*;
    use crate::index::IndexBuilder;
    use crate::provider::embedding::testing::StubEmbedder;

    async fn indexed_tool() -> QueryTool {
        let config = VectorStoreConfig::Local(LocalConfig::in_memory());
        let store = Arc::new(VectorStore::new(config).await.unwrap());
        let embedder = Arc::new(StubEmbedder::text(8));
        let index = IndexBuilder::new(embedder, "text-collection")
            .build(store, vec![Document::text("annual park budget figures")])
            .await
            .unwrap();
        QueryTool::new("budget_tool", "Queries budget documents", Arc::new(index))
    }

    #[tokio::test]
    async fn query_returns_formatted_results() {
        let tool = indexed_tool().await;
        let output = tool
            .call(json!({"query": "annual park budget figures"}))
            .await
            .unwrap();
        assert!(output.contains("annual park budget figures"));
        assert!(output.starts_with("[1]"));
    }

    #[tokio::test]
    async fn missing_query_argument_is_an_error() {
        let tool = indexed_tool().await;
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }
}
