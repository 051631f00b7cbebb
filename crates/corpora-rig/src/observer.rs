//! Pipeline observation hooks.

use crate::TRACING_TARGET;
use crate::index::Retrieved;

/// Receives notifications at pipeline stage boundaries.
///
/// All methods have no-op defaults; implementors override the stages they
/// care about. Observers must not fail: they are informational only.
pub trait PipelineObserver: Send + Sync {
    /// Called after documents have been embedded and stored.
    fn on_index(&self, collection: &str, count: usize) {
        let _ = (collection, count);
    }

    /// Called after a retrieval completes, with the ranked results.
    fn on_retrieve(&self, collection: &str, query: &str, results: &[Retrieved]) {
        let _ = (collection, query, results);
    }

    /// Called when the agent finishes a prompt, with the number of tool
    /// rounds it took.
    fn on_generation(&self, rounds: usize) {
        let _ = rounds;
    }
}

/// Observer that logs stage completions via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_index(&self, collection: &str, count: usize) {
        tracing::info!(
            target: TRACING_TARGET,
            collection = %collection,
            count = %count,
            "Indexed documents"
        );
    }

    fn on_retrieve(&self, collection: &str, query: &str, results: &[Retrieved]) {
        tracing::info!(
            target: TRACING_TARGET,
            collection = %collection,
            query = %query,
            count = %results.len(),
            "Retrieved nodes"
        );
        for result in results {
            tracing::debug!(
                target: TRACING_TARGET,
                id = %result.id,
                score = %result.score,
                source = result.source.as_deref().unwrap_or("unknown"),
                "Retrieved node"
            );
        }
    }

    fn on_generation(&self, rounds: usize) {
        tracing::info!(
            target: TRACING_TARGET,
            rounds = %rounds,
            "Generation completed"
        );
    }
}
