//! Completion backend abstraction.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::message::{ChatMessage, ToolCallRequest};
use crate::Result;
use crate::tool::ToolDefinition;

/// One increment of a streamed model generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// A text delta.
    Delta(String),
    /// A complete tool call request.
    ToolCall(ToolCallRequest),
}

/// Stream of generation events.
pub type GenerationStream = BoxStream<'static, Result<GenerationEvent>>;

/// A streaming chat completion provider.
///
/// Implementations translate the conversation and tool definitions into a
/// provider request and surface the response as a stream of
/// [`GenerationEvent`]s.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Starts a streamed completion over the given conversation.
    async fn stream_completion(
        &self,
        preamble: &str,
        history: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<GenerationStream>;
}
