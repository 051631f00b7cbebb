//! OpenAI streaming completion backend.

use async_trait::async_trait;
use futures::StreamExt;
use rig::completion::CompletionModel as RigCompletionModel;
use rig::completion::{CompletionRequest, ToolDefinition as RigToolDefinition};
use rig::message::{
    AssistantContent, Message, Text, ToolCall, ToolFunction, ToolResult, ToolResultContent,
    UserContent,
};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;

use super::backend::{CompletionBackend, GenerationEvent, GenerationStream};
use super::message::{ChatMessage, Role, ToolCallRequest};
use crate::tool::ToolDefinition;
use crate::{Error, Result};

/// Streaming completion backend over the OpenAI chat completions API.
pub struct OpenAiBackend {
    model: openai::CompletionModel,
    model_name: String,
}

impl OpenAiBackend {
    /// Creates a backend for the given model.
    pub fn new(api_key: &str, model_name: &str) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e.to_string()))?
            .completions_api();

        Ok(Self {
            model: client.completion_model(model_name),
            model_name: model_name.to_string(),
        })
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn stream_completion(
        &self,
        preamble: &str,
        history: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<GenerationStream> {
        let messages: Vec<Message> = history.iter().map(to_rig_message).collect();
        let chat_history = OneOrMany::many(messages).map_err(|_| {
            Error::provider("openai", "completion requires at least one message")
        })?;

        let request = CompletionRequest {
            preamble: (!preamble.is_empty()).then(|| preamble.to_string()),
            chat_history,
            documents: Vec::new(),
            tools: tools.iter().map(to_rig_tool).collect(),
            temperature: None,
            max_tokens: None,
            tool_choice: None,
            additional_params: None,
        };

        let response = self
            .model
            .stream(request)
            .await
            .map_err(|e| Error::provider("openai", e.to_string()))?;

        let stream = async_stream::stream! {
            let mut inner = response;
            while let Some(item) = inner.next().await {
                match item {
                    Ok(StreamedAssistantContent::Text(text)) => {
                        yield Ok(GenerationEvent::Delta(text.text));
                    }
                    Ok(StreamedAssistantContent::ToolCall(call)) => {
                        yield Ok(GenerationEvent::ToolCall(ToolCallRequest {
                            id: call.id,
                            name: call.function.name,
                            arguments: call.function.arguments,
                        }));
                    }
                    Ok(_) => {}
                    Err(e) => yield Err(Error::provider("openai", e.to_string())),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("model", &self.model_name)
            .finish()
    }
}

/// Converts a conversation message into rig's message type.
fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        Role::User => Message::User {
            content: OneOrMany::one(UserContent::text(&message.content)),
        },
        Role::Assistant => {
            let mut content: Vec<AssistantContent> = Vec::new();
            if !message.content.is_empty() {
                content.push(AssistantContent::Text(Text {
                    text: message.content.clone(),
                }));
            }
            for call in &message.tool_calls {
                content.push(AssistantContent::ToolCall(ToolCall {
                    id: call.id.clone(),
                    call_id: None,
                    function: ToolFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                    signature: None,
                    additional_params: None,
                }));
            }
            Message::Assistant {
                id: None,
                content: OneOrMany::many(content).unwrap_or_else(|_| {
                    OneOrMany::one(AssistantContent::Text(Text {
                        text: String::new(),
                    }))
                }),
            }
        }
        Role::Tool => Message::User {
            content: OneOrMany::one(UserContent::ToolResult(ToolResult {
                id: message.tool_call_id.clone().unwrap_or_default(),
                call_id: None,
                content: OneOrMany::one(ToolResultContent::text(&message.content)),
            })),
        },
    }
}

/// Converts a tool definition into rig's definition type.
fn to_rig_tool(definition: &ToolDefinition) -> RigToolDefinition {
    RigToolDefinition {
        name: definition.name.clone(),
        description: definition.description.clone(),
        parameters: definition.parameters.clone(),
    }
}
