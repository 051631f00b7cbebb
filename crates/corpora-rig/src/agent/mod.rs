//! Streaming tool-calling agent.
//!
//! The agent runs a completion loop: it streams a model generation, and
//! whenever the model requests tool calls it executes them, appends the
//! results to the conversation, and starts another round. The loop ends
//! when a round produces no tool calls, or errors once the round limit is
//! exceeded.

mod backend;
mod message;
mod openai;

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::{BoxStream, StreamExt};

pub use backend::{CompletionBackend, GenerationEvent, GenerationStream};
pub use message::{ChatMessage, Role, ToolCallRequest};
pub use openai::OpenAiBackend;

use crate::observer::PipelineObserver;
use crate::tool::ToolSet;
use crate::{Error, Result, TRACING_TARGET};

/// Default limit on tool rounds per run.
const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// An event surfaced while the agent processes a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A text delta from the model.
    Delta(String),
    /// The model requested a tool call.
    ToolCallStarted {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// A tool call finished; its result is fed back to the model.
    ToolResult {
        id: String,
        name: String,
        success: bool,
        content: String,
    },
    /// The run finished after the given number of tool rounds.
    Completed { rounds: usize },
}

/// A tool-calling agent over a completion backend.
pub struct Agent {
    backend: Arc<dyn CompletionBackend>,
    tools: Arc<ToolSet>,
    preamble: String,
    max_tool_rounds: usize,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl Agent {
    /// Creates an agent with the given backend and tools.
    pub fn new(backend: Arc<dyn CompletionBackend>, tools: Arc<ToolSet>) -> Self {
        Self {
            backend,
            tools,
            preamble: String::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            observer: None,
        }
    }

    /// Sets the system preamble.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Overrides the tool round limit.
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Attaches an observer notified when a prompt completes.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Processes a prompt, yielding events as they occur.
    pub fn run_stream(&self, prompt: impl Into<String>) -> BoxStream<'_, Result<AgentEvent>> {
        let prompt = prompt.into();
        let stream = try_stream! {
            let definitions = self.tools.definitions();
            let mut history = vec![ChatMessage::user(prompt)];
            let mut rounds = 0usize;

            loop {
                let mut generation = self
                    .backend
                    .stream_completion(&self.preamble, &history, &definitions)
                    .await?;

                let mut text = String::new();
                let mut calls: Vec<ToolCallRequest> = Vec::new();

                while let Some(event) = generation.next().await {
                    match event? {
                        GenerationEvent::Delta(delta) => {
                            text.push_str(&delta);
                            yield AgentEvent::Delta(delta);
                        }
                        GenerationEvent::ToolCall(call) => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                tool = %call.name,
                                "Model requested tool call"
                            );
                            yield AgentEvent::ToolCallStarted {
                                id: call.id.clone(),
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            };
                            calls.push(call);
                        }
                    }
                }

                if calls.is_empty() {
                    if let Some(observer) = &self.observer {
                        observer.on_generation(rounds);
                    }
                    yield AgentEvent::Completed { rounds };
                    break;
                }

                rounds += 1;
                if rounds > self.max_tool_rounds {
                    Err(Error::agent(format!(
                        "exceeded {} tool rounds without a final answer",
                        self.max_tool_rounds
                    )))?;
                }

                history.push(ChatMessage::assistant_with_calls(text, calls.clone()));
                for call in calls {
                    let outcome = self.tools.execute(&call.name, call.arguments.clone()).await;
                    let content = if outcome.success {
                        outcome.content
                    } else {
                        format!("error: {}", outcome.content)
                    };

                    yield AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        success: outcome.success,
                        content: content.clone(),
                    };
                    history.push(ChatMessage::tool_result(call.id, content));
                }
            }
        };

        Box::pin(stream)
    }

    /// Processes a prompt and returns the final answer text.
    pub async fn run(&self, prompt: impl Into<String>) -> Result<String> {
        let mut stream = self.run_stream(prompt);
        let mut answer = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                AgentEvent::Delta(delta) => answer.push_str(&delta),
                // Deltas so far belonged to a tool-calling round, not the
                // final answer.
                AgentEvent::ToolResult { .. } => answer.clear(),
                AgentEvent::ToolCallStarted { .. } | AgentEvent::Completed { .. } => {}
            }
        }

        Ok(answer)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("tools", &self.tools)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde_json::json;

    use super::*;
    use crate::tool::{FunctionTool, ParamSpec, Parameters, ToolDefinition};

    /// Backend that replays scripted rounds and records the history it was
    /// given for each call.
    struct ScriptedBackend {
        rounds: Mutex<VecDeque<Vec<GenerationEvent>>>,
        histories: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(rounds: Vec<Vec<GenerationEvent>>) -> Self {
            Self {
                rounds: Mutex::new(rounds.into()),
                histories: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn stream_completion(
            &self,
            _preamble: &str,
            history: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<GenerationStream> {
            self.histories.lock().unwrap().push(history.to_vec());
            let events = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
        }
    }

    fn delta(text: &str) -> GenerationEvent {
        GenerationEvent::Delta(text.to_string())
    }

    fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> GenerationEvent {
        GenerationEvent::ToolCall(ToolCallRequest {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        })
    }

    fn sum_tools() -> Arc<ToolSet> {
        let mut tools = ToolSet::new();
        tools
            .register(Arc::new(FunctionTool::new(
                "sum_numbers",
                "Adds two numbers",
                Parameters::new()
                    .required("a", ParamSpec::number("first addend"))
                    .required("b", ParamSpec::number("second addend")),
                |args| async move {
                    let sum = args["a"].as_f64().unwrap_or_default()
                        + args["b"].as_f64().unwrap_or_default();
                    Ok(format!("{}", sum as i64))
                },
            )))
            .unwrap();
        Arc::new(tools)
    }

    #[tokio::test]
    async fn plain_answer_concatenates_deltas() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![
            delta("Hello"),
            delta(" world"),
        ]]));
        let agent = Agent::new(backend, Arc::new(ToolSet::new()));

        let answer = agent.run("greet me").await.unwrap();
        assert_eq!(answer, "Hello world");
    }

    #[tokio::test]
    async fn completion_event_reports_zero_rounds_without_tools() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![delta("done")]]));
        let agent = Agent::new(backend, Arc::new(ToolSet::new()));

        let events: Vec<AgentEvent> = agent
            .run_stream("prompt")
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events.last(), Some(&AgentEvent::Completed { rounds: 0 }));
    }

    #[tokio::test]
    async fn tool_round_feeds_result_back() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![tool_call("call-1", "sum_numbers", json!({"a": 2, "b": 3}))],
            vec![delta("The sum is 5.")],
        ]));
        let agent = Agent::new(backend.clone(), sum_tools());

        let events: Vec<AgentEvent> = agent
            .run_stream("add 2 and 3")
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert!(events.contains(&AgentEvent::ToolResult {
            id: "call-1".into(),
            name: "sum_numbers".into(),
            success: true,
            content: "5".into(),
        }));
        assert_eq!(events.last(), Some(&AgentEvent::Completed { rounds: 1 }));

        // The second round's history carries the tool result.
        let histories = backend.histories.lock().unwrap();
        assert_eq!(histories.len(), 2);
        let tool_message = histories[1]
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result in history");
        assert_eq!(tool_message.content, "5");
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call-1"));
    }

    #[tokio::test]
    async fn run_returns_final_round_text_only() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![
                delta("Let me check."),
                tool_call("call-1", "sum_numbers", json!({"a": 2, "b": 3})),
            ],
            vec![delta("The sum is 5.")],
        ]));
        let agent = Agent::new(backend, sum_tools());

        let answer = agent.run("add 2 and 3").await.unwrap();
        assert_eq!(answer, "The sum is 5.");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_and_loop_continues() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![tool_call("call-1", "bogus_tool", json!({}))],
            vec![delta("I could not use that tool.")],
        ]));
        let agent = Agent::new(backend.clone(), sum_tools());

        let events: Vec<AgentEvent> = agent
            .run_stream("try something")
            .map(|e| e.unwrap())
            .collect()
            .await;

        let failure = events
            .iter()
            .find_map(|e| match e {
                AgentEvent::ToolResult {
                    success, content, ..
                } => Some((*success, content.clone())),
                _ => None,
            })
            .expect("tool result event");
        assert!(!failure.0);
        assert!(failure.1.contains("not found"));
        assert_eq!(events.last(), Some(&AgentEvent::Completed { rounds: 1 }));

        // The failure message was fed back to the model.
        let histories = backend.histories.lock().unwrap();
        let tool_message = histories[1]
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result in history");
        assert!(tool_message.content.contains("not found"));
    }

    #[tokio::test]
    async fn observer_sees_completed_generation() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct RoundRecorder {
            rounds: AtomicUsize,
            calls: AtomicUsize,
        }

        impl crate::PipelineObserver for RoundRecorder {
            fn on_generation(&self, rounds: usize) {
                self.rounds.store(rounds, Ordering::SeqCst);
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![tool_call("call-1", "sum_numbers", json!({"a": 1, "b": 2}))],
            vec![delta("3")],
        ]));
        let observer = Arc::new(RoundRecorder::default());
        let agent = Agent::new(backend, sum_tools()).with_observer(observer.clone());

        agent.run("add 1 and 2").await.unwrap();
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(observer.rounds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn round_limit_is_enforced() {
        let rounds = (0..10)
            .map(|i| vec![tool_call(&format!("call-{i}"), "sum_numbers", json!({"a": 1, "b": 1}))])
            .collect();
        let backend = Arc::new(ScriptedBackend::new(rounds));
        let agent = Agent::new(backend, sum_tools()).with_max_tool_rounds(2);

        let result: Result<Vec<AgentEvent>> =
            agent.run_stream("loop forever").try_collect().await;
        assert!(matches!(result, Err(Error::Agent(_))));
    }
}
