//! The demo pipeline: load, index, and answer prompts with an agent.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use corpora_core::Modality;
use corpora_rig::agent::{Agent, AgentEvent, OpenAiBackend};
use corpora_rig::index::{Index, IndexBuilder};
use corpora_rig::provider::embedding::{ClipEmbedder, Embedder, MiniLmEmbedder};
use corpora_rig::reader::{self, ImageReader, PdfReader};
use corpora_rig::tool::{FunctionTool, ParamSpec, Parameters, QueryTool, ToolSet};
use corpora_rig::{PipelineObserver, TracingObserver};
use corpora_vector::VectorStore;
use futures::StreamExt;

use crate::TRACING_TARGET_PIPELINE;
use crate::config::Cli;

const TEXT_TOOL_NAME: &str = "san_francisco_budget_tool";
const TEXT_TOOL_DESCRIPTION: &str = "This tool can answer detailed questions about the \
    individual components of the budget of San Francisco in 2024-2025 & 2025-2026.";

const IMAGE_TOOL_NAME: &str = "health_panel_portfolio_tool";
const IMAGE_TOOL_DESCRIPTION: &str = "This tool can answer detailed questions the \
    architecture of portfolio module inside the Health Panel project.";

const DEMO_PROMPTS: [&str; 2] = [
    "What's the combined budget of San Francisco for community health and public \
     protection in 2024-25?",
    "What's the relations between subcomponents inside the portfolio module of \
     Health Panel project?",
];

/// Runs the full pipeline from configuration.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let store_config = cli
        .provider
        .vector_store_config(cli.pipeline.persist_dir.clone());
    let store = Arc::new(
        VectorStore::new(store_config)
            .await
            .context("failed to initialize vector store")?,
    );
    let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);

    let text_embedder: Arc<dyn Embedder> =
        Arc::new(MiniLmEmbedder::new().context("failed to load text embedding model")?);
    let image_embedder: Arc<dyn Embedder> =
        Arc::new(ClipEmbedder::new().context("failed to load image embedding model")?);

    let (text_index, image_index) = if cli.pipeline.from_persisted {
        attach_indexes(&cli, store, text_embedder, image_embedder, observer.clone()).await?
    } else {
        build_indexes(&cli, store, text_embedder, image_embedder, observer.clone()).await?
    };

    let tools = build_tools(&cli, text_index, image_index)?;

    let backend = Arc::new(
        OpenAiBackend::new(&cli.provider.openai_api_key, &cli.provider.openai_model)
            .context("failed to create completion backend")?,
    );
    let agent = Agent::new(backend, Arc::new(tools)).with_observer(observer);

    let prompts: Vec<String> = if cli.pipeline.prompts.is_empty() {
        DEMO_PROMPTS.iter().map(|p| p.to_string()).collect()
    } else {
        cli.pipeline.prompts.clone()
    };

    for prompt in prompts {
        run_prompt(&agent, &prompt).await?;
    }

    println!("Done");
    Ok(())
}

/// Reads the data directory and builds both per-modality indexes.
async fn build_indexes(
    cli: &Cli,
    store: Arc<VectorStore>,
    text_embedder: Arc<dyn Embedder>,
    image_embedder: Arc<dyn Embedder>,
    observer: Arc<dyn PipelineObserver>,
) -> anyhow::Result<(Index, Index)> {
    let documents = reader::load_dir(
        &cli.pipeline.data_dir,
        &[&PdfReader::new(), &ImageReader::new()],
    )
    .with_context(|| format!("failed to load {}", cli.pipeline.data_dir.display()))?;

    let (text_documents, image_documents): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|d| d.modality() == Modality::Text);

    tracing::info!(
        target: TRACING_TARGET_PIPELINE,
        text = text_documents.len(),
        images = image_documents.len(),
        "Loaded documents"
    );

    let text_index = IndexBuilder::new(text_embedder, &cli.pipeline.text_collection)
        .with_observer(observer.clone())
        .build(store.clone(), text_documents)
        .await
        .context("failed to build text index")?;

    let image_index = IndexBuilder::new(image_embedder, &cli.pipeline.image_collection)
        .with_observer(observer)
        .build(store, image_documents)
        .await
        .context("failed to build image index")?;

    Ok((text_index, image_index))
}

/// Attaches both indexes to collections populated by an earlier run.
async fn attach_indexes(
    cli: &Cli,
    store: Arc<VectorStore>,
    text_embedder: Arc<dyn Embedder>,
    image_embedder: Arc<dyn Embedder>,
    observer: Arc<dyn PipelineObserver>,
) -> anyhow::Result<(Index, Index)> {
    let text_index =
        Index::from_persisted(store.clone(), text_embedder, &cli.pipeline.text_collection)
            .await
            .context("failed to attach to persisted text collection")?
            .with_observer(observer.clone());

    let image_index =
        Index::from_persisted(store, image_embedder, &cli.pipeline.image_collection)
            .await
            .context("failed to attach to persisted image collection")?
            .with_observer(observer);

    Ok((text_index, image_index))
}

/// Registers the two index query tools and the sum function tool.
fn build_tools(cli: &Cli, text_index: Index, image_index: Index) -> anyhow::Result<ToolSet> {
    let mut tools = ToolSet::new();

    tools.register(Arc::new(
        QueryTool::new(TEXT_TOOL_NAME, TEXT_TOOL_DESCRIPTION, Arc::new(text_index))
            .with_top_k(cli.pipeline.top_k),
    ))?;

    tools.register(Arc::new(
        QueryTool::new(IMAGE_TOOL_NAME, IMAGE_TOOL_DESCRIPTION, Arc::new(image_index))
            .with_top_k(cli.pipeline.top_k),
    ))?;

    tools.register(Arc::new(FunctionTool::new(
        "sum_numbers",
        "Use this function to sum two numbers",
        Parameters::new()
            .required("a", ParamSpec::number("First number to sum"))
            .required("b", ParamSpec::number("Second number to sum")),
        |args| async move {
            let a = args["a"].as_f64().unwrap_or_default();
            let b = args["b"].as_f64().unwrap_or_default();
            let sum = a + b;
            if sum.fract() == 0.0 {
                Ok(format!("{}", sum as i64))
            } else {
                Ok(format!("{sum}"))
            }
        },
    )))?;

    Ok(tools)
}

/// Streams one prompt through the agent, printing deltas as they arrive.
async fn run_prompt(agent: &Agent, prompt: &str) -> anyhow::Result<()> {
    println!("> {prompt}\n");

    let mut stream = agent.run_stream(prompt);
    let mut stdout = std::io::stdout();

    while let Some(event) = stream.next().await {
        match event? {
            AgentEvent::Delta(delta) => {
                print!("{delta}");
                stdout.flush()?;
            }
            AgentEvent::ToolCallStarted { name, .. } => {
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    tool = %name,
                    "Agent calling tool"
                );
            }
            AgentEvent::ToolResult { name, success, .. } => {
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    tool = %name,
                    success,
                    "Tool finished"
                );
            }
            AgentEvent::Completed { rounds } => {
                tracing::debug!(
                    target: TRACING_TARGET_PIPELINE,
                    rounds,
                    "Prompt completed"
                );
            }
        }
    }

    println!("\n");
    Ok(())
}
