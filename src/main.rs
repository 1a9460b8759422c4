//! Sift command-line entrypoint.
//!
//! `sift [--json] [query words…]` answers one query; without words it reads one query
//! per stdin line, all in a single conversation.

use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use sift::config::Config;
use sift::corpus::{CorpusIndex, load_jsonl};
use sift::embedding::{EmbeddingService, HttpEmbedder, HttpEmbedderConfig, StubEmbedder};
use sift::judge::build_judge;
use sift::retrieval::HybridRetriever;
use sift::routing::{AnswerResponse, RoutingError, RoutingOrchestrator, ServiceHandles};
use sift::services::{
    GenaiRewriter, GenaiSynthesizer, HttpStructuredExecutor, InMemoryHistory, StructuredExecutor,
    StructuredSchema, UnconfiguredExecutor,
};
use sift::QueryClassifier;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: sift [--json] [query words...]\n\
Without a query, reads one question per line from stdin.\n\
Configuration comes from SIFT_* environment variables; logging from RUST_LOG.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut json = false;
    let mut words = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ => words.push(arg),
        }
    }

    let config = Config::from_env()?;
    config.validate()?;

    let orchestrator = build_orchestrator(&config).await?;

    if !words.is_empty() {
        let result = orchestrator.handle(&words.join(" "), None).await;
        return report(result, json);
    }

    let conversation = uuid::Uuid::new_v4().to_string();
    info!(%conversation, "Reading queries from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = orchestrator.handle(&line, Some(&conversation)).await;
        if let Err(e) = report(result, json) {
            eprintln!("error: {e:#}");
        }
    }

    Ok(())
}

async fn build_orchestrator(config: &Config) -> anyhow::Result<RoutingOrchestrator> {
    let retry = config.retry.clone();

    let embedder: Arc<dyn EmbeddingService> = match config.embedding_url {
        Some(ref url) => Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
            url: url.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dim,
            api_key: config.embedding_api_key.clone(),
            timeout: config.request_timeout,
        })?),
        None => {
            warn!("No SIFT_EMBEDDING_URL configured, using the hashed stub embedder");
            Arc::new(StubEmbedder::new(config.embedding_dim))
        }
    };

    let records = match config.corpus_path {
        Some(ref path) => load_jsonl(path)?,
        None => {
            warn!("No SIFT_CORPUS_PATH configured, starting with an empty corpus");
            Vec::new()
        }
    };
    let index = CorpusIndex::build_with_embedder(records, embedder.as_ref(), &retry)
        .await
        .context("failed to build corpus index")?;

    let judge = build_judge(&config.judge)?;
    let retriever = HybridRetriever::new(
        Arc::new(index),
        embedder,
        judge,
        config.retrieval.clone(),
        retry.clone(),
    )?;

    let structured: Arc<dyn StructuredExecutor> = match config.structured_url {
        Some(ref url) => Arc::new(HttpStructuredExecutor::new(url.clone(), config.request_timeout)?),
        None => {
            warn!("No SIFT_STRUCTURED_URL configured, statistical queries will use retrieval");
            Arc::new(UnconfiguredExecutor)
        }
    };

    let schema = match config.schema_path {
        Some(ref path) => StructuredSchema::from_file(path)
            .with_context(|| format!("failed to read schema {}", path.display()))?,
        None => StructuredSchema::default(),
    };

    let mut services = ServiceHandles::new(
        structured,
        Arc::new(GenaiSynthesizer::new(config.synthesis_model.clone())),
        Arc::new(InMemoryHistory::new(
            config.history_capacity,
            config.history_max_turns,
        )),
    )
    .with_schema(schema);

    if let Some(ref model) = config.rewrite_model {
        services = services.with_rewriter(Arc::new(GenaiRewriter::new(model.clone())));
    }

    let orchestrator = RoutingOrchestrator::new(
        Arc::new(QueryClassifier::standard()?),
        Arc::new(retriever),
        services,
        retry,
        config.routing(),
    )?;

    info!(
        synthesis_model = %config.synthesis_model,
        judge = ?config.judge.kind,
        "Sift ready"
    );
    Ok(orchestrator)
}

fn report(result: Result<AnswerResponse, RoutingError>, json: bool) -> anyhow::Result<()> {
    match result {
        Ok(response) if json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Ok(response) => {
            println!("{}", response.answer);
            eprintln!(
                "[route: {} → {}, {} passages]",
                response.routing_trail.chosen_route,
                response.route_taken,
                response.evidence_bundle.passages.len()
            );
        }
        Err(err) => {
            if json && let Some(trail) = err.trail() {
                eprintln!("{}", serde_json::to_string_pretty(trail)?);
            }
            return Err(err.into());
        }
    }
    Ok(())
}
