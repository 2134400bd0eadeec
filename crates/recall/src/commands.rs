// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command opens the configured database, wires the router and its
//! collaborators, runs one operation and prints the result as JSON.

use std::sync::Arc;

use recall_anthropic::AnthropicProvider;
use recall_config::RecallConfig;
use recall_core::{EmbeddingAdapter, ProviderAdapter, RecallError};
use recall_memory::{
    HttpEmbedder, LlmEpisodeSummarizer, MemoryRouter, MemoryStore, Metadata, NewMemory,
    Normalizer, SearchQuery,
};
use recall_storage::Database;
use serde::Serialize;
use tracing::info;

use crate::{ArtifactCommands, Commands, SearchArgs, StoreCommands};

/// Fully wired components for one CLI invocation.
struct App {
    db: Database,
    store: Arc<MemoryStore>,
    router: MemoryRouter,
}

impl App {
    async fn open(config: &RecallConfig) -> Result<Self, RecallError> {
        let db = Database::from_config(&config.storage).await?;
        let embedder = HttpEmbedder::from_config(&config.memory.embedding)?
            .map(|e| Arc::new(e) as Arc<dyn EmbeddingAdapter>);
        if embedder.is_none() {
            info!("no embedding endpoint configured; vector ranking disabled");
        }
        let store = Arc::new(MemoryStore::new(&db, embedder, &config.memory));
        let router = MemoryRouter::new(store.clone(), &config.memory);
        Ok(Self { db, store, router })
    }
}

fn provider_for(config: &RecallConfig, model: &str) -> Result<Arc<dyn ProviderAdapter>, RecallError> {
    Ok(Arc::new(AnthropicProvider::from_config(config, model)?))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), RecallError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one parsed subcommand against the configured database.
pub async fn run(config: &RecallConfig, command: Commands) -> Result<(), RecallError> {
    match command {
        Commands::Normalize { raw } => {
            let provider = provider_for(config, &config.normalizer.model)?;
            let normalized = Normalizer::new(provider, &config.normalizer)
                .normalize(&raw)
                .await?;
            print_json(&normalized)
        }
        Commands::Store(StoreCommands::Clear { yes: false }) => Err(RecallError::Validation(
            "refusing to delete all memory without --yes".into(),
        )),
        Commands::Store(command) => {
            let app = App::open(config).await?;
            let result = dispatch(config, &app, command).await;
            app.db.close().await?;
            result
        }
    }
}

async fn dispatch(
    config: &RecallConfig,
    app: &App,
    command: StoreCommands,
) -> Result<(), RecallError> {
    match command {
        StoreCommands::Remember {
            content,
            scope,
            item_type,
            agent,
            thread,
            importance,
        } => {
            let mut memory = NewMemory::new(item_type, scope, content).importance(importance);
            if let Some(agent) = agent {
                memory = memory.agent(agent);
            }
            if let Some(thread) = thread {
                memory = memory.thread(thread);
            }
            print_json(&app.store.remember(memory).await?)
        }
        StoreCommands::Search(args) => {
            let query = search_query(app, args).await;
            print_json(&app.store.search_memory(&query).await?)
        }
        StoreCommands::Personal { raw, agent, thread } => {
            let provider = provider_for(config, &config.normalizer.model)?;
            let normalized = Normalizer::new(provider, &config.normalizer)
                .normalize(&raw)
                .await?;
            let item = app
                .router
                .add_personal_memory(agent.as_deref(), &raw, &normalized, thread.as_deref())
                .await?;
            print_json(&item)
        }
        StoreCommands::Reflect { agent, thread } => {
            let provider = provider_for(config, &config.summarizer.model)?;
            let summarizer = LlmEpisodeSummarizer::new(provider, &config.summarizer);
            print_json(&app.router.reflect(&agent, &thread, &summarizer).await?)
        }
        StoreCommands::Artifact { action } => run_artifact(app, action).await,
        StoreCommands::Clear { .. } => {
            let removed = app.store.clear_all().await?;
            info!(removed, "memory cleared");
            print_json(&serde_json::json!({ "removed": removed }))
        }
    }
}

async fn search_query(app: &App, args: SearchArgs) -> SearchQuery {
    let mut query = SearchQuery::new(args.query.as_str())
        .with_types(args.types)
        .with_tags(args.tags)
        .include_global(args.global)
        .hybrid(args.hybrid);
    if let Some(agent) = args.agent {
        query = query.for_agent(agent);
    }
    if let Some(min) = args.min_importance {
        query = query.with_min_importance(min);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if !args.query.trim().is_empty()
        && let Some(embedding) = app.store.embed_soft(&args.query).await
    {
        query = query.with_embedding(embedding);
    }
    query
}

async fn run_artifact(app: &App, action: ArtifactCommands) -> Result<(), RecallError> {
    match action {
        ArtifactCommands::Add {
            body,
            title,
            agent,
            thread,
        } => {
            let artifact = app
                .router
                .add_artifact(
                    agent.as_deref(),
                    thread.as_deref(),
                    title.as_deref(),
                    &body,
                    Metadata::new(),
                )
                .await?;
            print_json(&artifact)
        }
        ArtifactCommands::Get { id } => match app.store.get_artifact(id).await? {
            Some(artifact) => print_json(&artifact),
            None => Err(RecallError::NotFound(format!("artifact {id}"))),
        },
        ArtifactCommands::List {
            agent,
            global,
            limit,
        } => {
            let artifacts = app
                .store
                .list_artifacts(agent.as_deref(), global, limit)
                .await?;
            print_json(&artifacts)
        }
    }
}
