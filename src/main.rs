// This is the entry point of the report publishing service.
//
// **Architecture Overview:**
// - `core/` = Publishing workflows and the ports they talk to
// - `infra/` = Implementations of those ports (Google APIs, in-memory)
// - `http/` = axum routes translating JSON to service calls
//
// This file's job is to:
// 1. Load configuration
// 2. Pick a backend and build the stores (dependency injection)
// 3. Serve the HTTP routes

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "config/app_config.rs"]
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Backend, PublishConfig};
use crate::core::publishing::Stores;
use crate::http::{build_router, AppState};
use crate::infra::memory::InMemoryWorkspace;

async fn build_stores(backend: Backend, publishing: &PublishConfig) -> anyhow::Result<Stores> {
    match backend {
        Backend::Google => {
            let (docs, files) = infra::google::stores_from_env()
                .await
                .context("Failed to set up Google service account")?;
            Ok(Stores::new(docs, files))
        }
        Backend::Memory => {
            let workspace = Arc::new(InMemoryWorkspace::new());
            // Seed configured templates as empty documents.
            for id in [
                publishing.template_doc_id.as_deref(),
                publishing.header_footer_template_id.as_deref(),
            ]
            .into_iter()
            .flatten()
            {
                workspace.insert_document(id, "Template", Vec::new());
            }
            tracing::warn!("Using in-memory backend; nothing is persisted");
            Ok(Stores::new(workspace.clone(), workspace))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG may come from .env
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        backend = config.backend.as_str(),
        template = config.publishing.template_doc_id.as_deref().unwrap_or("<unset>"),
        pdf_folder = config.publishing.pdf_folder_id.as_deref().unwrap_or("<unset>"),
        "Loaded configuration"
    );

    let stores = build_stores(config.backend, &config.publishing).await?;
    let state = AppState::new(stores, config.publishing.clone(), config.backend);
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
