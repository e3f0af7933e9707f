use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::{Backend, PublishConfig};
use crate::core::publishing::{ContentService, HeaderFooterService, PdfExportService, Stores};

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub content: Arc<ContentService>,
    pub header_footer: Arc<HeaderFooterService>,
    pub pdf: Arc<PdfExportService>,
}

impl AppState {
    pub fn new(stores: Stores, config: PublishConfig, backend: Backend) -> Self {
        Self {
            backend,
            content: Arc::new(ContentService::new(stores.clone(), config.clone())),
            header_footer: Arc::new(HeaderFooterService::new(stores.clone(), config.clone())),
            pdf: Arc::new(PdfExportService::new(stores, config)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::legacy_dispatch))
        .route("/health", get(handlers::health_check))
        .route("/documents", post(handlers::create_document))
        .route("/documents/content", post(handlers::replace_content))
        .route("/documents/header-footer", post(handlers::apply_header_footer))
        .route("/documents/pdf", post(handlers::export_pdf))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
