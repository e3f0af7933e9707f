use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use super::dtos::{
    DocumentResponse, ErrorResponse, HealthResponse, HeaderFooterResponse, PdfResponse,
    PublishRequest,
};
use super::router::AppState;
use crate::core::publishing::PublishError;

const INVALID_JSON: &str = "Invalid JSON body";

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        Json(ErrorResponse::from(&self)).into_response()
    }
}

/// JSON body extractor that answers malformed input with the usual error
/// envelope instead of axum's plain-text rejection. No content-type check.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let invalid = || PublishError::Validation(INVALID_JSON.to_string()).into_response();

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| invalid())?;
        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            invalid()
        })
    }
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        backend: state.backend.as_str(),
    })
}

pub async fn replace_content(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> Result<Json<DocumentResponse>, PublishError> {
    let doc = state
        .content
        .replace_content(req.doc_id.as_deref(), req.html_content.as_deref())
        .await?;
    Ok(Json(doc.into()))
}

pub async fn create_document(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> Result<Json<DocumentResponse>, PublishError> {
    let doc = state
        .content
        .create_document(req.html_content.as_deref(), req.file_name.as_deref())
        .await?;
    Ok(Json(doc.into()))
}

pub async fn apply_header_footer(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> Result<Json<HeaderFooterResponse>, PublishError> {
    let result = state
        .header_footer
        .apply_header_footer(req.doc_id.as_deref())
        .await?;
    Ok(Json(result.into()))
}

pub async fn export_pdf(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> Result<Json<PdfResponse>, PublishError> {
    let pdf = state.pdf.export_pdf(req.doc_id.as_deref()).await?;
    Ok(Json(pdf.into()))
}

/// Single-endpoint entry point kept for older callers: a body with HTML
/// replaces content, anything else refreshes the header and footer.
pub async fn legacy_dispatch(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> Response {
    if req.html_content.is_some() {
        replace_content(State(state), JsonBody(req))
            .await
            .into_response()
    } else {
        apply_header_footer(State(state), JsonBody(req))
            .await
            .into_response()
    }
}
