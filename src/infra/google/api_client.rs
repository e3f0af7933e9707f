// Shared authorized HTTP client for the Docs and Drive stores.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

use super::service_account::ServiceAccountAuth;
use crate::core::documents::StoreError;

pub const DOCS_API: &str = "https://docs.googleapis.com/v1";
pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GoogleApiClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
}

impl GoogleApiClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Attach a fresh bearer token, send, and turn non-2xx responses into `StoreError::Api`.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let token = self.auth.get_access_token().await?;
        let response = request
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status, body = text.as_str(), "Google API request failed");
        Err(StoreError::api(status, error_message(&text)))
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

/// Google wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Requested entity was not found.");
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }
}
