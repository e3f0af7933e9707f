use serde::{Deserialize, Serialize};

use crate::core::publishing::{ExportedPdf, HeaderFooterResult, PublishError, PublishedDocument};

// ============================================================================
// Requests
// ============================================================================

/// Shared request body. Each route reads the fields it needs; `action` is
/// accepted for older clients and otherwise ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub doc_id: Option<String>,
    pub html_content: Option<String>,
    pub file_name: Option<String>,
    #[allow(dead_code)]
    pub action: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub success: bool,
    pub doc_id: String,
    pub url: String,
}

impl From<PublishedDocument> for DocumentResponse {
    fn from(doc: PublishedDocument) -> Self {
        Self {
            success: true,
            doc_id: doc.doc_id,
            url: doc.url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterResponse {
    pub success: bool,
    pub doc_id: String,
    pub url: String,
    pub header_elements: usize,
    pub footer_elements: usize,
}

impl From<HeaderFooterResult> for HeaderFooterResponse {
    fn from(result: HeaderFooterResult) -> Self {
        Self {
            success: true,
            doc_id: result.doc_id,
            url: result.url,
            header_elements: result.header_elements,
            footer_elements: result.footer_elements,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfResponse {
    pub success: bool,
    pub pdf_file_id: String,
    pub url: String,
}

impl From<ExportedPdf> for PdfResponse {
    fn from(pdf: ExportedPdf) -> Self {
        Self {
            success: true,
            pdf_file_id: pdf.pdf_file_id,
            url: pdf.url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl From<&PublishError> for ErrorResponse {
    fn from(err: &PublishError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}
