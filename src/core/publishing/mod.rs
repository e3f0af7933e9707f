// The publishing module holds the four request workflows.
// Each one is a straight-line sequence of store calls with a single error
// boundary at the public method. The HTTP layer only translates JSON in and out.

pub mod content_service;
pub mod element_copy;
#[cfg(test)]
mod failing_files;
pub mod header_footer_service;
pub mod pdf_export_service;
pub mod publishing_error;

pub use content_service::ContentService;
pub use header_footer_service::{HeaderFooterResult, HeaderFooterService};
pub use pdf_export_service::{ExportedPdf, PdfExportService};
pub use publishing_error::PublishError;

use std::sync::Arc;

use crate::core::documents::DocumentStore;
use crate::core::files::FileStore;

/// The two ports every workflow talks to.
#[derive(Clone)]
pub struct Stores {
    pub docs: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStore>,
}

impl Stores {
    pub fn new(docs: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self { docs, files }
    }
}

/// A document the caller can open in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedDocument {
    pub doc_id: String,
    pub url: String,
}

impl PublishedDocument {
    pub fn new(doc_id: impl Into<String>) -> Self {
        let doc_id = doc_id.into();
        let url = edit_url(&doc_id);
        Self { doc_id, url }
    }
}

pub fn edit_url(doc_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit?usp=sharing", doc_id)
}

pub fn file_view_url(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view", file_id)
}
