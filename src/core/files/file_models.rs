// File-level operations: copies, uploads, exports, trash and sharing.
// Documents are also files, so the same IDs flow through both ports.

use async_trait::async_trait;

use crate::core::documents::StoreError;

pub const PDF_MIME: &str = "application/pdf";
pub const HTML_MIME: &str = "text/html";
pub const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<String>,
    pub trashed: bool,
}

/// Raw bytes plus the metadata needed to upload them.
#[derive(Debug, Clone)]
pub struct Blob {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn html(name: impl Into<String>, html: &str) -> Self {
        Self {
            name: name.into(),
            mime_type: HTML_MIME.to_string(),
            bytes: html.as_bytes().to_vec(),
        }
    }

    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: PDF_MIME.to_string(),
            bytes,
        }
    }
}

/// Access granted to anyone holding the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Writer,
}

impl LinkRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRole::Writer => "writer",
        }
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn get_file(&self, file_id: &str) -> Result<FileInfo, StoreError>;

    async fn copy(&self, file_id: &str, new_name: &str) -> Result<FileInfo, StoreError>;

    async fn trash(&self, file_id: &str) -> Result<(), StoreError>;

    /// Permanent delete, used for conversion artifacts.
    async fn delete(&self, file_id: &str) -> Result<(), StoreError>;

    /// Upload a blob. With `convert` set, the platform turns it into a native document.
    async fn create_from_blob(
        &self,
        blob: Blob,
        parent_folder: Option<&str>,
        convert: bool,
    ) -> Result<FileInfo, StoreError>;

    /// Untrashed files in `folder_id` named exactly `name`.
    async fn list_by_name(&self, name: &str, folder_id: &str)
        -> Result<Vec<FileInfo>, StoreError>;

    /// Render a file into another format (e.g. PDF).
    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError>;

    /// Make the file reachable by anyone holding the link.
    async fn share_with_link(&self, file_id: &str, role: LinkRole) -> Result<(), StoreError>;
}
