// Test double: a file store that refuses one operation and forwards the rest
// to an in-memory workspace.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::documents::StoreError;
use crate::core::files::{Blob, FileInfo, FileStore, LinkRole};
use crate::infra::memory::InMemoryWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    CreateFromBlob,
    ListByName,
    Trash,
}

pub struct FailingFiles {
    pub inner: Arc<InMemoryWorkspace>,
    pub fail_on: FileOp,
}

impl FailingFiles {
    pub fn new(inner: Arc<InMemoryWorkspace>, fail_on: FileOp) -> Self {
        Self { inner, fail_on }
    }

    fn check(&self, op: FileOp) -> Result<(), StoreError> {
        if op == self.fail_on {
            Err(StoreError::api(403, "The user does not have sufficient access"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FileStore for FailingFiles {
    async fn get_file(&self, file_id: &str) -> Result<FileInfo, StoreError> {
        self.inner.get_file(file_id).await
    }

    async fn copy(&self, file_id: &str, new_name: &str) -> Result<FileInfo, StoreError> {
        self.inner.copy(file_id, new_name).await
    }

    async fn trash(&self, file_id: &str) -> Result<(), StoreError> {
        self.check(FileOp::Trash)?;
        self.inner.trash(file_id).await
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        self.inner.delete(file_id).await
    }

    async fn create_from_blob(
        &self,
        blob: Blob,
        parent_folder: Option<&str>,
        convert: bool,
    ) -> Result<FileInfo, StoreError> {
        self.check(FileOp::CreateFromBlob)?;
        self.inner.create_from_blob(blob, parent_folder, convert).await
    }

    async fn list_by_name(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<Vec<FileInfo>, StoreError> {
        self.check(FileOp::ListByName)?;
        self.inner.list_by_name(name, folder_id).await
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.export(file_id, mime_type).await
    }

    async fn share_with_link(&self, file_id: &str, role: LinkRole) -> Result<(), StoreError> {
        self.inner.share_with_link(file_id, role).await
    }
}
