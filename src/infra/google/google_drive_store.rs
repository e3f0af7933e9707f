// =============================================================================
// GOOGLE DRIVE STORE
// =============================================================================
//
// `FileStore` over Drive v3: copies, multipart uploads (optionally converted
// to native Docs), exports, trash and link sharing.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::api_client::{GoogleApiClient, DRIVE_API, DRIVE_UPLOAD_API};
use crate::core::documents::StoreError;
use crate::core::files::{Blob, FileInfo, FileStore, LinkRole, GOOGLE_DOC_MIME};

const FILE_FIELDS: &str = "id,name,mimeType,parents,trashed";
const UPLOAD_BOUNDARY: &str = "report_docs_upload_boundary";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    trashed: bool,
}

impl From<DriveFile> for FileInfo {
    fn from(file: DriveFile) -> Self {
        FileInfo {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            parents: file.parents,
            trashed: file.trashed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct GoogleDriveStore {
    api: GoogleApiClient,
}

impl GoogleDriveStore {
    pub fn new(api: GoogleApiClient) -> Self {
        Self { api }
    }
}

/// Quote a value for a Drive `q` expression.
pub fn quote_query_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn name_in_folder_query(name: &str, folder_id: &str) -> String {
    format!(
        "name = {} and {} in parents and trashed = false",
        quote_query_value(name),
        quote_query_value(folder_id)
    )
}

/// Metadata part plus media part, as Drive's `uploadType=multipart` expects.
fn multipart_body(metadata: &serde_json::Value, blob: &Blob) -> Vec<u8> {
    let mut body = Vec::with_capacity(blob.bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {mime}\r\n\r\n",
            b = UPLOAD_BOUNDARY,
            meta = metadata,
            mime = blob.mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&blob.bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", UPLOAD_BOUNDARY).as_bytes());
    body
}

fn upload_metadata(blob: &Blob, parent_folder: Option<&str>, convert: bool) -> serde_json::Value {
    let mut metadata = json!({ "name": blob.name });
    if convert {
        metadata["mimeType"] = json!(GOOGLE_DOC_MIME);
    }
    if let Some(parent) = parent_folder {
        metadata["parents"] = json!([parent]);
    }
    metadata
}

#[async_trait]
impl FileStore for GoogleDriveStore {
    async fn get_file(&self, file_id: &str) -> Result<FileInfo, StoreError> {
        let url = format!("{}/files/{}", DRIVE_API, file_id);
        let file: DriveFile = self
            .api
            .send_json(self.api.http().get(&url).query(&[
                ("fields", FILE_FIELDS),
                ("supportsAllDrives", "true"),
            ]))
            .await?;
        Ok(file.into())
    }

    async fn copy(&self, file_id: &str, new_name: &str) -> Result<FileInfo, StoreError> {
        let url = format!("{}/files/{}/copy", DRIVE_API, file_id);
        let file: DriveFile = self
            .api
            .send_json(
                self.api
                    .http()
                    .post(&url)
                    .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
                    .json(&json!({ "name": new_name })),
            )
            .await?;
        tracing::info!(source = file_id, copy = file.id.as_str(), "Copied file");
        Ok(file.into())
    }

    async fn trash(&self, file_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/files/{}", DRIVE_API, file_id);
        self.api
            .send(
                self.api
                    .http()
                    .patch(&url)
                    .query(&[("supportsAllDrives", "true")])
                    .json(&json!({ "trashed": true })),
            )
            .await?;
        tracing::debug!(file_id, "Moved file to trash");
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/files/{}", DRIVE_API, file_id);
        self.api
            .send(
                self.api
                    .http()
                    .delete(&url)
                    .query(&[("supportsAllDrives", "true")]),
            )
            .await?;
        tracing::debug!(file_id, "Deleted file");
        Ok(())
    }

    async fn create_from_blob(
        &self,
        blob: Blob,
        parent_folder: Option<&str>,
        convert: bool,
    ) -> Result<FileInfo, StoreError> {
        let url = format!("{}/files", DRIVE_UPLOAD_API);
        let metadata = upload_metadata(&blob, parent_folder, convert);
        let body = multipart_body(&metadata, &blob);

        let file: DriveFile = self
            .api
            .send_json(
                self.api
                    .http()
                    .post(&url)
                    .query(&[
                        ("uploadType", "multipart"),
                        ("fields", FILE_FIELDS),
                        ("supportsAllDrives", "true"),
                    ])
                    .header(
                        "Content-Type",
                        format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
                    )
                    .body(body),
            )
            .await?;
        tracing::info!(
            file_id = file.id.as_str(),
            name = file.name.as_str(),
            convert,
            "Uploaded file"
        );
        Ok(file.into())
    }

    async fn list_by_name(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<Vec<FileInfo>, StoreError> {
        let url = format!("{}/files", DRIVE_API);
        let query = name_in_folder_query(name, folder_id);
        let fields = format!("files({})", FILE_FIELDS);
        let list: FileList = self
            .api
            .send_json(self.api.http().get(&url).query(&[
                ("q", query.as_str()),
                ("fields", fields.as_str()),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]))
            .await?;
        Ok(list.files.into_iter().map(FileInfo::from).collect())
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError> {
        let url = format!("{}/files/{}/export", DRIVE_API, file_id);
        let response = self
            .api
            .send(self.api.http().get(&url).query(&[("mimeType", mime_type)]))
            .await?;
        let bytes = response.bytes().await?;
        tracing::debug!(file_id, mime_type, bytes = bytes.len(), "Exported file");
        Ok(bytes.to_vec())
    }

    async fn share_with_link(&self, file_id: &str, role: LinkRole) -> Result<(), StoreError> {
        let url = format!("{}/files/{}/permissions", DRIVE_API, file_id);
        self.api
            .send(
                self.api
                    .http()
                    .post(&url)
                    .query(&[("supportsAllDrives", "true")])
                    .json(&json!({ "type": "anyone", "role": role.as_str() })),
            )
            .await?;
        tracing::info!(file_id, role = role.as_str(), "Shared file by link");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_escaped() {
        assert_eq!(quote_query_value("it's"), r"'it\'s'");
        assert_eq!(quote_query_value(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn builds_name_in_folder_query() {
        assert_eq!(
            name_in_folder_query("Q3 Report.pdf", "folder1"),
            "name = 'Q3 Report.pdf' and 'folder1' in parents and trashed = false"
        );
    }

    #[test]
    fn converted_upload_requests_native_doc_type() {
        let blob = Blob::html("temp_conversion_1", "<p>x</p>");

        let metadata = upload_metadata(&blob, None, true);

        assert_eq!(metadata["mimeType"], GOOGLE_DOC_MIME);
        assert!(metadata.get("parents").is_none());
    }

    #[test]
    fn multipart_body_wraps_metadata_and_media() {
        let blob = Blob::pdf("Report.pdf", b"%PDF-1.4".to_vec());
        let metadata = upload_metadata(&blob, Some("folder1"), false);

        let body = String::from_utf8(multipart_body(&metadata, &blob)).unwrap();

        assert!(body.starts_with("--report_docs_upload_boundary\r\n"));
        assert!(body.contains(r#""parents":["folder1"]"#));
        assert!(body.contains("Content-Type: application/pdf\r\n\r\n%PDF-1.4"));
        assert!(body.ends_with("--report_docs_upload_boundary--\r\n"));
        assert!(!body.contains(GOOGLE_DOC_MIME));
    }
}
