// Renders a document to PDF next to it (or into a fixed folder), replacing
// any earlier export with the same name.

use super::publishing_error::{require_id, PublishError};
use super::{file_view_url, Stores};
use crate::config::PublishConfig;
use crate::core::files::{Blob, PDF_MIME};

/// Folder used when the source has no parent and no folder is configured.
const ROOT_FOLDER: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPdf {
    pub pdf_file_id: String,
    pub name: String,
    pub folder_id: String,
    pub url: String,
    /// How many older exports were trashed.
    pub replaced: usize,
}

pub struct PdfExportService {
    stores: Stores,
    config: PublishConfig,
}

impl PdfExportService {
    pub fn new(stores: Stores, config: PublishConfig) -> Self {
        Self { stores, config }
    }

    pub async fn export_pdf(&self, doc_id: Option<&str>) -> Result<ExportedPdf, PublishError> {
        let result = self
            .run(doc_id)
            .await
            .map_err(|e| e.classify(doc_id.map(str::trim).unwrap_or_default()));
        if let Err(e) = &result {
            tracing::error!(doc_id = doc_id.unwrap_or_default(), "PDF export failed: {}", e);
        }
        result
    }

    async fn run(&self, doc_id: Option<&str>) -> Result<ExportedPdf, PublishError> {
        let doc_id = require_id(doc_id, "Document ID")?;
        let files = self.stores.files.as_ref();

        let source = files.get_file(doc_id).await?;
        let name = pdf_name(&source.name);
        let folder_id = self
            .config
            .pdf_folder_id
            .clone()
            .or_else(|| source.parents.first().cloned())
            .unwrap_or_else(|| ROOT_FOLDER.to_string());

        let bytes = files.export(doc_id, PDF_MIME).await?;

        let existing = files.list_by_name(&name, &folder_id).await?;
        for old in &existing {
            files.trash(&old.id).await?;
            tracing::debug!(file_id = old.id.as_str(), "Trashed previous export");
        }

        let created = files
            .create_from_blob(Blob::pdf(name.clone(), bytes), Some(&folder_id), false)
            .await?;

        tracing::info!(
            doc_id,
            pdf_file_id = created.id.as_str(),
            folder_id = folder_id.as_str(),
            replaced = existing.len(),
            "Exported document to PDF"
        );

        Ok(ExportedPdf {
            url: file_view_url(&created.id),
            pdf_file_id: created.id,
            name,
            folder_id,
            replaced: existing.len(),
        })
    }
}

/// `name` with a `.pdf` suffix, unless it already has one (any case).
pub fn pdf_name(name: &str) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::{DocElement, ParagraphStyle};
    use crate::core::files::FileStore;
    use crate::core::publishing::failing_files::{FailingFiles, FileOp};
    use crate::infra::memory::InMemoryWorkspace;
    use std::sync::Arc;

    fn service(workspace: &Arc<InMemoryWorkspace>, config: PublishConfig) -> PdfExportService {
        PdfExportService::new(Stores::new(workspace.clone(), workspace.clone()), config)
    }

    fn live_pdfs(workspace: &InMemoryWorkspace, name: &str) -> Vec<String> {
        workspace
            .all_files()
            .into_iter()
            .filter(|f| f.name == name && !f.trashed)
            .map(|f| f.id)
            .collect()
    }

    #[test]
    fn pdf_suffix_is_added_once() {
        assert_eq!(pdf_name("Report"), "Report.pdf");
        assert_eq!(pdf_name("Report.pdf"), "Report.pdf");
        assert_eq!(pdf_name("Report.PDF"), "Report.PDF");
        assert_eq!(pdf_name("report.pdf.docx"), "report.pdf.docx.pdf");
    }

    #[tokio::test]
    async fn exports_next_to_the_source() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document(
            "D1",
            "Jane Suitability Report",
            vec![DocElement::paragraph("Hello", ParagraphStyle::NormalText)],
        );
        workspace.move_to_folder("D1", "FOLDER-A");
        let service = service(&workspace, PublishConfig::default());

        let exported = service.export_pdf(Some("D1")).await.unwrap();

        assert_eq!(exported.name, "Jane Suitability Report.pdf");
        assert_eq!(exported.folder_id, "FOLDER-A");
        assert_eq!(exported.replaced, 0);
        assert_eq!(
            exported.url,
            format!("https://drive.google.com/file/d/{}/view", exported.pdf_file_id)
        );

        let file = workspace.file(&exported.pdf_file_id).unwrap();
        assert_eq!(file.mime_type, PDF_MIME);
        assert_eq!(file.parents, vec!["FOLDER-A".to_string()]);
        assert!(workspace.file_bytes(&exported.pdf_file_id).unwrap().starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn exporting_twice_leaves_one_pdf() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.move_to_folder("D1", "FOLDER-A");
        let service = service(&workspace, PublishConfig::default());

        let first = service.export_pdf(Some("D1")).await.unwrap();
        let second = service.export_pdf(Some("D1")).await.unwrap();

        assert_eq!(second.replaced, 1);
        assert_eq!(live_pdfs(&workspace, "Report.pdf"), vec![second.pdf_file_id]);
        assert!(workspace.file(&first.pdf_file_id).unwrap().trashed);
    }

    #[tokio::test]
    async fn configured_folder_wins_over_parent() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.move_to_folder("D1", "FOLDER-A");
        let config = PublishConfig {
            pdf_folder_id: Some("EXPORTS".to_string()),
            ..PublishConfig::default()
        };

        let exported = service(&workspace, config).export_pdf(Some("D1")).await.unwrap();

        assert_eq!(exported.folder_id, "EXPORTS");
    }

    #[tokio::test]
    async fn orphan_documents_export_to_root() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);

        let exported = service(&workspace, PublishConfig::default())
            .export_pdf(Some("D1"))
            .await
            .unwrap();

        assert_eq!(exported.folder_id, "root");
    }

    #[tokio::test]
    async fn inaccessible_document_reports_permissions() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.deny_access("D1");

        let err = service(&workspace, PublishConfig::default())
            .export_pdf(Some("D1"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Access { ref id } if id == "D1"));
        assert!(err.to_string().contains("permissions"));
    }

    #[tokio::test]
    async fn access_failures_after_export_name_the_document() {
        for op in [FileOp::ListByName, FileOp::Trash, FileOp::CreateFromBlob] {
            let workspace = Arc::new(InMemoryWorkspace::new());
            workspace.insert_document("D1", "Report", vec![]);
            workspace.move_to_folder("D1", "FOLDER-A");
            // An earlier export so the trash step runs.
            let earlier = workspace
                .create_from_blob(Blob::pdf("Report.pdf", b"%PDF-1.4".to_vec()), Some("FOLDER-A"), false)
                .await
                .unwrap();
            let service = PdfExportService::new(
                Stores::new(workspace.clone(), Arc::new(FailingFiles::new(workspace.clone(), op))),
                PublishConfig::default(),
            );

            let err = service.export_pdf(Some("D1")).await.unwrap_err();

            assert!(
                matches!(err, PublishError::Access { ref id } if id == "D1"),
                "{:?} gave {}",
                op,
                err
            );
            assert!(workspace.file(&earlier.id).is_some());
        }
    }

    #[tokio::test]
    async fn blank_document_id_fails_without_platform_calls() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let service = service(&workspace, PublishConfig::default());

        for doc_id in [None, Some(" "), Some("")] {
            let err = service.export_pdf(doc_id).await.unwrap_err();
            assert!(matches!(err, PublishError::Validation(_)));
        }

        assert_eq!(workspace.call_count(), 0);
    }
}
