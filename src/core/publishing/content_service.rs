// Content replace and document creation.
//
// Both workflows share one procedure: clear the target body, upload the HTML
// as a converted temporary document, copy the temp document's body across,
// and always remove the temp document afterwards.

use chrono::Utc;

use super::element_copy::{copy_elements, CopyReport};
use super::publishing_error::{require, require_id, PublishError};
use super::{PublishedDocument, Stores};
use crate::config::PublishConfig;
use crate::core::documents::Section;
use crate::core::files::{Blob, LinkRole};

pub struct ContentService {
    stores: Stores,
    config: PublishConfig,
}

impl ContentService {
    pub fn new(stores: Stores, config: PublishConfig) -> Self {
        Self { stores, config }
    }

    /// Replace the body of `doc_id` with the rendered `html`.
    pub async fn replace_content(
        &self,
        doc_id: Option<&str>,
        html: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let result = self
            .run_replace(doc_id, html)
            .await
            .map_err(|e| e.classify(doc_id.map(str::trim).unwrap_or_default()));
        if let Err(e) = &result {
            tracing::error!(doc_id = doc_id.unwrap_or_default(), "Content replace failed: {}", e);
        }
        result
    }

    /// Copy the template, fill the copy with `html`, and share it for editing.
    /// Access failures name the template, the only ID the caller can act on.
    pub async fn create_document(
        &self,
        html: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let template_id = self.config.template_doc_id.as_deref().unwrap_or_default();
        let result = self
            .run_create(html, file_name)
            .await
            .map_err(|e| e.classify(template_id));
        if let Err(e) = &result {
            tracing::error!(
                file_name = file_name.unwrap_or_default(),
                "Document creation failed: {}",
                e
            );
        }
        result
    }

    async fn run_replace(
        &self,
        doc_id: Option<&str>,
        html: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let doc_id = require_id(doc_id, "Document ID")?;
        let html = require(html, "HTML content")?;

        let info = self.stores.docs.open(doc_id).await?;
        let report = self.fill_body(doc_id, html).await?;
        self.stores.docs.save(doc_id).await?;

        tracing::info!(
            doc_id,
            title = info.title.as_str(),
            appended = report.appended,
            skipped = report.skipped.len(),
            "Replaced document content"
        );

        Ok(PublishedDocument::new(doc_id))
    }

    async fn run_create(
        &self,
        html: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let html = require(html, "HTML content")?;
        let file_name = require(file_name, "File name")?;
        let template_id = self.config.template_doc_id.as_deref().ok_or_else(|| {
            PublishError::Config(
                "Template document ID is not configured. Set TEMPLATE_DOC_ID.".to_string(),
            )
        })?;

        let copy = self.stores.files.copy(template_id, file_name).await?;

        let report = self.fill_body(&copy.id, html).await?;
        self.stores.docs.save(&copy.id).await?;
        self.stores
            .files
            .share_with_link(&copy.id, LinkRole::Writer)
            .await?;

        tracing::info!(
            doc_id = copy.id.as_str(),
            template_id,
            appended = report.appended,
            "Created document from template"
        );

        Ok(PublishedDocument::new(copy.id))
    }

    /// Clear the body of `doc_id` and repopulate it from `html`.
    async fn fill_body(&self, doc_id: &str, html: &str) -> Result<CopyReport, PublishError> {
        self.stores
            .docs
            .clear_section(doc_id, Section::Body)
            .await?;

        let temp_name = format!("temp_conversion_{}", Utc::now().timestamp_millis());
        let temp = self
            .stores
            .files
            .create_from_blob(Blob::html(temp_name, html), None, true)
            .await?;

        let copied = self.copy_converted_body(&temp.id, doc_id).await;

        if let Err(e) = self.stores.files.delete(&temp.id).await {
            tracing::warn!(temp_id = temp.id.as_str(), "Failed to delete conversion file: {}", e);
        }

        copied
    }

    async fn copy_converted_body(
        &self,
        temp_id: &str,
        doc_id: &str,
    ) -> Result<CopyReport, PublishError> {
        let elements = self
            .stores
            .docs
            .read_section(temp_id, Section::Body)
            .await?
            .unwrap_or_default();

        Ok(copy_elements(self.stores.docs.as_ref(), doc_id, Section::Body, &elements).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::{DocElement, ParagraphStyle};
    use crate::core::publishing::failing_files::{FailingFiles, FileOp};
    use crate::core::files::GOOGLE_DOC_MIME;
    use crate::infra::memory::InMemoryWorkspace;
    use std::sync::Arc;

    fn service(workspace: &Arc<InMemoryWorkspace>, config: PublishConfig) -> ContentService {
        ContentService::new(
            Stores::new(workspace.clone(), workspace.clone()),
            config,
        )
    }

    fn conversion_files(workspace: &InMemoryWorkspace) -> usize {
        workspace
            .all_files()
            .iter()
            .filter(|f| f.name.starts_with("temp_conversion_"))
            .count()
    }

    #[tokio::test]
    async fn replace_renders_html_into_the_body() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document(
            "D1",
            "Report",
            vec![DocElement::paragraph("old", ParagraphStyle::NormalText)],
        );
        let service = service(&workspace, PublishConfig::default());

        let published = service
            .replace_content(Some("D1"), Some("<h1>Hi</h1><p>Body</p>"))
            .await
            .unwrap();

        assert_eq!(published.doc_id, "D1");
        assert_eq!(
            published.url,
            "https://docs.google.com/document/d/D1/edit?usp=sharing"
        );
        assert_eq!(
            workspace.section("D1", Section::Body).unwrap(),
            vec![
                DocElement::paragraph("Hi", ParagraphStyle::Heading(1)),
                DocElement::paragraph("Body", ParagraphStyle::NormalText),
            ]
        );
        assert_eq!(workspace.save_count("D1"), 1);
        assert_eq!(conversion_files(&workspace), 0);
    }

    #[tokio::test]
    async fn missing_fields_fail_before_touching_the_platform() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let service = service(&workspace, PublishConfig::default());

        for (doc_id, html) in [
            (None, Some("<p>x</p>")),
            (Some("  "), Some("<p>x</p>")),
            (Some("D1"), None),
            (Some("D1"), Some("")),
        ] {
            let err = service.replace_content(doc_id, html).await.unwrap_err();
            assert!(matches!(err, PublishError::Validation(_)));
        }

        assert_eq!(workspace.call_count(), 0);
    }

    #[tokio::test]
    async fn inaccessible_documents_report_permissions() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.deny_access("D1");
        let service = service(&workspace, PublishConfig::default());

        let err = service
            .replace_content(Some("D1"), Some("<p>x</p>"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Access { .. }));
        assert!(err.to_string().contains("D1"));
        assert!(err.to_string().contains("permissions"));
    }

    #[tokio::test]
    async fn conversion_file_is_removed_when_the_copy_fails() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.fail_appends_after(1);
        let service = service(&workspace, PublishConfig::default());

        let err = service
            .replace_content(Some("D1"), Some("<p>one</p><p>two</p>"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Platform(_)));
        assert_eq!(conversion_files(&workspace), 0);
    }

    #[tokio::test]
    async fn cleanup_failures_do_not_fail_the_request() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        workspace.fail_deletes(true);
        let service = service(&workspace, PublishConfig::default());

        let published = service
            .replace_content(Some("D1"), Some("<p>kept</p>"))
            .await
            .unwrap();

        assert_eq!(published.doc_id, "D1");
        assert_eq!(workspace.section("D1", Section::Body).unwrap().len(), 1);
        assert_eq!(conversion_files(&workspace), 1);
    }

    #[tokio::test]
    async fn create_copies_the_template_and_shares_it() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document(
            "TEMPLATE",
            "Suitability Report Template",
            vec![DocElement::paragraph("placeholder", ParagraphStyle::NormalText)],
        );
        workspace.set_section(
            "TEMPLATE",
            Section::Header,
            Some(vec![DocElement::paragraph("ACME", ParagraphStyle::NormalText)]),
        );
        let service = service(&workspace, PublishConfig::with_template("TEMPLATE"));

        let published = service
            .create_document(Some("<p>Hello</p><hr>"), Some("Report for Jane"))
            .await
            .unwrap();

        let file = workspace.file(&published.doc_id).unwrap();
        assert_eq!(file.name, "Report for Jane");
        assert_eq!(file.mime_type, GOOGLE_DOC_MIME);
        assert_eq!(workspace.link_role(&published.doc_id), Some(LinkRole::Writer));
        assert_eq!(
            workspace.section(&published.doc_id, Section::Body).unwrap(),
            vec![
                DocElement::paragraph("Hello", ParagraphStyle::NormalText),
                DocElement::HorizontalRule,
            ]
        );
        assert_eq!(
            workspace.section(&published.doc_id, Section::Header).unwrap().len(),
            1
        );
        // The template itself is left alone.
        assert_eq!(
            workspace.section("TEMPLATE", Section::Body).unwrap(),
            vec![DocElement::paragraph("placeholder", ParagraphStyle::NormalText)]
        );
        assert_eq!(conversion_files(&workspace), 0);
    }

    #[tokio::test]
    async fn create_without_template_is_a_configuration_error() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let service = service(&workspace, PublishConfig::default());

        let err = service
            .create_document(Some("<p>x</p>"), Some("Report"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Config(_)));
        assert!(err.to_string().contains("TEMPLATE_DOC_ID"));
    }

    #[tokio::test]
    async fn conversion_upload_access_failure_names_the_document() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("D1", "Report", vec![]);
        let files = FailingFiles::new(workspace.clone(), FileOp::CreateFromBlob);
        let service = ContentService::new(
            Stores::new(workspace.clone(), Arc::new(files)),
            PublishConfig::default(),
        );

        let err = service
            .replace_content(Some("D1"), Some("<p>x</p>"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Access { ref id } if id == "D1"));
        assert_eq!(
            err.to_string(),
            "Cannot access document D1. Check permissions and make sure the document exists."
        );
    }

    #[tokio::test]
    async fn create_access_failures_name_the_template() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("TEMPLATE", "Template", vec![]);
        let files = FailingFiles::new(workspace.clone(), FileOp::CreateFromBlob);
        let service = ContentService::new(
            Stores::new(workspace.clone(), Arc::new(files)),
            PublishConfig::with_template("TEMPLATE"),
        );

        let err = service
            .create_document(Some("<p>x</p>"), Some("Report"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Access { ref id } if id == "TEMPLATE"));
    }

    #[tokio::test]
    async fn create_validates_before_touching_the_platform() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("TEMPLATE", "Template", vec![]);
        let service = service(&workspace, PublishConfig::with_template("TEMPLATE"));

        for (html, file_name) in [
            (None, Some("Report")),
            (Some("  "), Some("Report")),
            (Some("<p>x</p>"), None),
            (Some("<p>x</p>"), Some(" ")),
        ] {
            let err = service.create_document(html, file_name).await.unwrap_err();
            assert!(matches!(err, PublishError::Validation(_)));
        }

        assert_eq!(workspace.call_count(), 0);
        assert_eq!(workspace.all_files().len(), 1);
    }

    #[tokio::test]
    async fn ids_that_would_alter_request_paths_are_rejected() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let service = service(&workspace, PublishConfig::default());

        let err = service
            .replace_content(Some("D1/permissions"), Some("<p>x</p>"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Document ID contains invalid characters");
        assert_eq!(workspace.call_count(), 0);
    }
}
