// Copies the template's header and footer onto a document.
// The body of the target is never touched.

use super::element_copy::copy_elements;
use super::publishing_error::{require_id, PublishError};
use super::{edit_url, Stores};
use crate::config::PublishConfig;
use crate::core::documents::Section;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooterResult {
    pub doc_id: String,
    pub url: String,
    pub header_elements: usize,
    pub footer_elements: usize,
}

pub struct HeaderFooterService {
    stores: Stores,
    config: PublishConfig,
}

impl HeaderFooterService {
    pub fn new(stores: Stores, config: PublishConfig) -> Self {
        Self { stores, config }
    }

    pub async fn apply_header_footer(
        &self,
        doc_id: Option<&str>,
    ) -> Result<HeaderFooterResult, PublishError> {
        let result = self
            .run(doc_id)
            .await
            .map_err(|e| e.classify(doc_id.map(str::trim).unwrap_or_default()));
        if let Err(e) = &result {
            tracing::error!(
                doc_id = doc_id.unwrap_or_default(),
                "Header/footer propagation failed: {}",
                e
            );
        }
        result
    }

    async fn run(&self, doc_id: Option<&str>) -> Result<HeaderFooterResult, PublishError> {
        let doc_id = require_id(doc_id, "Document ID")?;
        let template_id = self.config.header_footer_source().ok_or_else(|| {
            PublishError::Config(
                "Header/footer template is not configured. Set HEADER_FOOTER_TEMPLATE_ID or TEMPLATE_DOC_ID."
                    .to_string(),
            )
        })?;

        let template = self.stores.docs.open(template_id).await?;
        self.stores.docs.open(doc_id).await?;

        let header_elements = self.copy_section(template_id, doc_id, Section::Header).await?;
        let footer_elements = self.copy_section(template_id, doc_id, Section::Footer).await?;

        self.stores.docs.save(doc_id).await?;

        tracing::info!(
            doc_id,
            template_id,
            template_title = template.title.as_str(),
            header_elements,
            footer_elements,
            "Applied template header and footer"
        );

        Ok(HeaderFooterResult {
            doc_id: doc_id.to_string(),
            url: edit_url(doc_id),
            header_elements,
            footer_elements,
        })
    }

    /// Returns how many elements were appended. A template without this
    /// section leaves the target's section as it was.
    async fn copy_section(
        &self,
        template_id: &str,
        doc_id: &str,
        section: Section,
    ) -> Result<usize, PublishError> {
        let Some(elements) = self
            .stores
            .docs
            .read_section(template_id, section)
            .await?
        else {
            tracing::debug!(template_id, "Template has no {}", section.name());
            return Ok(0);
        };

        let docs = self.stores.docs.as_ref();
        docs.ensure_section(doc_id, section).await?;
        docs.clear_section(doc_id, section).await?;

        let report = copy_elements(docs, doc_id, section, &elements).await?;
        Ok(report.appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::{DocElement, ImageElement, ParagraphStyle};
    use crate::infra::memory::InMemoryWorkspace;
    use std::sync::Arc;

    fn logo() -> DocElement {
        DocElement::InlineImage(ImageElement {
            source_uri: "https://example.com/logo.png".to_string(),
            width_pt: Some(120.0),
            height_pt: Some(40.0),
        })
    }

    fn setup() -> (Arc<InMemoryWorkspace>, HeaderFooterService) {
        let workspace = Arc::new(InMemoryWorkspace::new());
        workspace.insert_document("TEMPLATE", "Template", vec![]);
        workspace.set_section(
            "TEMPLATE",
            Section::Header,
            Some(vec![
                logo(),
                DocElement::PageBreak,
                DocElement::paragraph("Private & Confidential", ParagraphStyle::NormalText),
            ]),
        );
        workspace.set_section(
            "TEMPLATE",
            Section::Footer,
            Some(vec![
                DocElement::HorizontalRule,
                DocElement::paragraph("ACME Advisers Ltd", ParagraphStyle::NormalText),
            ]),
        );

        let service = HeaderFooterService::new(
            Stores::new(workspace.clone(), workspace.clone()),
            PublishConfig::with_template("TEMPLATE"),
        );
        (workspace, service)
    }

    #[tokio::test]
    async fn creates_missing_header_and_footer() {
        let (workspace, service) = setup();
        let body = vec![DocElement::paragraph("Body", ParagraphStyle::NormalText)];
        workspace.insert_document("D1", "Report", body.clone());

        let result = service.apply_header_footer(Some("D1")).await.unwrap();

        assert_eq!(result.header_elements, 2);
        assert_eq!(result.footer_elements, 2);
        assert_eq!(
            workspace.section("D1", Section::Header).unwrap(),
            vec![
                logo(),
                DocElement::paragraph("Private & Confidential", ParagraphStyle::NormalText),
            ]
        );
        assert_eq!(workspace.section("D1", Section::Footer).unwrap().len(), 2);
        assert_eq!(workspace.section("D1", Section::Body).unwrap(), body);
    }

    #[tokio::test]
    async fn replaces_existing_header_content() {
        let (workspace, service) = setup();
        workspace.insert_document("D1", "Report", vec![]);
        workspace.set_section(
            "D1",
            Section::Header,
            Some(vec![DocElement::paragraph("Old header", ParagraphStyle::NormalText)]),
        );

        service.apply_header_footer(Some("D1")).await.unwrap();

        let header = workspace.section("D1", Section::Header).unwrap();
        assert_eq!(header.len(), 2);
        assert!(!header.contains(&DocElement::paragraph("Old header", ParagraphStyle::NormalText)));
    }

    #[tokio::test]
    async fn template_without_footer_leaves_target_footer_alone() {
        let (workspace, service) = setup();
        workspace.set_section("TEMPLATE", Section::Footer, None);
        workspace.insert_document("D1", "Report", vec![]);
        let footer = vec![DocElement::paragraph("Keep me", ParagraphStyle::NormalText)];
        workspace.set_section("D1", Section::Footer, Some(footer.clone()));

        let result = service.apply_header_footer(Some("D1")).await.unwrap();

        assert_eq!(result.footer_elements, 0);
        assert_eq!(workspace.section("D1", Section::Footer).unwrap(), footer);
    }

    #[tokio::test]
    async fn missing_document_id_is_rejected() {
        let (workspace, service) = setup();
        let calls_before = workspace.call_count();

        let err = service.apply_header_footer(Some("")).await.unwrap_err();

        assert!(matches!(err, PublishError::Validation(_)));
        assert_eq!(workspace.call_count(), calls_before);
    }

    #[tokio::test]
    async fn unknown_document_reports_permissions() {
        let (_workspace, service) = setup();

        let err = service.apply_header_footer(Some("NOPE")).await.unwrap_err();

        assert!(err.to_string().contains("NOPE"));
        assert!(err.to_string().contains("permissions"));
    }
}
