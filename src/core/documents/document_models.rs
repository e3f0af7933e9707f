// This is the documents module - the vocabulary every handler speaks.
// Nothing in here knows about HTTP, JSON or Google. The infra layer turns
// platform payloads into these types, and the publishing services only ever
// see `DocElement`s flowing through the `DocumentStore` port.

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Named paragraph styles we carry across documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    NormalText,
    Title,
    Subtitle,
    /// Heading level, 1 through 6.
    Heading(u8),
}

impl ParagraphStyle {
    /// The platform's name for this style (`HEADING_2`, `NORMAL_TEXT`, ...).
    pub fn named_style(&self) -> String {
        match self {
            ParagraphStyle::NormalText => "NORMAL_TEXT".to_string(),
            ParagraphStyle::Title => "TITLE".to_string(),
            ParagraphStyle::Subtitle => "SUBTITLE".to_string(),
            ParagraphStyle::Heading(level) => format!("HEADING_{}", (*level).clamp(1, 6)),
        }
    }

    /// Inverse of [`ParagraphStyle::named_style`]. Unknown names fall back to normal text.
    pub fn from_named_style(name: &str) -> Self {
        match name {
            "TITLE" => ParagraphStyle::Title,
            "SUBTITLE" => ParagraphStyle::Subtitle,
            other => other
                .strip_prefix("HEADING_")
                .and_then(|level| level.parse::<u8>().ok())
                .filter(|level| (1..=6).contains(level))
                .map(ParagraphStyle::Heading)
                .unwrap_or(ParagraphStyle::NormalText),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphElement {
    pub text: String,
    pub style: ParagraphStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableElement {
    /// Cell text, row-major. Rows may be ragged; writers pad to the widest row.
    pub rows: Vec<Vec<String>>,
}

impl TableElement {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemElement {
    pub text: String,
    pub nesting_level: u8,
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub source_uri: String,
    pub width_pt: Option<f64>,
    pub height_pt: Option<f64>,
}

/// One child of a body, header or footer.
///
/// Writers match this exhaustively. Anything the platform reports that we
/// can't carry over arrives as `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
pub enum DocElement {
    Paragraph(ParagraphElement),
    Table(TableElement),
    ListItem(ListItemElement),
    HorizontalRule,
    PageBreak,
    InlineImage(ImageElement),
    Unsupported { kind: String },
}

impl DocElement {
    /// Short type name, used in logs and copy reports.
    pub fn kind(&self) -> &str {
        match self {
            DocElement::Paragraph(_) => "paragraph",
            DocElement::Table(_) => "table",
            DocElement::ListItem(_) => "list_item",
            DocElement::HorizontalRule => "horizontal_rule",
            DocElement::PageBreak => "page_break",
            DocElement::InlineImage(_) => "inline_image",
            DocElement::Unsupported { kind } => kind.as_str(),
        }
    }

    pub fn paragraph(text: impl Into<String>, style: ParagraphStyle) -> Self {
        DocElement::Paragraph(ParagraphElement {
            text: text.into(),
            style,
        })
    }
}

/// The three content areas of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Body,
    Header,
    Footer,
}

impl Section {
    /// Page breaks only make sense in the body.
    pub fn allows_page_breaks(&self) -> bool {
        matches!(self, Section::Body)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Header => "header",
            Section::Footer => "footer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
}

// ============================================================================
// ERRORS
// ============================================================================
// Raised by any store implementation. The publishing services decide what a
// store error means for the caller (access problem vs. plain failure).

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("API error ({}): {message}", describe_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

fn describe_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no status".to_string())
}

impl StoreError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        StoreError::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Whether the platform refused or could not find the target.
    pub fn is_access_failure(&self) -> bool {
        if let StoreError::Api {
            status: Some(403 | 404),
            ..
        } = self
        {
            return true;
        }

        let message = self.to_string().to_lowercase();
        message.contains("not found") || message.contains("access")
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Structured document editing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a document. Fails if it is missing or not shared with us.
    async fn open(&self, doc_id: &str) -> Result<DocumentInfo, StoreError>;

    /// Children of a section, in order. `None` when a header/footer doesn't exist.
    async fn read_section(
        &self,
        doc_id: &str,
        section: Section,
    ) -> Result<Option<Vec<DocElement>>, StoreError>;

    /// Create the header/footer if it is missing. No-op for the body.
    async fn ensure_section(&self, doc_id: &str, section: Section) -> Result<(), StoreError>;

    async fn clear_section(&self, doc_id: &str, section: Section) -> Result<(), StoreError>;

    /// Append one element to the end of a section.
    async fn append(
        &self,
        doc_id: &str,
        section: Section,
        element: &DocElement,
    ) -> Result<(), StoreError>;

    async fn save(&self, doc_id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_styles_map_both_ways() {
        for style in [
            ParagraphStyle::NormalText,
            ParagraphStyle::Title,
            ParagraphStyle::Subtitle,
            ParagraphStyle::Heading(1),
            ParagraphStyle::Heading(6),
        ] {
            assert_eq!(ParagraphStyle::from_named_style(&style.named_style()), style);
        }

        assert_eq!(
            ParagraphStyle::from_named_style("HEADING_9"),
            ParagraphStyle::NormalText
        );
        assert_eq!(
            ParagraphStyle::from_named_style("SOMETHING_ELSE"),
            ParagraphStyle::NormalText
        );
    }

    #[test]
    fn only_body_allows_page_breaks() {
        assert!(Section::Body.allows_page_breaks());
        assert!(!Section::Header.allows_page_breaks());
        assert!(!Section::Footer.allows_page_breaks());
    }

    #[test]
    fn access_failures_are_detected_by_status_and_message() {
        assert!(StoreError::api(404, "Requested entity").is_access_failure());
        assert!(StoreError::api(403, "The caller does not have permission").is_access_failure());
        assert!(StoreError::Transport("Document not found".into()).is_access_failure());
        assert!(StoreError::Auth("no ACCESS for you".into()).is_access_failure());
        assert!(!StoreError::api(500, "Backend error").is_access_failure());
    }

    #[test]
    fn table_column_count_uses_widest_row() {
        let table = TableElement {
            rows: vec![vec!["a".into()], vec!["b".into(), "c".into(), "d".into()]],
        };
        assert_eq!(table.column_count(), 3);
        assert_eq!(TableElement { rows: vec![] }.column_count(), 0);
    }
}
