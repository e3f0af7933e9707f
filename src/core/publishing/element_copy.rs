// Copies a sequence of elements into a section of another document.
//
// The dispatch is split in two: `plan` is a pure decision per element,
// and `copy_elements` walks the source in order and performs the
// appends the plan allows.

use crate::core::documents::{DocElement, DocumentStore, Section, StoreError};

/// What to do with one source element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyDecision {
    Append,
    Skip { reason: String },
}

/// Summary of a copy pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub appended: usize,
    /// Kinds of the elements we dropped, in source order.
    pub skipped: Vec<String>,
}

pub fn plan(element: &DocElement, target: Section) -> CopyDecision {
    match element {
        DocElement::Paragraph(_)
        | DocElement::Table(_)
        | DocElement::ListItem(_)
        | DocElement::HorizontalRule
        | DocElement::InlineImage(_) => CopyDecision::Append,
        DocElement::PageBreak if target.allows_page_breaks() => CopyDecision::Append,
        DocElement::PageBreak => CopyDecision::Skip {
            reason: format!("page breaks are not allowed in the {}", target.name()),
        },
        DocElement::Unsupported { kind } => CopyDecision::Skip {
            reason: format!("unsupported element type '{}'", kind),
        },
    }
}

/// Append every copyable element of `elements` to `section` of `target_doc`, preserving order.
pub async fn copy_elements(
    docs: &dyn DocumentStore,
    target_doc: &str,
    section: Section,
    elements: &[DocElement],
) -> Result<CopyReport, StoreError> {
    let mut report = CopyReport::default();

    for element in elements {
        match plan(element, section) {
            CopyDecision::Append => {
                docs.append(target_doc, section, element).await?;
                report.appended += 1;
            }
            CopyDecision::Skip { reason } => {
                tracing::debug!(
                    doc_id = target_doc,
                    section = section.name(),
                    "Skipping element: {}",
                    reason
                );
                report.skipped.push(element.kind().to_string());
            }
        }
    }

    Ok(report)
}
