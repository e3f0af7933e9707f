// =============================================================================
// GOOGLE DOCS API PAYLOADS
// =============================================================================
//
// Response structures for `documents.get`, the mapping from them into
// `DocElement`s, and the `batchUpdate` requests that append an element.
//
// All positions in the Docs API are UTF-16 code unit offsets, so every
// length computed here goes through `utf16_len`.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::core::documents::{
    DocElement, ImageElement, ListItemElement, ParagraphStyle, Section, TableElement,
};

// =============================================================================
// RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    pub body: Option<Segment>,
    #[serde(default)]
    pub headers: HashMap<String, Segment>,
    #[serde(default)]
    pub footers: HashMap<String, Segment>,
    pub document_style: Option<DocumentStyle>,
    #[serde(default)]
    pub inline_objects: HashMap<String, InlineObject>,
    #[serde(default)]
    pub lists: HashMap<String, List>,
}

/// Body, header and footer all share this shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStyle {
    pub default_header_id: Option<String>,
    pub default_footer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub start_index: u32,
    #[serde(default)]
    pub end_index: u32,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
    pub section_break: Option<Value>,
    pub table_of_contents: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: Option<ParagraphStyleJson>,
    pub bullet: Option<Bullet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyleJson {
    pub named_style_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    pub list_id: String,
    #[serde(default)]
    pub nesting_level: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
    pub horizontal_rule: Option<Value>,
    pub page_break: Option<Value>,
    pub inline_object_element: Option<InlineObjectElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObjectElement {
    pub inline_object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObject {
    pub inline_object_properties: Option<InlineObjectProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObjectProperties {
    pub embedded_object: Option<EmbeddedObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedObject {
    pub image_properties: Option<ImageProperties>,
    pub size: Option<Size>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub content_uri: Option<String>,
    pub source_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Size {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
}

#[derive(Debug, Deserialize)]
pub struct Dimension {
    pub magnitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub list_properties: Option<ListProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProperties {
    #[serde(default)]
    pub nesting_levels: Vec<NestingLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestingLevel {
    pub glyph_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub replies: Vec<Value>,
}

// =============================================================================
// SEGMENTS
// =============================================================================

/// Where a section lives inside a fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentBounds {
    /// `None` for the body.
    pub segment_id: Option<String>,
    /// First index that belongs to user content.
    pub start: u32,
    /// End index of the segment (one past its final newline).
    pub end: u32,
}

impl SegmentBounds {
    /// Where new content goes: just before the segment's final newline.
    pub fn insertion_index(&self) -> u32 {
        self.end.saturating_sub(1).max(self.start)
    }
}

impl Document {
    pub fn segment(&self, section: Section) -> Option<(Option<String>, &Segment)> {
        let style = self.document_style.as_ref();
        match section {
            Section::Body => self.body.as_ref().map(|b| (None, b)),
            Section::Header => {
                let id = style.and_then(|s| s.default_header_id.clone())?;
                self.headers.get(&id).map(|seg| (Some(id), seg))
            }
            Section::Footer => {
                let id = style.and_then(|s| s.default_footer_id.clone())?;
                self.footers.get(&id).map(|seg| (Some(id), seg))
            }
        }
    }

    pub fn bounds(&self, section: Section) -> Option<SegmentBounds> {
        let (segment_id, segment) = self.segment(section)?;
        let start = segment
            .content
            .iter()
            .find(|e| e.section_break.is_none())
            .map(|e| e.start_index)
            .unwrap_or(0);
        let end = segment.content.last().map(|e| e.end_index).unwrap_or(start + 1);
        Some(SegmentBounds {
            segment_id,
            start,
            end,
        })
    }

    /// Children of a section as domain elements.
    pub fn elements(&self, section: Section) -> Option<Vec<DocElement>> {
        let (_, segment) = self.segment(section)?;
        Some(
            segment
                .content
                .iter()
                .filter_map(|e| self.to_element(e))
                .collect(),
        )
    }

    fn to_element(&self, element: &StructuralElement) -> Option<DocElement> {
        if element.section_break.is_some() {
            return None;
        }
        if element.table_of_contents.is_some() {
            return Some(DocElement::Unsupported {
                kind: "table_of_contents".to_string(),
            });
        }
        if let Some(table) = &element.table {
            return Some(DocElement::Table(TableElement {
                rows: table
                    .table_rows
                    .iter()
                    .map(|row| row.table_cells.iter().map(cell_text).collect())
                    .collect(),
            }));
        }
        match &element.paragraph {
            Some(paragraph) => Some(self.paragraph_to_element(paragraph)),
            None => Some(DocElement::Unsupported {
                kind: "unknown".to_string(),
            }),
        }
    }

    fn paragraph_to_element(&self, paragraph: &Paragraph) -> DocElement {
        let text = paragraph_text(paragraph);
        let has_text = !text.trim().is_empty();

        if !has_text {
            for part in &paragraph.elements {
                if part.page_break.is_some() {
                    return DocElement::PageBreak;
                }
                if part.horizontal_rule.is_some() {
                    return DocElement::HorizontalRule;
                }
                if let Some(image) = part
                    .inline_object_element
                    .as_ref()
                    .and_then(|o| self.image(&o.inline_object_id))
                {
                    return DocElement::InlineImage(image);
                }
            }
        }

        if let Some(bullet) = &paragraph.bullet {
            return DocElement::ListItem(ListItemElement {
                text,
                nesting_level: bullet.nesting_level,
                ordered: self.is_ordered(&bullet.list_id, bullet.nesting_level),
            });
        }

        let style = paragraph
            .paragraph_style
            .as_ref()
            .and_then(|s| s.named_style_type.as_deref())
            .map(ParagraphStyle::from_named_style)
            .unwrap_or(ParagraphStyle::NormalText);
        DocElement::paragraph(text, style)
    }

    fn image(&self, object_id: &str) -> Option<ImageElement> {
        let embedded = self
            .inline_objects
            .get(object_id)?
            .inline_object_properties
            .as_ref()?
            .embedded_object
            .as_ref()?;
        let props = embedded.image_properties.as_ref()?;
        let source_uri = props
            .content_uri
            .clone()
            .or_else(|| props.source_uri.clone())?;
        let size = embedded.size.as_ref();

        Some(ImageElement {
            source_uri,
            width_pt: size.and_then(|s| s.width.as_ref()).and_then(|d| d.magnitude),
            height_pt: size.and_then(|s| s.height.as_ref()).and_then(|d| d.magnitude),
        })
    }

    /// Numbered glyphs (decimal, alpha, roman) mean an ordered list.
    fn is_ordered(&self, list_id: &str, level: u8) -> bool {
        self.lists
            .get(list_id)
            .and_then(|l| l.list_properties.as_ref())
            .and_then(|p| p.nesting_levels.get(level as usize))
            .and_then(|n| n.glyph_type.as_deref())
            .map(|glyph| !matches!(glyph, "GLYPH_TYPE_UNSPECIFIED" | "NONE"))
            .unwrap_or(false)
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text: String = paragraph
        .elements
        .iter()
        .filter_map(|e| e.text_run.as_ref())
        .map(|run| run.content.as_str())
        .collect();
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

fn cell_text(cell: &TableCell) -> String {
    cell.content
        .iter()
        .filter_map(|e| e.paragraph.as_ref())
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// REQUEST PLANNING
// =============================================================================

pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

fn location(segment_id: Option<&str>, index: u32) -> Value {
    match segment_id {
        Some(id) => json!({ "segmentId": id, "index": index }),
        None => json!({ "index": index }),
    }
}

fn range(segment_id: Option<&str>, start: u32, end: u32) -> Value {
    match segment_id {
        Some(id) => json!({ "segmentId": id, "startIndex": start, "endIndex": end }),
        None => json!({ "startIndex": start, "endIndex": end }),
    }
}

fn set_named_style(segment_id: Option<&str>, start: u32, end: u32, style: ParagraphStyle) -> Value {
    json!({
        "updateParagraphStyle": {
            "range": range(segment_id, start, end),
            "paragraphStyle": { "namedStyleType": style.named_style() },
            "fields": "namedStyleType"
        }
    })
}

/// Requests that remove all user content from a segment.
pub fn clear_requests(bounds: &SegmentBounds) -> Vec<Value> {
    let end = bounds.end.saturating_sub(1);
    if end <= bounds.start {
        return Vec::new();
    }
    vec![json!({
        "deleteContentRange": {
            "range": range(bounds.segment_id.as_deref(), bounds.start, end)
        }
    })]
}

/// Request that adds a default header or footer.
pub fn create_section_request(section: Section) -> Option<Value> {
    match section {
        Section::Body => None,
        Section::Header => Some(json!({ "createHeader": { "type": "DEFAULT" } })),
        Section::Footer => Some(json!({ "createFooter": { "type": "DEFAULT" } })),
    }
}

/// Requests that append `element` at `bounds.insertion_index()`.
///
/// Returns an empty list for elements that cannot be written (unsupported
/// kinds, page breaks outside the body).
pub fn append_requests(element: &DocElement, bounds: &SegmentBounds) -> Vec<Value> {
    let segment = bounds.segment_id.as_deref();
    let at = bounds.insertion_index();

    match element {
        DocElement::Paragraph(p) => {
            let text = format!("{}\n", p.text);
            let end = at + utf16_len(&text);
            vec![
                json!({ "insertText": { "location": location(segment, at), "text": text } }),
                set_named_style(segment, at, end, p.style),
            ]
        }
        DocElement::ListItem(li) => {
            let text = format!("{}{}\n", "\t".repeat(li.nesting_level as usize), li.text);
            let end = at + utf16_len(&text);
            let preset = if li.ordered {
                "NUMBERED_DECIMAL_ALPHA_ROMAN"
            } else {
                "BULLET_DISC_CIRCLE_SQUARE"
            };
            vec![
                json!({ "insertText": { "location": location(segment, at), "text": text } }),
                set_named_style(segment, at, end, ParagraphStyle::NormalText),
                json!({
                    "createParagraphBullets": {
                        "range": range(segment, at, end),
                        "bulletPreset": preset
                    }
                }),
            ]
        }
        DocElement::HorizontalRule => {
            // The API has no rule insertion; an empty paragraph with a bottom border renders the same.
            vec![
                json!({ "insertText": { "location": location(segment, at), "text": "\n" } }),
                json!({
                    "updateParagraphStyle": {
                        "range": range(segment, at, at + 1),
                        "paragraphStyle": {
                            "borderBottom": {
                                "color": { "color": { "rgbColor": { "red": 0.6, "green": 0.6, "blue": 0.6 } } },
                                "width": { "magnitude": 1, "unit": "PT" },
                                "padding": { "magnitude": 1, "unit": "PT" },
                                "dashStyle": "SOLID"
                            }
                        },
                        "fields": "borderBottom"
                    }
                }),
            ]
        }
        DocElement::PageBreak if segment.is_none() => {
            vec![json!({ "insertPageBreak": { "location": location(None, at) } })]
        }
        DocElement::PageBreak => Vec::new(),
        DocElement::InlineImage(image) => {
            let mut insert = json!({
                "location": location(segment, at),
                "uri": image.source_uri,
            });
            if let (Some(width), Some(height)) = (image.width_pt, image.height_pt) {
                insert["objectSize"] = json!({
                    "width": { "magnitude": width, "unit": "PT" },
                    "height": { "magnitude": height, "unit": "PT" }
                });
            }
            vec![
                json!({ "insertText": { "location": location(segment, at), "text": "\n" } }),
                json!({ "insertInlineImage": insert }),
            ]
        }
        DocElement::Table(table) => table_requests(table, segment, at),
        DocElement::Unsupported { .. } => Vec::new(),
    }
}

/// An empty table goes in first, then each cell is filled from the last one
/// backwards so earlier cell indexes stay valid.
fn table_requests(table: &TableElement, segment: Option<&str>, at: u32) -> Vec<Value> {
    let rows = table.rows.len() as u32;
    let columns = table.column_count() as u32;
    if rows == 0 || columns == 0 {
        return Vec::new();
    }

    let mut requests = vec![json!({
        "insertTable": { "rows": rows, "columns": columns, "location": location(segment, at) }
    })];

    for (r, row) in table.rows.iter().enumerate().rev() {
        for (c, text) in row.iter().enumerate().rev() {
            if text.is_empty() {
                continue;
            }
            requests.push(json!({
                "insertText": {
                    "location": location(segment, cell_index(at, columns, r as u32, c as u32)),
                    "text": text
                }
            }));
        }
    }
    requests
}

/// Index of the empty paragraph in cell (`row`, `column`) of a table inserted at `at`.
///
/// The API puts a newline at `at`, so the table starts at `at + 1`; each row
/// adds one marker and each cell a marker plus its paragraph.
pub fn cell_index(at: u32, columns: u32, row: u32, column: u32) -> u32 {
    at + 4 + row * (2 * columns + 1) + 2 * column
}
