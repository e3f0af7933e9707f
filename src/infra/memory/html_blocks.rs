// Block-level HTML scanner used by the in-memory workspace to imitate
// "convert on upload".
//
// It only needs to understand the block structure a converted document
// would end up with: headings, paragraphs, lists, tables, rules, images and
// page breaks. Inline formatting (b, i, span, a, ...) is flattened to text.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::documents::{
    DocElement, ImageElement, ListItemElement, ParagraphStyle, TableElement,
};

/// Soft line break, the way the platform stores `<br>` inside a paragraph.
pub const LINE_BREAK: char = '\u{000B}';

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .expect("tag pattern is valid")
    })
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("attribute pattern is valid")
    })
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
    })
}

/// Convert an HTML fragment or page into document elements.
pub fn html_to_elements(html: &str) -> Vec<DocElement> {
    let mut scanner = Scanner::default();
    let mut last = 0;

    for caps in tag_regex().captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        scanner.text(&html[last..whole.start()]);
        last = whole.end();

        // Comments have no name group.
        let Some(name) = caps.get(2) else { continue };
        let name = name.as_str().to_ascii_lowercase();
        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        if caps.get(1).map_or(false, |m| !m.as_str().is_empty()) {
            scanner.close(&name);
        } else {
            scanner.open(&name, attrs);
        }
    }
    scanner.text(&html[last..]);

    scanner.finish()
}

#[derive(Debug, Clone, Copy)]
enum Block {
    Paragraph(ParagraphStyle),
    ListItem { level: u8, ordered: bool },
    /// Text that isn't inside any block tag.
    Loose,
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    cell: Option<String>,
}

#[derive(Default)]
struct Scanner {
    out: Vec<DocElement>,
    block: Option<Block>,
    buffer: String,
    lists: Vec<bool>,
    table: Option<TableBuilder>,
    breaks_after: Vec<String>,
    skipping: Option<String>,
}

impl Scanner {
    fn text(&mut self, raw: &str) {
        if self.skipping.is_some() || raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);

        if let Some(table) = self.table.as_mut() {
            if let Some(cell) = table.cell.as_mut() {
                cell.push_str(&decoded);
            }
            return;
        }

        if self.block.is_none() {
            if decoded.trim().is_empty() {
                return;
            }
            self.block = Some(Block::Loose);
        }
        self.buffer.push_str(&decoded);
    }

    fn open(&mut self, name: &str, attrs: &str) {
        if self.skipping.is_some() {
            return;
        }
        let attrs = parse_attrs(attrs);
        let style = attr(&attrs, "style")
            .map(|s| s.to_ascii_lowercase().replace(' ', ""))
            .unwrap_or_default();

        if style.contains("page-break-before:always") || style.contains("break-before:page") {
            self.flush();
            self.out.push(DocElement::PageBreak);
        }
        let break_after =
            style.contains("page-break-after:always") || style.contains("break-after:page");
        if break_after && !is_void(name) {
            self.breaks_after.push(name.to_string());
        }

        match name {
            "script" | "style" | "head" | "title" => self.skipping = Some(name.to_string()),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                self.start_block(Block::Paragraph(ParagraphStyle::Heading(level)));
            }
            "p" | "div" if self.in_list_item() => {
                if !self.buffer.trim().is_empty() {
                    self.buffer.push(LINE_BREAK);
                }
            }
            "p" => self.start_block(Block::Paragraph(ParagraphStyle::NormalText)),
            "ul" | "ol" => {
                self.flush();
                self.lists.push(name == "ol");
            }
            "li" => {
                let level = self.lists.len().saturating_sub(1).min(u8::MAX as usize) as u8;
                let ordered = self.lists.last().copied().unwrap_or(false);
                self.start_block(Block::ListItem { level, ordered });
            }
            "table" => {
                self.flush();
                self.table.get_or_insert_with(TableBuilder::default);
            }
            "tr" => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            "td" | "th" => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            "br" => self.text_break(),
            "hr" if self.table.is_none() => {
                self.flush();
                self.out.push(DocElement::HorizontalRule);
            }
            "img" if self.table.is_none() => {
                if let Some(src) = attr(&attrs, "src") {
                    self.flush();
                    self.out.push(DocElement::InlineImage(ImageElement {
                        source_uri: src.to_string(),
                        width_pt: attr(&attrs, "width").and_then(px_to_pt),
                        height_pt: attr(&attrs, "height").and_then(px_to_pt),
                    }));
                }
            }
            "div" | "section" | "article" | "blockquote" | "body" | "header" | "footer" => {
                if self.table.is_none() {
                    self.flush();
                }
            }
            _ => {}
        }

        // Void tags never close, so their trailing break goes out now.
        if break_after && is_void(name) && self.table.is_none() {
            self.flush();
            self.out.push(DocElement::PageBreak);
        }
    }

    fn in_list_item(&self) -> bool {
        self.table.is_none() && matches!(self.block, Some(Block::ListItem { .. }))
    }

    fn close(&mut self, name: &str) {
        if let Some(skipped) = &self.skipping {
            if skipped == name {
                self.skipping = None;
            }
            return;
        }

        match name {
            "p" | "div" if self.in_list_item() => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li" | "div" | "section"
            | "article" | "blockquote" | "body" => {
                if self.table.is_none() {
                    self.flush();
                }
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "td" | "th" => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.take() {
                        if table.rows.is_empty() {
                            table.rows.push(Vec::new());
                        }
                        if let Some(row) = table.rows.last_mut() {
                            row.push(normalize(&cell));
                        }
                    }
                }
            }
            "table" => self.finish_table(),
            _ => {}
        }

        if self.breaks_after.last().map(String::as_str) == Some(name) {
            self.breaks_after.pop();
            self.flush();
            self.out.push(DocElement::PageBreak);
        }
    }

    fn text_break(&mut self) {
        if let Some(table) = self.table.as_mut() {
            if let Some(cell) = table.cell.as_mut() {
                cell.push(' ');
            }
            return;
        }
        if self.block.is_some() {
            self.buffer.push(LINE_BREAK);
        }
    }

    fn start_block(&mut self, block: Block) {
        if self.table.is_some() {
            return;
        }
        self.flush();
        self.block = Some(block);
    }

    fn flush(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };
        let text = normalize(&self.buffer);
        self.buffer.clear();

        match block {
            Block::Paragraph(style) => self.out.push(DocElement::paragraph(text, style)),
            Block::ListItem { level, ordered } => {
                self.out.push(DocElement::ListItem(ListItemElement {
                    text,
                    nesting_level: level,
                    ordered,
                }))
            }
            Block::Loose if !text.is_empty() => self
                .out
                .push(DocElement::paragraph(text, ParagraphStyle::NormalText)),
            Block::Loose => {}
        }
    }

    fn finish_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let rows: Vec<Vec<String>> = table.rows.into_iter().filter(|r| !r.is_empty()).collect();
        if !rows.is_empty() {
            self.out.push(DocElement::Table(TableElement { rows }));
        }
    }

    fn finish(mut self) -> Vec<DocElement> {
        self.flush();
        self.finish_table();
        self.out
    }
}

fn is_void(name: &str) -> bool {
    matches!(name, "br" | "hr" | "img" | "input" | "meta" | "link" | "wbr")
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    attr_regex()
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// HTML pixel sizes to points (96 dpi screen, 72 points per inch).
fn px_to_pt(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .map(|px| px * 0.75)
}

/// Collapse ASCII whitespace runs the way a browser would. Non-breaking
/// spaces and soft line breaks survive.
fn normalize(text: &str) -> String {
    text.split(LINE_BREAK)
        .map(|part| {
            part.split(|c: char| c.is_ascii_whitespace())
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(&LINE_BREAK.to_string())
}

fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00A0}'),
                    "ndash" => Some('–'),
                    "mdash" => Some('—'),
                    "pound" => Some('£'),
                    "euro" => Some('€'),
                    "copy" => Some('©'),
                    _ => None,
                }
            };
            decoded
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
