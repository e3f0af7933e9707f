// This is an IN-MEMORY implementation of both store ports.
//
// One `InMemoryWorkspace` plays the part of the whole platform: files live in
// a single `DashMap`, documents are files that carry structured sections, and
// "convert on upload" runs the HTML through `html_blocks`. It backs
// `DOCS_BACKEND=memory` and every test in the crate.
//
// A few knobs let tests simulate platform trouble: inaccessible IDs, failing
// appends and failing deletes.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use super::html_blocks::html_to_elements;
use crate::core::documents::{DocElement, DocumentInfo, DocumentStore, Section, StoreError};
use crate::core::files::{
    Blob, FileInfo, FileStore, LinkRole, GOOGLE_DOC_MIME, HTML_MIME, PDF_MIME,
};

#[derive(Clone, Debug, Default)]
struct StoredDocument {
    body: Vec<DocElement>,
    header: Option<Vec<DocElement>>,
    footer: Option<Vec<DocElement>>,
    saves: u32,
}

impl StoredDocument {
    fn section_mut(&mut self, section: Section) -> Option<&mut Vec<DocElement>> {
        match section {
            Section::Body => Some(&mut self.body),
            Section::Header => self.header.as_mut(),
            Section::Footer => self.footer.as_mut(),
        }
    }

    fn section(&self, section: Section) -> Option<&Vec<DocElement>> {
        match section {
            Section::Body => Some(&self.body),
            Section::Header => self.header.as_ref(),
            Section::Footer => self.footer.as_ref(),
        }
    }
}

#[derive(Clone, Debug)]
struct StoredFile {
    info: FileInfo,
    document: Option<StoredDocument>,
    bytes: Vec<u8>,
    link_role: Option<LinkRole>,
}

pub struct InMemoryWorkspace {
    files: DashMap<String, StoredFile>,
    denied: DashSet<String>,
    next_id: AtomicU64,
    calls: AtomicUsize,
    appends_left: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
            denied: DashSet::new(),
            next_id: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
            appends_left: AtomicUsize::new(usize::MAX),
            fail_deletes: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Seeding and inspection (used by tests and the memory backend)
    // ------------------------------------------------------------------

    /// Add (or replace) a document with the given body and no header/footer.
    pub fn insert_document(&self, id: &str, title: &str, body: Vec<DocElement>) {
        self.files.insert(
            id.to_string(),
            StoredFile {
                info: FileInfo {
                    id: id.to_string(),
                    name: title.to_string(),
                    mime_type: GOOGLE_DOC_MIME.to_string(),
                    parents: Vec::new(),
                    trashed: false,
                },
                document: Some(StoredDocument {
                    body,
                    ..StoredDocument::default()
                }),
                bytes: Vec::new(),
                link_role: None,
            },
        );
    }

    /// Overwrite a section directly. `None` removes a header/footer.
    pub fn set_section(&self, id: &str, section: Section, elements: Option<Vec<DocElement>>) {
        if let Some(mut file) = self.files.get_mut(id) {
            if let Some(doc) = file.document.as_mut() {
                match section {
                    Section::Body => doc.body = elements.unwrap_or_default(),
                    Section::Header => doc.header = elements,
                    Section::Footer => doc.footer = elements,
                }
            }
        }
    }

    pub fn move_to_folder(&self, id: &str, folder_id: &str) {
        if let Some(mut file) = self.files.get_mut(id) {
            file.info.parents = vec![folder_id.to_string()];
        }
    }

    /// Every call touching `id` will fail as if it weren't shared with us.
    pub fn deny_access(&self, id: &str) {
        self.denied.insert(id.to_string());
    }

    /// Allow `count` more appends, then fail the rest.
    pub fn fail_appends_after(&self, count: usize) {
        self.appends_left.store(count, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn section(&self, id: &str, section: Section) -> Option<Vec<DocElement>> {
        self.files
            .get(id)
            .and_then(|f| f.document.as_ref().and_then(|d| d.section(section).cloned()))
    }

    pub fn save_count(&self, id: &str) -> u32 {
        self.files
            .get(id)
            .and_then(|f| f.document.as_ref().map(|d| d.saves))
            .unwrap_or(0)
    }

    pub fn file(&self, id: &str) -> Option<FileInfo> {
        self.files.get(id).map(|f| f.info.clone())
    }

    pub fn file_bytes(&self, id: &str) -> Option<Vec<u8>> {
        self.files.get(id).map(|f| f.bytes.clone())
    }

    pub fn link_role(&self, id: &str) -> Option<LinkRole> {
        self.files.get(id).and_then(|f| f.link_role)
    }

    /// All files, trashed ones included.
    pub fn all_files(&self) -> Vec<FileInfo> {
        self.files.iter().map(|f| f.info.clone()).collect()
    }

    /// How many port methods have been called so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn new_id(&self) -> String {
        format!("mem-{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Run `f` against a stored file, with the same failures the platform reports.
    fn with_file<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut StoredFile) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.denied.contains(id) {
            return Err(StoreError::api(403, "The caller does not have permission"));
        }
        match self.files.get_mut(id) {
            Some(mut file) => f(file.value_mut()),
            None => Err(StoreError::api(404, format!("File not found: {}", id))),
        }
    }

    fn with_document<T>(
        &self,
        id: &str,
        f: impl FnOnce(&FileInfo, &mut StoredDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.with_file(id, |file| match file.document.as_mut() {
            Some(doc) => f(&file.info, doc),
            None => Err(StoreError::api(
                400,
                format!("File {} is not a document", id),
            )),
        })
    }
}

impl Default for InMemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryWorkspace {
    async fn open(&self, doc_id: &str) -> Result<DocumentInfo, StoreError> {
        self.with_document(doc_id, |info, _| {
            Ok(DocumentInfo {
                id: info.id.clone(),
                title: info.name.clone(),
            })
        })
    }

    async fn read_section(
        &self,
        doc_id: &str,
        section: Section,
    ) -> Result<Option<Vec<DocElement>>, StoreError> {
        self.with_document(doc_id, |_, doc| Ok(doc.section(section).cloned()))
    }

    async fn ensure_section(&self, doc_id: &str, section: Section) -> Result<(), StoreError> {
        self.with_document(doc_id, |_, doc| {
            match section {
                Section::Body => {}
                Section::Header => {
                    doc.header.get_or_insert_with(Vec::new);
                }
                Section::Footer => {
                    doc.footer.get_or_insert_with(Vec::new);
                }
            }
            Ok(())
        })
    }

    async fn clear_section(&self, doc_id: &str, section: Section) -> Result<(), StoreError> {
        self.with_document(doc_id, |_, doc| {
            if let Some(elements) = doc.section_mut(section) {
                elements.clear();
            }
            Ok(())
        })
    }

    async fn append(
        &self,
        doc_id: &str,
        section: Section,
        element: &DocElement,
    ) -> Result<(), StoreError> {
        self.with_document(doc_id, |_, doc| {
            let allowed = self
                .appends_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(StoreError::api(500, "Simulated append failure"));
            }

            let target = doc.section_mut(section).ok_or_else(|| {
                StoreError::api(400, format!("Document {} has no {}", doc_id, section.name()))
            })?;
            target.push(element.clone());
            Ok(())
        })
    }

    async fn save(&self, doc_id: &str) -> Result<(), StoreError> {
        self.with_document(doc_id, |_, doc| {
            doc.saves += 1;
            Ok(())
        })
    }
}

#[async_trait]
impl FileStore for InMemoryWorkspace {
    async fn get_file(&self, file_id: &str) -> Result<FileInfo, StoreError> {
        self.with_file(file_id, |file| Ok(file.info.clone()))
    }

    async fn copy(&self, file_id: &str, new_name: &str) -> Result<FileInfo, StoreError> {
        let mut copy = self.with_file(file_id, |file| Ok(file.clone()))?;

        copy.info.id = self.new_id();
        copy.info.name = new_name.to_string();
        copy.info.trashed = false;
        copy.link_role = None;
        if let Some(doc) = copy.document.as_mut() {
            doc.saves = 0;
        }

        let info = copy.info.clone();
        self.files.insert(info.id.clone(), copy);
        Ok(info)
    }

    async fn trash(&self, file_id: &str) -> Result<(), StoreError> {
        self.with_file(file_id, |file| {
            file.info.trashed = true;
            Ok(())
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        self.with_file(file_id, |_| Ok(()))?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::api(500, "Simulated delete failure"));
        }
        self.files.remove(file_id);
        Ok(())
    }

    async fn create_from_blob(
        &self,
        blob: Blob,
        parent_folder: Option<&str>,
        convert: bool,
    ) -> Result<FileInfo, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let document = if convert {
            if blob.mime_type != HTML_MIME {
                return Err(StoreError::api(
                    400,
                    format!("Cannot convert {} to a document", blob.mime_type),
                ));
            }
            let html = String::from_utf8_lossy(&blob.bytes);
            Some(StoredDocument {
                body: html_to_elements(&html),
                ..StoredDocument::default()
            })
        } else {
            None
        };

        let info = FileInfo {
            id: self.new_id(),
            name: blob.name,
            mime_type: if document.is_some() {
                GOOGLE_DOC_MIME.to_string()
            } else {
                blob.mime_type
            },
            parents: parent_folder.map(|p| vec![p.to_string()]).unwrap_or_default(),
            trashed: false,
        };

        self.files.insert(
            info.id.clone(),
            StoredFile {
                info: info.clone(),
                bytes: if document.is_some() { Vec::new() } else { blob.bytes },
                document,
                link_role: None,
            },
        );
        Ok(info)
    }

    async fn list_by_name(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<Vec<FileInfo>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .files
            .iter()
            .filter(|f| {
                f.info.name == name
                    && !f.info.trashed
                    && f.info.parents.iter().any(|p| p == folder_id)
            })
            .map(|f| f.info.clone())
            .collect())
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError> {
        if mime_type != PDF_MIME {
            return Err(StoreError::api(
                400,
                format!("Export to {} is not supported", mime_type),
            ));
        }
        self.with_document(file_id, |info, doc| Ok(render_pdf(&info.name, &doc.body)))
    }

    async fn share_with_link(&self, file_id: &str, role: LinkRole) -> Result<(), StoreError> {
        self.with_file(file_id, |file| {
            file.link_role = Some(role);
            Ok(())
        })
    }
}

/// A tiny stand-in for a rendered PDF: the header plus one line per paragraph.
fn render_pdf(title: &str, body: &[DocElement]) -> Vec<u8> {
    let mut out = format!("%PDF-1.4\n% {}\n", title);
    for element in body {
        match element {
            DocElement::Paragraph(p) => out.push_str(&format!("({}) Tj\n", p.text)),
            DocElement::ListItem(li) => out.push_str(&format!("(- {}) Tj\n", li.text)),
            other => out.push_str(&format!("% {}\n", other.kind())),
        }
    }
    out.push_str("%%EOF\n");
    out.into_bytes()
}
