//! Files, selection entries and the ordering they are displayed and merged in.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Opaque identifier of a loaded file.
///
/// Ids are handed out by [`FileIdGenerator`] and compare lexicographically,
/// which is the primary key of the merge order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    pub fn new(raw: impl Into<String>) -> Self {
        FileId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out zero padded sequential ids (`f0001`, `f0002`, ...) so that the
/// lexicographic order of ids follows load order.
#[derive(Debug, Default, Clone)]
pub struct FileIdGenerator {
    next: u32,
}

impl FileIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> FileId {
        self.next += 1;
        FileId(format!("f{:04}", self.next))
    }
}

/// A PDF loaded into the session
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub name: String,
    bytes: Arc<[u8]>,
    /// Zero until the page count for this file has been resolved
    pub total_pages: usize,
}

impl SourceFile {
    pub fn new(id: FileId, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            name: name.into(),
            bytes: bytes.into(),
            total_pages: 0,
        }
    }

    /// Read a file from disk, naming it after the path's file name
    pub fn read(id: FileId, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(id, name, bytes))
    }

    pub fn with_total_pages(mut self, total_pages: usize) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap shared handle to the raw bytes, for background workers
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn contains_page(&self, page_index: usize) -> bool {
        page_index < self.total_pages
    }
}

/// One (file, page) pair chosen for the output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub file_id: FileId,
    pub file_name: String,
    /// 0-based
    pub page_index: usize,
    /// Present only on entries produced by a keyword search
    pub matched_keywords: Option<Vec<String>>,
    pub is_manual: bool,
}

impl SelectionEntry {
    pub fn matched(file: &SourceFile, page_index: usize, keywords: Vec<String>) -> Self {
        Self {
            file_id: file.id.clone(),
            file_name: file.name.clone(),
            page_index,
            matched_keywords: Some(keywords),
            is_manual: false,
        }
    }

    pub fn manual(file_id: FileId, file_name: impl Into<String>, page_index: usize) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            page_index,
            matched_keywords: None,
            is_manual: true,
        }
    }

    pub fn refers_to(&self, file_id: &FileId, page_index: usize) -> bool {
        &self.file_id == file_id && self.page_index == page_index
    }

    /// Human readable 1-based page label
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }
}

/// Display and merge order: file id first, then page index
pub fn selection_order(a: &SelectionEntry, b: &SelectionEntry) -> Ordering {
    a.file_id
        .cmp(&b.file_id)
        .then(a.page_index.cmp(&b.page_index))
}

/// Return a copy of the selection in display/merge order
pub fn sorted_selection(selection: &[SelectionEntry]) -> Vec<SelectionEntry> {
    let mut sorted = selection.to_vec();
    sorted.sort_by(selection_order);
    sorted
}
