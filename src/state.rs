//! Application state and its transitions.
//!
//! Every user action and every completed background operation is an
//! [`Action`]; [`AppState::apply`] maps `(state, action)` to the next state
//! without doing any I/O, so the whole selection workflow can be driven and
//! tested without a front-end.

use std::fmt;
use std::sync::Arc;

use log::{debug, error, warn};

use crate::error::{EmptyInput, Result, StudioError};
use crate::model::{sorted_selection, FileId, SelectionEntry, SourceFile};

/// The single message shown to the user, worded in Italian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    NoFiles,
    NoKeywords,
    NoMatches,
    SearchFailed,
    MergeFailed,
    UnreadableFile(String),
}

impl From<EmptyInput> for UserMessage {
    fn from(input: EmptyInput) -> Self {
        match input {
            EmptyInput::NoFiles => UserMessage::NoFiles,
            EmptyInput::NoKeywords => UserMessage::NoKeywords,
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserMessage::NoFiles => write!(f, "Carica almeno un file PDF."),
            UserMessage::NoKeywords => write!(f, "Inserisci almeno una parola chiave."),
            UserMessage::NoMatches => write!(f, "Nessuna pagina trovata."),
            UserMessage::SearchFailed => write!(f, "Errore durante la ricerca."),
            UserMessage::MergeFailed => write!(f, "Errore nella creazione del PDF."),
            UserMessage::UnreadableFile(name) => {
                write!(f, "Impossibile leggere il file PDF: {}", name)
            }
        }
    }
}

/// Handle to a merged document. It stops resolving once the document is
/// regenerated or invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    revision: u64,
}

impl ArtifactRef {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// The most recent merge output
#[derive(Debug, Clone)]
pub struct MergedArtifact {
    revision: u64,
    bytes: Arc<Vec<u8>>,
}

impl MergedArtifact {
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            revision: self.revision,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug)]
pub enum Action {
    FilesAdded(Vec<SourceFile>),
    PageCountResolved { file_id: FileId, total_pages: usize },
    PageCountFailed { file_id: FileId, error: StudioError },
    SearchRejected(EmptyInput),
    SearchStarted,
    SearchFinished(Result<Vec<SelectionEntry>>),
    TogglePage { file_id: FileId, page_index: usize },
    AddNeighbor { file_id: FileId, page_index: usize, offset: isize },
    RemoveFile(FileId),
    ClearSelection,
    MergeStarted,
    MergeFinished(Result<Vec<u8>>),
    DismissMessage,
}

/// Check the inputs of a keyword search: files first, then keywords
pub fn validate_search(files: &[SourceFile], keywords: &[String]) -> std::result::Result<(), EmptyInput> {
    if files.is_empty() {
        return Err(EmptyInput::NoFiles);
    }
    if keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(EmptyInput::NoKeywords);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    files: Vec<SourceFile>,
    selection: Vec<SelectionEntry>,
    artifact: Option<MergedArtifact>,
    message: Option<UserMessage>,
    busy: bool,
    revisions: u64,
    /// Bumped on every change of the selection
    selection_version: u64,
    /// Selection version a running merge was started from
    merge_base: Option<u64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, file_id: &FileId) -> Option<&SourceFile> {
        self.files.iter().find(|f| &f.id == file_id)
    }

    /// Selection in the order entries were added
    pub fn selection(&self) -> &[SelectionEntry] {
        &self.selection
    }

    /// Selection in display and merge order
    pub fn sorted_selection(&self) -> Vec<SelectionEntry> {
        sorted_selection(&self.selection)
    }

    pub fn is_selected(&self, file_id: &FileId, page_index: usize) -> bool {
        self.selection.iter().any(|e| e.refers_to(file_id, page_index))
    }

    pub fn message(&self) -> Option<&UserMessage> {
        self.message.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn artifact(&self) -> Option<&MergedArtifact> {
        self.artifact.as_ref()
    }

    pub fn artifact_ref(&self) -> Option<ArtifactRef> {
        self.artifact.as_ref().map(MergedArtifact::reference)
    }

    /// Bytes behind `reference`, or `None` once it has been revoked
    pub fn artifact_bytes(&self, reference: ArtifactRef) -> Option<&[u8]> {
        self.artifact
            .as_ref()
            .filter(|a| a.revision == reference.revision)
            .map(MergedArtifact::bytes)
    }

    /// In-place variant of [`AppState::apply`]
    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(self);
        *self = state.apply(action);
    }

    /// Compute the state that follows `action`
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::FilesAdded(files) => {
                debug!("Adding {} files", files.len());
                self.files.extend(files);
                self.message = None;
            }
            Action::PageCountResolved {
                file_id,
                total_pages,
            } => {
                if let Some(file) = self.files.iter_mut().find(|f| f.id == file_id) {
                    file.total_pages = total_pages;
                }
            }
            Action::PageCountFailed { file_id, error } => {
                warn!("Cannot count pages of {}: {}", file_id, error);
                if let Some(file) = self.file(&file_id) {
                    self.message = Some(UserMessage::UnreadableFile(file.name.clone()));
                }
                self.remove_file(&file_id);
            }
            Action::SearchRejected(input) => {
                self.message = Some(input.into());
            }
            Action::SearchStarted => {
                self.busy = true;
                self.message = None;
                self.artifact = None;
            }
            Action::SearchFinished(result) => {
                self.busy = false;
                match result {
                    Ok(mut matches) => {
                        // Files may have been removed while the search ran
                        matches.retain(|m| self.file(&m.file_id).is_some());
                        if matches.is_empty() {
                            self.message = Some(UserMessage::NoMatches);
                        } else {
                            self.selection = matches;
                            self.selection_changed();
                        }
                    }
                    Err(e) => {
                        error!("Search failed: {}", e);
                        self.message = Some(UserMessage::SearchFailed);
                    }
                }
            }
            Action::TogglePage {
                file_id,
                page_index,
            } => {
                self.toggle(&file_id, page_index);
            }
            Action::AddNeighbor {
                file_id,
                page_index,
                offset,
            } => {
                let target = self
                    .file(&file_id)
                    .and_then(|file| neighbor_index(page_index, offset, file.total_pages));
                if let Some(target) = target {
                    self.add_manual(&file_id, target);
                }
            }
            Action::RemoveFile(file_id) => {
                self.remove_file(&file_id);
            }
            Action::ClearSelection => {
                self.selection.clear();
                self.selection_changed();
            }
            Action::MergeStarted => {
                self.busy = true;
                self.merge_base = Some(self.selection_version);
            }
            Action::MergeFinished(result) => {
                self.busy = false;
                let base = self.merge_base.take();
                match result {
                    Ok(_) if base != Some(self.selection_version) => {
                        debug!("Selection changed during merge; discarding the output");
                    }
                    Ok(bytes) => {
                        self.revisions += 1;
                        self.artifact = Some(MergedArtifact {
                            revision: self.revisions,
                            bytes: Arc::new(bytes),
                        });
                    }
                    Err(e) => {
                        error!("Merge failed: {}", e);
                        self.message = Some(UserMessage::MergeFailed);
                    }
                }
            }
            Action::DismissMessage => {
                self.message = None;
            }
        }
        self
    }

    /// Remove the entry for (file, page) if present, otherwise add a manual
    /// entry for it when the page exists.
    fn toggle(&mut self, file_id: &FileId, page_index: usize) {
        let before = self.selection.len();
        self.selection.retain(|e| !e.refers_to(file_id, page_index));

        if self.selection.len() == before {
            self.add_manual(file_id, page_index);
        } else {
            self.selection_changed();
        }
    }

    /// Add a manual entry for (file, page) unless it is already selected or
    /// the page does not exist.
    fn add_manual(&mut self, file_id: &FileId, page_index: usize) {
        if self.is_selected(file_id, page_index) {
            return;
        }
        let entry = match self.file(file_id) {
            Some(file) if file.contains_page(page_index) => {
                SelectionEntry::manual(file.id.clone(), file.name.clone(), page_index)
            }
            _ => return,
        };
        self.selection.push(entry);
        self.selection_changed();
    }

    fn remove_file(&mut self, file_id: &FileId) {
        self.files.retain(|f| &f.id != file_id);

        let before = self.selection.len();
        self.selection.retain(|e| &e.file_id != file_id);
        if self.selection.len() != before {
            self.selection_changed();
        }
    }

    /// Any previously merged document no longer matches the selection
    fn selection_changed(&mut self) {
        self.selection_version += 1;
        self.artifact = None;
    }
}

/// `page_index + offset` when it lies inside `[0, total_pages)`
pub fn neighbor_index(page_index: usize, offset: isize, total_pages: usize) -> Option<usize> {
    let target = page_index.checked_add_signed(offset)?;
    (target < total_pages).then_some(target)
}
