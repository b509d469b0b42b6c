//! Synchronous driver of the selection workflow, used by the CLI and the
//! tests. It validates input, calls the service and feeds every outcome back
//! through [`AppState::apply`].

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::model::{FileId, FileIdGenerator, SourceFile};
use crate::search::parse_keywords;
use crate::service;
use crate::state::{validate_search, Action, AppState, ArtifactRef};

pub struct Studio {
    state: AppState,
    config: StudioConfig,
    ids: FileIdGenerator,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl Studio {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            state: AppState::new(),
            config,
            ids: FileIdGenerator::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state.dispatch(action);
    }

    /// Add in-memory PDFs and resolve their page counts in parallel. Files whose
    /// page count cannot be read are dropped again.
    pub fn add_files<I, N>(&mut self, files: I) -> Vec<FileId>
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        let files: Vec<SourceFile> = files
            .into_iter()
            .map(|(name, bytes)| SourceFile::new(self.ids.next_id(), name, bytes))
            .collect();
        self.add_source_files(files)
    }

    /// Read PDFs from disk and add them
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Result<Vec<FileId>> {
        let files = paths
            .iter()
            .map(|path| SourceFile::read(self.ids.next_id(), path))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.add_source_files(files))
    }

    fn add_source_files(&mut self, files: Vec<SourceFile>) -> Vec<FileId> {
        let counts = service::resolve_page_counts(&files);
        self.dispatch(Action::FilesAdded(files));

        let mut loaded = Vec::new();
        for (file_id, count) in counts {
            match count {
                Ok(total_pages) => {
                    self.dispatch(Action::PageCountResolved {
                        file_id: file_id.clone(),
                        total_pages,
                    });
                    loaded.push(file_id);
                }
                Err(error) => self.dispatch(Action::PageCountFailed { file_id, error }),
            }
        }
        loaded
    }

    /// Run a keyword search from free-form input (comma separated keywords).
    /// Returns the number of matched pages; every failure ends up as the
    /// state's message.
    pub fn search(&mut self, keyword_input: &str) -> usize {
        self.search_with(keyword_input, |_| {})
    }

    pub fn search_with<F>(&mut self, keyword_input: &str, on_file: F) -> usize
    where
        F: FnMut(&SourceFile),
    {
        let keywords = parse_keywords(keyword_input, self.config.keyword_separator);
        if let Err(input) = validate_search(self.state.files(), &keywords) {
            self.dispatch(Action::SearchRejected(input));
            return 0;
        }

        self.dispatch(Action::SearchStarted);
        let result = service::search_keywords_with(self.state.files(), &keywords, on_file);
        let matched = result.as_ref().map(Vec::len).unwrap_or(0);
        self.dispatch(Action::SearchFinished(result));
        matched
    }

    pub fn toggle_page(&mut self, file_id: &FileId, page_index: usize) {
        self.dispatch(Action::TogglePage {
            file_id: file_id.clone(),
            page_index,
        });
    }

    pub fn add_neighbor(&mut self, file_id: &FileId, page_index: usize, offset: isize) {
        self.dispatch(Action::AddNeighbor {
            file_id: file_id.clone(),
            page_index,
            offset,
        });
    }

    pub fn remove_file(&mut self, file_id: &FileId) {
        self.dispatch(Action::RemoveFile(file_id.clone()));
    }

    pub fn clear_selection(&mut self) {
        self.dispatch(Action::ClearSelection);
    }

    /// Merge the current selection. Does nothing when the selection is empty.
    pub fn merge(&mut self) -> Option<ArtifactRef> {
        if self.state.selection().is_empty() {
            return None;
        }

        self.dispatch(Action::MergeStarted);
        let result = service::merge_pages(self.state.files(), self.state.selection());
        self.dispatch(Action::MergeFinished(result));
        self.state.artifact_ref()
    }

    /// Write the merged document into `dir` under the configured file name
    pub fn save_artifact(&self, reference: ArtifactRef, dir: &Path) -> Result<PathBuf> {
        let bytes = self
            .state
            .artifact_bytes(reference)
            .ok_or_else(|| StudioError::Merge("merged document is out of date".to_string()))?;

        let path = dir.join(&self.config.output_file_name);
        fs::write(&path, bytes)?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
