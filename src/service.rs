//! The PDF text/page service: page counting, keyword search, page merge

use log::debug;
use rayon::prelude::*;

use crate::error::Result;
use crate::extract::load_document;
use crate::model::{FileId, SourceFile};

pub use crate::merge::merge_pages;
pub use crate::search::{search_keywords, search_keywords_with};

/// Number of pages in `file`
pub fn count_pages(file: &SourceFile) -> Result<usize> {
    let document = load_document(file)?;
    let pages = document.get_pages().len();
    debug!("{} has {} pages", file.name, pages);
    Ok(pages)
}

/// Count pages of several files in parallel. Results come back tagged with
/// the file id, one per input file.
pub fn resolve_page_counts(files: &[SourceFile]) -> Vec<(FileId, Result<usize>)> {
    files
        .par_iter()
        .map(|file| (file.id.clone(), count_pages(file)))
        .collect()
}
