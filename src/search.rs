use log::{debug, info};

use crate::error::Result;
use crate::extract::{load_document, page_texts};
use crate::model::{SelectionEntry, SourceFile};

/// Split a free-form keyword input on `separator`, trimming every keyword
/// and dropping the empty ones.
pub fn parse_keywords(input: &str, separator: char) -> Vec<String> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return the keywords contained in `page_text`, spelled as supplied.
/// Matching is case-insensitive and ignores surrounding whitespace; keywords
/// that are blank after trimming never match.
pub fn matching_keywords(page_text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = page_text.to_lowercase();

    keywords
        .iter()
        .filter(|k| {
            let needle = k.trim();
            !needle.is_empty() && haystack.contains(&needle.to_lowercase())
        })
        .cloned()
        .collect()
}

/// Scan every page of every file for keyword occurrences.
///
/// Files are visited in the given order, pages in page order, and every
/// matching page appears exactly once. The first file that fails to parse
/// aborts the whole scan.
pub fn search_keywords(files: &[SourceFile], keywords: &[String]) -> Result<Vec<SelectionEntry>> {
    search_keywords_with(files, keywords, |_| {})
}

/// Same as [`search_keywords`], calling `on_file` once each file is scanned
pub fn search_keywords_with<F>(
    files: &[SourceFile],
    keywords: &[String],
    mut on_file: F,
) -> Result<Vec<SelectionEntry>>
where
    F: FnMut(&SourceFile),
{
    let mut matches = Vec::new();

    for file in files {
        let document = load_document(file)?;
        let texts = page_texts(&document, &file.name);
        let before = matches.len();

        for (page_index, text) in texts.iter().enumerate() {
            let found = matching_keywords(text, keywords);
            if !found.is_empty() {
                matches.push(SelectionEntry::matched(file, page_index, found));
            }
        }

        debug!(
            "{}: {} of {} pages matched",
            file.name,
            matches.len() - before,
            texts.len()
        );
        on_file(file);
    }

    info!("Keyword search matched {} pages in {} files", matches.len(), files.len());
    Ok(matches)
}
