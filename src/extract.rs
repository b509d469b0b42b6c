use indicatif::ProgressBar;
use log::{debug, warn};
use lopdf::Document;
use rayon::prelude::*;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, StudioError};
use crate::model::{FileIdGenerator, SourceFile};

/// Parse the raw bytes of a loaded file
pub(crate) fn load_document(file: &SourceFile) -> Result<Document> {
    Document::load_mem(file.bytes()).map_err(|e| StudioError::parse(&file.name, e))
}

/// Extract the visible text of every page, in page order.
///
/// A document that cannot be parsed is an error. A page whose text cannot be
/// decoded (including a panic inside the font decoders on malformed fonts)
/// yields an empty string.
pub fn extract_page_texts(file: &SourceFile) -> Result<Vec<String>> {
    let document = load_document(file)?;
    Ok(page_texts(&document, &file.name))
}

pub(crate) fn page_texts(document: &Document, name: &str) -> Vec<String> {
    document
        .get_pages()
        .keys()
        .map(|&page_number| extract_page_text_safe(document, page_number, name))
        .collect()
}

fn extract_page_text_safe(document: &Document, page_number: u32, name: &str) -> String {
    let text = panic::catch_unwind(AssertUnwindSafe(|| document.extract_text(&[page_number])));

    match text {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Error extracting text from {} page {}: {}", name, page_number, e);
            String::new()
        }
        Err(_) => {
            warn!("Text extraction panicked for {} page {} (malformed font?)", name, page_number);
            String::new()
        }
    }
}

/// Collect all PDF file paths from the provided input paths.
///
/// Files keep the order they were given in; directories are walked
/// recursively in file name order. Duplicates are dropped.
pub fn collect_pdf_paths(input_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut pdf_paths: Vec<PathBuf> = Vec::new();

    for path in input_paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_pdf(entry.path()) {
                    pdf_paths.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() && is_pdf(path) {
            pdf_paths.push(path.clone());
        } else {
            warn!("Skipping invalid path: {}", path.display());
        }
    }

    let mut seen = std::collections::HashSet::new();
    pdf_paths.retain(|p| seen.insert(p.clone()));
    pdf_paths
}

/// Checks if a path has a `.pdf` extension (any case)
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Write the per-page text of every input PDF into `output_file`
pub fn run(output_file: &Path, input_paths: &[PathBuf]) -> anyhow::Result<usize> {
    let pdf_paths = collect_pdf_paths(input_paths);

    if pdf_paths.is_empty() {
        anyhow::bail!("No PDF files found in the provided paths");
    }

    let mut ids = FileIdGenerator::new();
    let files: Vec<SourceFile> = pdf_paths
        .iter()
        .map(|path| SourceFile::read(ids.next_id(), path))
        .collect::<Result<_>>()?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_message("Extracting text");

    let extracted: Vec<String> = files
        .par_iter()
        .map(|file| {
            let body = match extract_page_texts(file) {
                Ok(pages) => format_pages(&pages),
                Err(e) => {
                    warn!("Error processing {}: {}", file.name, e);
                    String::new()
                }
            };
            format!(
                "[Start of document: {}]\n{}[End of document: {}]\n",
                file.name, body, file.name
            )
        })
        .inspect(|_| pb.inc(1))
        .collect();

    pb.finish_with_message("Done");

    fs::write(output_file, extracted.join("\n"))?;
    debug!("Wrote text of {} documents to {}", files.len(), output_file.display());

    Ok(files.len())
}

fn format_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[Page {}]\n{}\n", i + 1, text.trim_end()))
        .collect()
}
