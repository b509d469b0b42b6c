//! Structural page copy of the current selection into a new PDF

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::error::{Result, StudioError};
use crate::extract::load_document;
use crate::model::{sorted_selection, FileId, SelectionEntry, SourceFile};

const PRODUCER: &str = "PDF Smart Studio";

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Copy the selected pages, in selection order, into a new document and
/// return its serialized bytes.
///
/// The selection is sorted by file id then page index before copying, so the
/// output does not depend on the order entries were added in. Each source
/// document is parsed at most once. Pages are copied as PDF objects (content
/// streams, fonts, images), never re-drawn.
pub fn merge_pages(files: &[SourceFile], selection: &[SelectionEntry]) -> Result<Vec<u8>> {
    if selection.is_empty() {
        return Err(StudioError::Merge("nothing selected".to_string()));
    }

    let files_by_id: HashMap<&FileId, &SourceFile> = files.iter().map(|f| (&f.id, f)).collect();

    let mut output = Document::with_version("1.5");
    // Loaded sources for this call only: file id -> page number -> object id in `output`
    let mut loaded: HashMap<FileId, BTreeMap<u32, ObjectId>> = HashMap::new();
    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(selection.len());
    let mut adopted: HashSet<ObjectId> = HashSet::new();

    for entry in sorted_selection(selection) {
        let file = files_by_id.get(&entry.file_id).ok_or_else(|| {
            StudioError::Merge(format!(
                "{} ({}) is no longer loaded",
                entry.file_name, entry.file_id
            ))
        })?;

        if !loaded.contains_key(&entry.file_id) {
            let pages = import_document(&mut output, file)?;
            loaded.insert(entry.file_id.clone(), pages);
        }

        let source_page = u32::try_from(entry.page_index + 1)
            .ok()
            .and_then(|number| loaded[&entry.file_id].get(&number))
            .copied()
            .ok_or_else(|| {
                StudioError::Merge(format!(
                    "{} has no page {}",
                    file.name,
                    entry.page_number()
                ))
            })?;

        let page_id = if adopted.insert(source_page) {
            materialize_inherited(&mut output, source_page)?;
            source_page
        } else {
            // The same page twice: the second copy needs its own object
            let copy = output
                .get_object(source_page)
                .map_err(merge_error)?
                .clone();
            output.add_object(copy)
        };
        page_ids.push(page_id);
    }

    debug!(
        "Copying {} pages from {} source documents",
        page_ids.len(),
        loaded.len()
    );

    assemble_page_tree(&mut output, &page_ids)?;

    let mut bytes = Vec::new();
    output.save_to(&mut bytes)?;

    info!("Merged {} pages into {} bytes", page_ids.len(), bytes.len());
    Ok(bytes)
}

/// Move every object of `file` into `output` under fresh object numbers and
/// return its page map.
fn import_document(output: &mut Document, file: &SourceFile) -> Result<BTreeMap<u32, ObjectId>> {
    let mut source = load_document(file)?;

    source.renumber_objects_with(output.max_id + 1);
    let pages = source.get_pages();

    output.max_id = output.max_id.max(source.max_id);
    output.objects.extend(source.objects);

    debug!("Imported {} ({} pages)", file.name, pages.len());
    Ok(pages)
}

/// Copy attributes the page inherits from its page-tree ancestors onto the
/// page itself, since the page is about to be re-parented.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();

    {
        let page = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(merge_error)?;

        let mut missing: Vec<&[u8]> = INHERITABLE
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(|o| o.as_reference()).ok();
        let mut visited = HashSet::new();

        while let Some(parent_id) = parent {
            if missing.is_empty() || !visited.insert(parent_id) {
                break;
            }
            let node = match doc.get_object(parent_id).and_then(|o| o.as_dict()) {
                Ok(node) => node,
                Err(_) => break,
            };
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(|o| o.as_reference()).ok();
        }
    }

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(merge_error)?;

    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }
    if !page.has(b"MediaBox") {
        // US Letter, the PDF default
        page.set(
            "MediaBox",
            vec![0.into(), 0.into(), 612.into(), 792.into()],
        );
    }

    Ok(())
}

/// Build the catalog and a flat page tree over `page_ids`, then drop every
/// object the new tree does not reach.
fn assemble_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = doc.new_object_id();

    for &page_id in page_ids {
        let page = doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(merge_error)?;
        page.set("Parent", pages_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(pdf_date()),
    });

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let pruned = doc.prune_objects();
    debug!("Pruned {} unreachable objects", pruned.len());

    doc.renumber_objects();
    doc.compress();
    Ok(())
}

/// Current time as a PDF date string
fn pdf_date() -> String {
    chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
}

fn merge_error(e: lopdf::Error) -> StudioError {
    StudioError::Merge(e.to_string())
}
