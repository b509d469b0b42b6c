// Fixture PDFs built in memory with lopdf
#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdfstudio::controller::Studio;
use pdfstudio::model::{FileId, SourceFile};

/// Build a PDF with one page per entry of `texts`, each page showing its
/// text. Fonts live on the page tree root so pages inherit them.
pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, text) in texts.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (500 + i as i64).into(), 800.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => texts.len() as i64,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A loaded file with its page count already resolved
pub fn source_file(id: &str, name: &str, texts: &[&str]) -> SourceFile {
    SourceFile::new(FileId::new(id), name, pdf_with_pages(texts)).with_total_pages(texts.len())
}

/// A file that only exists in the state; its bytes are not a PDF
pub fn stub_file(id: &str, name: &str, total_pages: usize) -> SourceFile {
    SourceFile::new(FileId::new(id), name, b"not a pdf".to_vec()).with_total_pages(total_pages)
}

/// A studio with the given (name, page texts) files loaded
pub fn studio_with(files: &[(&str, &[&str])]) -> Studio {
    let mut studio = Studio::default();
    let loaded = studio.add_files(
        files
            .iter()
            .map(|(name, texts)| (name.to_string(), pdf_with_pages(texts))),
    );
    assert_eq!(loaded.len(), files.len());
    studio
}

/// Text of every page of a PDF
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .keys()
        .map(|&number| doc.extract_text(&[number]).unwrap())
        .collect()
}

/// Width of every page's MediaBox; fixture pages are 500 + index wide
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_object(id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_i64().unwrap()
        })
        .collect()
}
