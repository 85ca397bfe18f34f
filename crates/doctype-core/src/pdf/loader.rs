//! Embedded text layer reading using lopdf and pdf-extract.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use super::{PageTextReader, Result};
use crate::error::PdfError;

/// Parse a PDF, decrypting it when it is protected by an empty user
/// password. Returns the document and the bytes `pdf-extract` should read
/// (the decrypted re-serialization for encrypted input).
pub fn load_document(data: &[u8]) -> Result<(Document, Vec<u8>)> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    if !doc.is_encrypted() {
        return Ok((doc, data.to_vec()));
    }

    if doc.decrypt("").is_err() {
        return Err(PdfError::Encrypted);
    }
    debug!("Decrypted PDF with empty password");

    let mut decrypted = Vec::new();
    doc.save_to(&mut decrypted)
        .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
    Ok((doc, decrypted))
}

/// Per-page text layer reader.
///
/// Uses `pdf-extract`'s page splitting, and lopdf's own per-page text
/// extraction when `pdf-extract` fails or disagrees on the page count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfReader;

impl LopdfReader {
    pub fn new() -> Self {
        Self
    }

    /// Page texts of an in-memory PDF.
    pub fn page_texts_from_mem(&self, data: &[u8]) -> Result<Vec<String>> {
        let (doc, raw) = load_document(data)?;
        let page_count = doc.get_pages().len();
        debug!("Loaded PDF with {} pages", page_count);

        match pdf_extract::extract_text_from_mem_by_pages(&raw) {
            Ok(pages) if pages.len() == page_count => Ok(pages),
            Ok(pages) => {
                debug!(
                    "pdf-extract returned {} pages for a {}-page document, using lopdf",
                    pages.len(),
                    page_count
                );
                lopdf_page_texts(&doc)
            }
            Err(e) => {
                warn!("pdf-extract failed ({}), using lopdf text extraction", e);
                lopdf_page_texts(&doc)
            }
        }
    }
}

impl PageTextReader for LopdfReader {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let data = std::fs::read(path)?;
        self.page_texts_from_mem(&data)
    }
}

fn lopdf_page_texts(doc: &Document) -> Result<Vec<String>> {
    doc.get_pages()
        .keys()
        .map(|&number| {
            doc.extract_text(&[number])
                .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", number, e)))
        })
        .collect()
}

/// Minimal PDF builder for tests: one Helvetica text line per page; an
/// empty string produces a page with no text layer.
#[cfg(test)]
pub(crate) fn test_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for text in pages {
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET")
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
