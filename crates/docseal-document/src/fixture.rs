//! Minimal PDF builder for tests and demos.
//!
//! Pages share a `Resources` dictionary (and optionally a `MediaBox`) set on
//! the `Pages` node, so generated documents exercise attribute inheritance.
//! Page `n` shows the text `Page n` in Courier.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as PdfDocument, Object, Stream};

use crate::error::DocumentError;

/// Builder for small multi-page PDFs.
#[derive(Debug, Clone)]
pub struct PdfFixture {
    pages: usize,
    media_box: Option<[i64; 4]>,
}

impl PdfFixture {
    /// `pages` A4 pages.
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            media_box: Some([0, 0, 595, 842]),
        }
    }

    /// Set the inherited MediaBox, or omit it entirely with `None`.
    pub fn media_box(mut self, media_box: Option<[i64; 4]>) -> Self {
        self.media_box = media_box;
        self
    }

    /// Serialise the document.
    pub fn build(&self) -> Result<Vec<u8>, DocumentError> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::with_capacity(self.pages);
        for n in 1..=self.pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(600)]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| DocumentError::Write(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(self.pages as i64),
            "Resources" => resources_id,
        };
        if let Some(rect) = self.media_box {
            pages.set(
                "MediaBox",
                Object::Array(rect.iter().map(|v| Object::Integer(*v)).collect()),
            );
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| DocumentError::Write(e.to_string()))?;
        Ok(out)
    }
}

/// A valid A4 PDF with `pages` pages.
pub fn blank_pdf(pages: usize) -> Result<Vec<u8>, DocumentError> {
    PdfFixture::new(pages).build()
}
