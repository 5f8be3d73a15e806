//! # Identifier Embedding
//!
//! Renders `UUID: <uuid>` onto every page of a PDF so that the printed or
//! downloaded certificate carries its ledger lookup key. Because the stamp
//! is part of the bytes that get hashed, two issuances of the same source
//! document produce different digests.
//!
//! ## Placement
//!
//! Helvetica, size 10, baseline origin at `(urx − 250, ury − 20)` of the
//! page's effective MediaBox. MediaBox and Resources are inheritable page
//! attributes and are resolved through the page tree. A page with no
//! MediaBox anywhere in its ancestry is treated as US Letter.
//!
//! Existing content is bracketed with `q … Q` so that a transformation
//! matrix left on the graphics stack by the original page cannot move the
//! stamp.
//!
//! ## Determinism
//!
//! The output depends only on the input bytes and the identifier. Objects
//! are written in id order and nothing time-dependent is added.

use docseal_core::CertificateId;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as PdfDocument, Object, ObjectId, Stream};

use crate::document::{Document, MediaType};
use crate::error::DocumentError;

/// Font size of the stamp.
pub const STAMP_FONT_SIZE: i64 = 10;
/// Horizontal distance of the stamp origin from the right page edge.
pub const STAMP_OFFSET_X: f32 = 250.0;
/// Vertical distance of the stamp baseline from the top page edge.
pub const STAMP_OFFSET_Y: f32 = 20.0;

/// Resource name the stamp font is registered under on each page.
const STAMP_FONT_RESOURCE: &str = "DsUuid";
/// US Letter, in points.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];
/// Guard against cyclic `Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// The text rendered onto each page.
pub fn stamp_text(id: &CertificateId) -> String {
    format!("UUID: {id}")
}

/// Embed `id` into every page of `document`.
///
/// Returns a new document of the same media type. The input is not
/// modified.
pub fn embed(document: &Document, id: &CertificateId) -> Result<Document, DocumentError> {
    if document.media_type() != &MediaType::Pdf {
        return Err(DocumentError::UnsupportedMediaType(
            document.media_type().to_string(),
        ));
    }
    let bytes = embed_pdf(document.bytes(), id)?;
    Ok(Document::pdf(bytes))
}

fn embed_pdf(bytes: &[u8], id: &CertificateId) -> Result<Vec<u8>, DocumentError> {
    let mut pdf = PdfDocument::load_mem(bytes).map_err(DocumentError::malformed)?;
    if pdf.trailer.has(b"Encrypt") {
        return Err(DocumentError::Malformed(
            "encrypted documents are not supported".into(),
        ));
    }

    let pages: Vec<ObjectId> = pdf.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(DocumentError::Malformed("document has no pages".into()));
    }

    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let save_state = pdf.add_object(Stream::new(
        Dictionary::new(),
        encode(vec![Operation::new("q", vec![])])?,
    ));
    let text = stamp_text(id);

    for page_id in &pages {
        let page_id = *page_id;
        let [_, _, urx, ury] = media_box(&pdf, page_id)?;
        let resources = stamp_resources(&pdf, page_id, font_id)?;

        let mut contents = vec![Object::Reference(save_state)];
        contents.extend(existing_contents(&pdf, page_id)?);
        let overlay = pdf.add_object(Stream::new(
            Dictionary::new(),
            encode(stamp_operations(&text, urx, ury))?,
        ));
        contents.push(Object::Reference(overlay));

        let page = pdf
            .get_dictionary_mut(page_id)
            .map_err(DocumentError::malformed)?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
    }

    let mut out = Vec::with_capacity(bytes.len() + 1024);
    pdf.save_to(&mut out)
        .map_err(|e| DocumentError::Write(e.to_string()))?;
    tracing::debug!(uuid = %id, pages = pages.len(), size = out.len(), "embedded identifier");
    Ok(out)
}

fn stamp_operations(text: &str, urx: f32, ury: f32) -> Vec<Operation> {
    let x = (urx - STAMP_OFFSET_X).round() as i64;
    let y = (ury - STAMP_OFFSET_Y).round() as i64;
    vec![
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        Operation::new("g", vec![Object::Integer(0)]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![STAMP_FONT_RESOURCE.into(), STAMP_FONT_SIZE.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>, DocumentError> {
    Content { operations }
        .encode()
        .map_err(|e| DocumentError::Write(e.to_string()))
}

/// Page content streams as a flat list of references.
fn existing_contents(pdf: &PdfDocument, page_id: ObjectId) -> Result<Vec<Object>, DocumentError> {
    let page = pdf.get_dictionary(page_id).map_err(DocumentError::malformed)?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(r)) => match pdf.get_object(*r) {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Stream(_)) => vec![Object::Reference(*r)],
            Ok(_) => return Err(DocumentError::Malformed("page contents are not a stream".into())),
            Err(e) => return Err(DocumentError::malformed(e)),
        },
        Ok(Object::Array(items)) => items.clone(),
        Ok(_) => return Err(DocumentError::Malformed("page contents are not a stream".into())),
        Err(_) => Vec::new(),
    };
    Ok(contents)
}

/// The page's effective Resources with the stamp font added.
fn stamp_resources(
    pdf: &PdfDocument,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<Dictionary, DocumentError> {
    let mut resources = match inherited(pdf, page_id, b"Resources")? {
        Some(Object::Dictionary(d)) => d.clone(),
        Some(_) => return Err(DocumentError::Malformed("page resources are not a dictionary".into())),
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => match resolve(pdf, obj)? {
            Object::Dictionary(d) => d.clone(),
            _ => return Err(DocumentError::Malformed("font resources are not a dictionary".into())),
        },
        Err(_) => Dictionary::new(),
    };
    fonts.set(STAMP_FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    Ok(resources)
}

fn media_box(pdf: &PdfDocument, page_id: ObjectId) -> Result<[f32; 4], DocumentError> {
    let Some(obj) = inherited(pdf, page_id, b"MediaBox")? else {
        return Ok(DEFAULT_MEDIA_BOX);
    };
    let items = match obj {
        Object::Array(items) if items.len() == 4 => items,
        _ => return Err(DocumentError::Malformed("MediaBox is not a 4-element array".into())),
    };
    let mut rect = [0.0f32; 4];
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = number(resolve(pdf, item)?)
            .ok_or_else(|| DocumentError::Malformed("MediaBox entry is not a number".into()))?;
    }
    // Normalise so that (rect[2], rect[3]) is the upper-right corner.
    Ok([
        rect[0].min(rect[2]),
        rect[1].min(rect[3]),
        rect[0].max(rect[2]),
        rect[1].max(rect[3]),
    ])
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Look up an inheritable page attribute, walking `Parent` links.
fn inherited<'a>(
    pdf: &'a PdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, DocumentError> {
    let mut node = pdf.get_dictionary(page_id).map_err(DocumentError::malformed)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(pdf, value).map(Some);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => {
                node = pdf.get_dictionary(*parent).map_err(DocumentError::malformed)?;
            }
            _ => return Ok(None),
        }
    }
    Err(DocumentError::Malformed("page tree is too deep or cyclic".into()))
}

fn resolve<'a>(pdf: &'a PdfDocument, obj: &'a Object) -> Result<&'a Object, DocumentError> {
    match obj {
        Object::Reference(id) => pdf.get_object(*id).map_err(DocumentError::malformed),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{blank_pdf, PdfFixture};
    use docseal_core::sha256_digest;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    fn page_contents(bytes: &[u8]) -> Vec<Vec<u8>> {
        let pdf = PdfDocument::load_mem(bytes).unwrap();
        pdf.get_pages()
            .into_values()
            .map(|id| pdf.get_page_content(id).unwrap())
            .collect()
    }

    #[test]
    fn stamps_every_page() {
        let id = CertificateId::new();
        let out = embed(&Document::pdf(blank_pdf(3).unwrap()), &id).unwrap();
        let pages = page_contents(out.bytes());
        assert_eq!(pages.len(), 3);
        for content in pages {
            assert!(contains(&content, &format!("(UUID: {id}) Tj")));
        }
    }

    #[test]
    fn original_content_is_kept() {
        let out = embed(&Document::pdf(blank_pdf(2).unwrap()), &CertificateId::new()).unwrap();
        let pages = page_contents(out.bytes());
        assert!(contains(&pages[0], "(Page 1) Tj"));
        assert!(contains(&pages[1], "(Page 2) Tj"));
    }

    #[test]
    fn stamp_is_placed_from_top_right_of_inherited_media_box() {
        // A4, declared on the Pages node only.
        let src = PdfFixture::new(1).media_box(Some([0, 0, 595, 842])).build().unwrap();
        let out = embed(&Document::pdf(src), &CertificateId::new()).unwrap();
        let content = &page_contents(out.bytes())[0];
        assert!(contains(content, "345 822 Td"));
        assert!(contains(content, "/DsUuid 10 Tf"));
    }

    #[test]
    fn missing_media_box_defaults_to_letter() {
        let src = PdfFixture::new(1).media_box(None).build().unwrap();
        let out = embed(&Document::pdf(src), &CertificateId::new()).unwrap();
        assert!(contains(&page_contents(out.bytes())[0], "362 772 Td"));
    }

    #[test]
    fn stamp_font_is_registered_alongside_existing_fonts() {
        let out = embed(&Document::pdf(blank_pdf(1).unwrap()), &CertificateId::new()).unwrap();
        let pdf = PdfDocument::load_mem(out.bytes()).unwrap();
        let page_id = *pdf.get_pages().values().next().unwrap();
        let page = pdf.get_dictionary(page_id).unwrap();
        let fonts = page
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"Font"))
            .and_then(Object::as_dict)
            .unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(STAMP_FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn same_input_and_id_is_byte_identical() {
        let src = Document::pdf(blank_pdf(2).unwrap());
        let id = CertificateId::new();
        let a = embed(&src, &id).unwrap();
        let b = embed(&src, &id).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn embedding_changes_the_digest() {
        let src = Document::pdf(blank_pdf(1).unwrap());
        let a = embed(&src, &CertificateId::new()).unwrap();
        let b = embed(&src, &CertificateId::new()).unwrap();
        assert_ne!(sha256_digest(src.bytes()), sha256_digest(a.bytes()));
        assert_ne!(sha256_digest(a.bytes()), sha256_digest(b.bytes()));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = embed(&Document::pdf(b"not a pdf at all".to_vec()), &CertificateId::new())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn zero_page_document_is_malformed() {
        let src = PdfFixture::new(0).build().unwrap();
        let err = embed(&Document::pdf(src), &CertificateId::new()).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(m) if m.contains("no pages")));
    }

    #[test]
    fn non_pdf_media_type_is_rejected() {
        let doc = Document::from_upload("photo.png", blank_pdf(1).unwrap());
        let err = embed(&doc, &CertificateId::new()).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedMediaType(_)));
    }
}
