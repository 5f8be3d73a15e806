//! Uploaded documents and their media types.

use std::fmt;
use std::path::Path;

/// Declared media type of a document, derived from its file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `application/pdf`.
    Pdf,
    /// Anything else, carrying the lower-cased extension (empty if none).
    Other(String),
}

impl MediaType {
    /// Map an extension (with or without the leading dot) to a media type.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            _ => Self::Other(ext),
        }
    }

    /// Media type of a file name such as `diploma.PDF`.
    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    /// Canonical extension, without the dot.
    pub fn extension(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Other(ext) => ext,
        }
    }

    /// MIME string.
    pub fn mime(&self) -> &str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Other(_) => "application/octet-stream",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str(self.mime()),
            Self::Other(ext) if ext.is_empty() => f.write_str("(no extension)"),
            Self::Other(ext) => write!(f, ".{ext}"),
        }
    }
}

/// A raw document payload with its declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl Document {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    /// A PDF document.
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self::new(bytes, MediaType::Pdf)
    }

    /// Wrap an upload, taking the media type from its file name.
    pub fn from_upload(file_name: &str, bytes: Vec<u8>) -> Self {
        Self::new(bytes, MediaType::from_filename(file_name))
    }

    /// The payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the document, returning its payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The declared media type.
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// Whether the document is a PDF.
    pub fn is_pdf(&self) -> bool {
        self.media_type == MediaType::Pdf
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
