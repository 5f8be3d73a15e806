//! # Document Staging
//!
//! The embedded artifact is written to a temporary file while it is hashed
//! and published. [`StagedDocument`] owns the file and deletes it on drop,
//! so every exit path (success, error, or a cancelled future) cleans up.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use docseal_core::{sha256_reader, ContentDigest};
use tempfile::NamedTempFile;

use crate::document::Document;
use crate::error::DocumentError;

/// Directory in which documents are staged.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Use `dir` for staging, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// A `docseal` directory under the system temp dir.
    pub fn in_temp_dir() -> Result<Self, DocumentError> {
        Self::new(std::env::temp_dir().join("docseal"))
    }

    /// The staging directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `document` to a fresh file named after its media type.
    pub fn stage(&self, document: &Document) -> Result<StagedDocument, DocumentError> {
        let suffix = format!(".{}", document.media_type().extension());
        let mut file = tempfile::Builder::new()
            .prefix("docseal-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        file.write_all(document.bytes())?;
        file.as_file().sync_data()?;
        tracing::debug!(path = %file.path().display(), size = document.bytes().len(), "staged document");
        Ok(StagedDocument {
            file,
            len: document.bytes().len() as u64,
        })
    }
}

/// A document on disk, removed when dropped.
#[derive(Debug)]
pub struct StagedDocument {
    file: NamedTempFile,
    len: u64,
}

impl StagedDocument {
    /// Location of the staged file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the staged file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stream the staged bytes through SHA-256.
    pub fn digest(&self) -> Result<ContentDigest, DocumentError> {
        Ok(sha256_reader(self.reopen()?)?)
    }

    /// Read the staged bytes back.
    pub fn read(&self) -> Result<Vec<u8>, DocumentError> {
        let mut buf = Vec::with_capacity(self.len as usize);
        self.reopen()?.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn reopen(&self) -> Result<File, DocumentError> {
        let mut file = self.file.reopen()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }
}
