//! Multipart form extraction.
//!
//! Every upload route takes the document in a `certificate` file field,
//! plus optional text fields.

use std::collections::HashMap;

use axum::extract::Multipart;
use docseal_document::Document;

use crate::error::AppError;

/// Name of the file field.
pub const FILE_FIELD: &str = "certificate";

/// A parsed multipart form.
#[derive(Debug)]
pub struct Upload {
    document: Document,
    fields: HashMap<String, String>,
}

impl Upload {
    /// Read the whole form. Fails with 400 when the file field is missing.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut document = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                document = Some(Document::from_upload(&file_name, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                fields.insert(name, value);
            }
        }

        let document = document.ok_or_else(|| AppError::BadRequest("file not found".into()))?;
        Ok(Self { document, fields })
    }

    /// The uploaded document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Take the uploaded document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// A required text field, trimmed.
    pub fn field(&self, name: &str) -> Result<&str, AppError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    /// Reject anything but a PDF before doing any work on it.
    pub fn require_pdf(&self) -> Result<(), AppError> {
        if self.document.is_pdf() {
            Ok(())
        } else {
            Err(AppError::BadRequest("file extension must be .pdf".into()))
        }
    }
}
