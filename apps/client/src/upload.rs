//! CV upload control: local file validation and the upload state lifecycle.
//!
//! Validation is synchronous and always runs before any network call. The
//! extraction call itself is issued by the page controller.

use std::path::Path;

use bytes::Bytes;

use crate::errors::ActionError;

pub const PDF_MIME: &str = "application/pdf";
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A file picked by the user, held fully in memory.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = mime_for_file_name(&file_name);
        Ok(Self::new(file_name, mime_type, Bytes::from(bytes)))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn mime_for_file_name(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".pdf") {
        PDF_MIME
    } else {
        "application/octet-stream"
    }
}

/// Rejects anything that is not a PDF of at most 10 MiB.
pub fn validate_selection(file: &SelectedFile) -> Result<(), ActionError> {
    if file.mime_type != PDF_MIME {
        return Err(ActionError::InvalidFileType(file.mime_type.clone()));
    }
    if file.size() > MAX_UPLOAD_BYTES {
        return Err(ActionError::FileTooLarge(file.size()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub file_name: Option<String>,
    /// Hosts must disable re-selection while this is set.
    pub in_progress: bool,
    pub extracted_text: String,
    pub last_error: Option<String>,
}

impl UploadState {
    /// A new selection wipes whatever the previous one left behind.
    pub fn select(&mut self, file_name: &str) {
        *self = UploadState {
            file_name: Some(file_name.to_string()),
            ..UploadState::default()
        };
    }

    pub fn begin(&mut self) {
        self.in_progress = true;
        self.last_error = None;
    }

    /// Applies the extraction result. Blank text is a soft failure: the file
    /// name is forgotten so the control returns to its empty state.
    pub fn complete(&mut self, text: String) -> Result<String, ActionError> {
        self.in_progress = false;
        if text.trim().is_empty() {
            self.file_name = None;
            self.extracted_text.clear();
            return Err(ActionError::TextNotExtractable);
        }
        self.extracted_text = text.clone();
        self.last_error = None;
        Ok(text)
    }

    pub fn fail(&mut self, message: String) {
        self.in_progress = false;
        self.last_error = Some(message);
    }
}
