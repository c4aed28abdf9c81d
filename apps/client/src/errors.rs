use thiserror::Error;

use crate::api_client::ApiError;

/// Failure of one user action (submit, upload, export).
///
/// Every action converts its failure into one of these, records it in page
/// state, and raises one error toast. `user_message` is the only text that
/// reaches the user; generic failures are replaced with a fallback.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file type: {0}")]
    InvalidFileType(String),

    #[error("File too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("No text could be extracted from the PDF")]
    TextNotExtractable,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Clipboard write failed: {0}")]
    Clipboard(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown object URL: {0}")]
    UnknownObjectUrl(String),
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

impl ActionError {
    /// Message shown inline and in the toast.
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Validation(msg) => msg.clone(),
            ActionError::InvalidFileType(_) => "Please select a PDF file.".to_string(),
            ActionError::FileTooLarge(_) => {
                "File is too large. Maximum size is 10MB.".to_string()
            }
            ActionError::TextNotExtractable => {
                "Text could not be extracted from the PDF. The file may be image-based.".to_string()
            }
            ActionError::Api(ApiError::Api { message, .. }) => format!("API error: {message}"),
            ActionError::Api(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            ActionError::Download(_) => {
                "The file could not be saved. Please try again.".to_string()
            }
            ActionError::Clipboard(_) => {
                "The cover letter could not be copied. Please try again.".to_string()
            }
        }
    }

    /// True for failures caught before any network call. The controller logs
    /// these at `warn`; everything else is logged at `error`.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ActionError::Validation(_)
                | ActionError::InvalidFileType(_)
                | ActionError::FileTooLarge(_)
        )
    }
}
