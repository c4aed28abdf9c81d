//! Export control: file naming and the client-local save-as download.
//!
//! A download binds the payload to a short-lived object URL, dispatches a
//! click on it, then revokes the URL. `ObjectUrlGuard` ties revocation to
//! scope so the URL is released on every path, including a failing click.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::errors::DownloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(format!("unknown export format '{other}' (expected pdf or docx)")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File naming
// ────────────────────────────────────────────────────────────────────────────

/// Collapses each whitespace run into a single `_`.
pub fn sanitize_file_component(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `cover_letter_<company>_<position>.<ext>`
pub fn export_file_name(company: &str, position: &str, format: ExportFormat) -> String {
    format!(
        "cover_letter_{}_{}.{}",
        sanitize_file_component(company),
        sanitize_file_component(position),
        format.extension()
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Download sink
// ────────────────────────────────────────────────────────────────────────────

/// Handle to a payload staged for download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(pub String);

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where downloads land. Mirrors the browser's object-URL API.
pub trait DownloadSink: Send + Sync {
    fn create_object_url(&self, payload: Bytes, mime_type: &str) -> Result<ObjectUrl, DownloadError>;

    /// Triggers the download of `url` under `file_name`; returns where it went.
    fn click(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError>;

    fn revoke_object_url(&self, url: &ObjectUrl);
}

/// Revokes its object URL when dropped.
struct ObjectUrlGuard<'a, S: DownloadSink + ?Sized> {
    sink: &'a S,
    url: ObjectUrl,
}

impl<S: DownloadSink + ?Sized> Drop for ObjectUrlGuard<'_, S> {
    fn drop(&mut self) {
        self.sink.revoke_object_url(&self.url);
    }
}

/// Saves `payload` as `file_name` through `sink`.
///
/// The object URL lives exactly as long as the click: it is revoked right
/// after the click is dispatched, whether the click succeeded or not.
pub fn save_download<S: DownloadSink + ?Sized>(
    sink: &S,
    payload: Bytes,
    mime_type: &str,
    file_name: &str,
) -> Result<PathBuf, DownloadError> {
    let url = sink.create_object_url(payload, mime_type)?;
    let guard = ObjectUrlGuard { sink, url };
    let saved = sink.click(&guard.url, file_name);
    drop(guard);
    saved
}

/// Saves downloads into a directory on disk.
///
/// Payloads are staged as temp files in the target directory; revoking the
/// object URL deletes the staged copy. Name collisions get a ` (n)` suffix.
pub struct FsDownloadSink {
    dir: PathBuf,
    staged: Mutex<HashMap<ObjectUrl, NamedTempFile>>,
}

impl FsDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    fn unique_target(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        let path = Path::new(file_name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
        let ext = path.extension().and_then(|e| e.to_str());
        (1..)
            .map(|n| match ext {
                Some(ext) => self.dir.join(format!("{stem} ({n}).{ext}")),
                None => self.dir.join(format!("{stem} ({n})")),
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for FsDownloadSink {
    fn create_object_url(&self, payload: Bytes, mime_type: &str) -> Result<ObjectUrl, DownloadError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(&payload)?;
        staged.flush()?;

        let url = ObjectUrl(format!("blob:{}", Uuid::new_v4()));
        debug!("Staged {} bytes ({}) as {}", payload.len(), mime_type, url);
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), staged);
        Ok(url)
    }

    fn click(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError> {
        let staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        let source = staged
            .get(url)
            .ok_or_else(|| DownloadError::UnknownObjectUrl(url.0.clone()))?;
        let target = self.unique_target(file_name);
        std::fs::copy(source.path(), &target)?;
        debug!("Downloaded {} to {}", url, target.display());
        Ok(target)
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        // Dropping the temp file removes the staged copy
        let removed = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
        if removed.is_some() {
            debug!("Revoked {}", url);
        }
    }
}
