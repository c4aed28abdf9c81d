//! Page controller: owns page state and runs the user actions.
//!
//! The three actions are independent state machines and may overlap. Each
//! action runs validate → call → apply in order, catches its own failure, and
//! turns it into one state update plus one toast before returning it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::api_client::CoverLetterApi;
use crate::clipboard::Clipboard;
use crate::config::{Config, ResponsePolicy};
use crate::errors::{ActionError, DownloadError};
use crate::export::{export_file_name, save_download, DownloadSink, ExportFormat};
use crate::models::{ExportRequest, GenerationResponse};
use crate::notification::Notifier;
use crate::state::{FormState, GenerationPhase, PageState};
use crate::upload::{validate_selection, SelectedFile};

const FALLBACK_COMPANY: &str = "Company";
const FALLBACK_POSITION: &str = "Position";

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// Another export held the shared busy flag.
    Ignored,
}

pub struct PageController {
    api: Arc<dyn CoverLetterApi>,
    sink: Arc<dyn DownloadSink>,
    state: Arc<Mutex<PageState>>,
    notifier: Notifier,
    policy: ResponsePolicy,
    clipboard: Option<Arc<dyn Clipboard>>,
}

impl PageController {
    pub fn new(
        api: Arc<dyn CoverLetterApi>,
        sink: Arc<dyn DownloadSink>,
        notifier: Notifier,
        policy: ResponsePolicy,
    ) -> Self {
        Self {
            api,
            sink,
            state: Arc::new(Mutex::new(PageState::default())),
            notifier,
            policy,
            clipboard: None,
        }
    }

    /// Enables `copy_letter`.
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn from_config(
        api: Arc<dyn CoverLetterApi>,
        sink: Arc<dyn DownloadSink>,
        config: &Config,
    ) -> Self {
        Self::new(
            api,
            sink,
            Notifier::new(config.toast_duration),
            config.response_policy,
        )
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> PageState {
        self.lock().clone()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn edit_form(&self, edit: impl FnOnce(&mut FormState)) {
        edit(&mut self.lock().form);
    }

    /// Returns generation to idle, clearing the result and error slots.
    pub fn reset_generation(&self) {
        let mut state = self.lock();
        state.generation = GenerationPhase::Idle;
        state.result = None;
        state.error = None;
    }

    // ────────────────────────────────────────────────────────────────────────
    // Generate
    // ────────────────────────────────────────────────────────────────────────

    pub async fn submit(&self) -> Result<(), ActionError> {
        // Every submit supersedes whatever is still in flight, even one that
        // fails validation
        let (validated, request_id) = {
            let mut state = self.lock();
            state.latest_request_id += 1;
            (state.form.to_request(), state.latest_request_id)
        };
        let request = match validated {
            Ok(request) => request,
            Err(e) => {
                self.fail_generation(&e);
                return Err(e);
            }
        };

        // Stale results must never stay visible while a new request runs
        {
            let mut state = self.lock();
            state.result = None;
            state.error = None;
            state.generation = GenerationPhase::Submitting;
        }
        info!(
            "Submitting generation request #{} (tone={}, variants={})",
            request_id, request.tone, request.variants
        );

        let outcome = self.api.generate_cover_letter(&request).await;

        if self.policy == ResponsePolicy::LatestRequestOnly {
            let latest = self.lock().latest_request_id;
            if request_id != latest {
                debug!(
                    "Dropping response for superseded request #{} (latest is #{})",
                    request_id, latest
                );
                return outcome.map(|_| ()).map_err(ActionError::from);
            }
        }

        match outcome {
            Ok(response) => {
                let message = match &response {
                    GenerationResponse::Single(_) => {
                        "Cover letter generated successfully!".to_string()
                    }
                    GenerationResponse::Batch(batch) => {
                        if batch.letters.len() != request.variants as usize {
                            warn!(
                                "Requested {} variants but received {}",
                                request.variants,
                                batch.letters.len()
                            );
                        }
                        format!("{} cover letter variants generated!", batch.letters.len())
                    }
                };
                {
                    let mut state = self.lock();
                    state.result = Some(response);
                    state.error = None;
                    state.generation = GenerationPhase::Succeeded;
                }
                self.notifier.success(message);
                Ok(())
            }
            Err(e) => {
                let err = ActionError::from(e);
                self.fail_generation(&err);
                Err(err)
            }
        }
    }

    /// A failure replaces any result, so the page never shows both.
    fn fail_generation(&self, err: &ActionError) {
        log_failure("Generation", err);
        let message = err.user_message();
        {
            let mut state = self.lock();
            state.result = None;
            state.error = Some(message.clone());
            state.generation = GenerationPhase::Failed;
        }
        self.notifier.error(message);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Upload
    // ────────────────────────────────────────────────────────────────────────

    /// Validates the file locally, then extracts its text into the CV field.
    pub async fn upload_cv(&self, file: SelectedFile) -> Result<String, ActionError> {
        self.lock().upload.select(&file.file_name);

        if let Err(e) = validate_selection(&file) {
            log_failure("CV upload", &e);
            let message = e.user_message();
            {
                let mut state = self.lock();
                state.upload.fail(message.clone());
                state.upload.file_name = None;
            }
            self.notifier.error(message);
            return Err(e);
        }

        self.lock().upload.begin();
        info!("Extracting CV text from {} ({} bytes)", file.file_name, file.size());

        let outcome = self.api.extract_cv_text(&file).await;

        let applied = {
            let mut state = self.lock();
            match outcome {
                Ok(text) => match state.upload.complete(text) {
                    Ok(text) => {
                        state.form.cv_text = text.clone();
                        Ok(text)
                    }
                    Err(soft) => {
                        state.upload.last_error = Some(soft.user_message());
                        Err(soft)
                    }
                },
                Err(e) => {
                    let err = ActionError::from(e);
                    state.upload.fail(err.user_message());
                    Err(err)
                }
            }
        };

        match &applied {
            Ok(_) => {
                self.notifier
                    .success(format!("CV text extracted from {}", file.file_name));
            }
            Err(e) => {
                log_failure("CV upload", e);
                let message = self
                    .lock()
                    .upload
                    .last_error
                    .clone()
                    .unwrap_or_else(|| e.user_message());
                self.notifier.error(message);
            }
        }
        applied
    }

    // ────────────────────────────────────────────────────────────────────────
    // Export
    // ────────────────────────────────────────────────────────────────────────

    /// Exports one letter. `variant` indexes the batch view; use 0 for a single result.
    pub async fn export(
        &self,
        format: ExportFormat,
        variant: usize,
    ) -> Result<ExportOutcome, ActionError> {
        let request = {
            let mut state = self.lock();
            if state.is_exporting {
                warn!("Export already in progress; ignoring {} export", format);
                return Ok(ExportOutcome::Ignored);
            }
            match build_export_request(&state, variant) {
                Ok(request) => {
                    state.is_exporting = true;
                    request
                }
                Err(e) => {
                    drop(state);
                    log_failure("Export", &e);
                    self.notifier.error(e.user_message());
                    return Err(e);
                }
            }
        };

        let file_name = export_file_name(&request.company_name, &request.job_title, format);
        info!("Exporting variant {} as {} ({})", variant, format, file_name);

        let outcome = match self.api.export(format, &request).await {
            Ok(payload) => {
                let sink = Arc::clone(&self.sink);
                let name = file_name.clone();
                tokio::task::spawn_blocking(move || {
                    save_download(sink.as_ref(), payload, format.mime_type(), &name)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(DownloadError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e,
                    )))
                })
                .map_err(ActionError::from)
            }
            Err(e) => Err(ActionError::from(e)),
        };

        self.lock().is_exporting = false;

        match outcome {
            Ok(path) => {
                self.notifier
                    .success(format!("{format} downloaded: {file_name}"));
                Ok(ExportOutcome::Saved(path))
            }
            Err(e) => {
                log_failure("Export", &e);
                self.notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Copy
    // ────────────────────────────────────────────────────────────────────────

    /// Copies one letter to the clipboard. `variant` indexes like `export`.
    pub fn copy_letter(&self, variant: usize) -> Result<(), ActionError> {
        let copied = self.copy_selected(variant);
        match &copied {
            Ok(()) => {
                self.notifier.success("Cover letter copied to clipboard!");
            }
            Err(e) => {
                log_failure("Copy", e);
                self.notifier.error(e.user_message());
            }
        }
        copied
    }

    fn copy_selected(&self, variant: usize) -> Result<(), ActionError> {
        let clipboard = self.clipboard.as_ref().ok_or_else(|| {
            ActionError::Validation("Clipboard is not available".to_string())
        })?;
        let letter = {
            let state = self.lock();
            select_letter(&state, variant)?.1.to_string()
        };
        debug!("Copying variant {} ({} chars)", variant, letter.len());
        clipboard.set_text(&letter).map_err(ActionError::Clipboard)
    }
}

/// Logs a failed action once, at the boundary that caught it.
fn log_failure(action: &str, err: &ActionError) {
    if err.is_local() {
        warn!("{} rejected: {}", action, err);
    } else {
        error!("{} failed: {:?}", action, err);
    }
}

fn select_letter(
    state: &PageState,
    variant: usize,
) -> Result<(&GenerationResponse, &str), ActionError> {
    let result = state.result.as_ref().ok_or_else(|| {
        ActionError::Validation("Generate a cover letter first".to_string())
    })?;
    let letter = result.letter(variant).ok_or_else(|| {
        ActionError::Validation(format!("There is no cover letter variant {}", variant + 1))
    })?;
    Ok((result, letter))
}

fn build_export_request(state: &PageState, variant: usize) -> Result<ExportRequest, ActionError> {
    let (result, letter) = select_letter(state, variant)?;
    let analysis = result.analysis();
    let company = pick(&state.form.company_name, &analysis.company_name, FALLBACK_COMPANY);
    let position = pick(&state.form.position_title, &analysis.position_title, FALLBACK_POSITION);

    Ok(ExportRequest {
        letter: letter.to_string(),
        job_title: position,
        company_name: company,
    })
}

/// First non-blank of the user's override, the backend's analysis, the fallback.
fn pick(user: &Option<String>, analysed: &Option<String>, fallback: &str) -> String {
    [user, analysed]
        .into_iter()
        .filter_map(|v| v.as_deref().map(str::trim))
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
