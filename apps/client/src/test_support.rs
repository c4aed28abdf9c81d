//! Scripted backend and download sink shared by the unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use tokio::sync::oneshot;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::api_client::{ApiError, CoverLetterApi};
use crate::clipboard::Clipboard;
use crate::errors::DownloadError;
use crate::export::{DownloadSink, ObjectUrl};
use crate::models::{
    ExportRequest, GenerationRequest, GenerationResponse, HealthResponse, TestResponse, Tone,
};
use crate::upload::SelectedFile;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The single-result payload from the end-to-end scenario.
pub fn acme_single_response() -> GenerationResponse {
    serde_json::from_value(json!({
        "cover_letter": "Dear Hiring Manager...",
        "analysis": {
            "company_name": "Acme",
            "position_title": "Senior Backend Engineer",
            "required_experience": "5 years"
        },
        "skill_matches": [{"skill": "Go", "matched": true, "confidence": 0.92}],
        "recommendations": ["Highlight distributed systems experience"]
    }))
    .unwrap()
}

pub fn single_response(letter: &str) -> GenerationResponse {
    serde_json::from_value(json!({
        "cover_letter": letter,
        "analysis": {"company_name": "Acme", "position_title": "Engineer"},
        "skill_matches": [],
        "recommendations": []
    }))
    .unwrap()
}

pub fn batch_response(count: usize) -> GenerationResponse {
    let cycle = [Tone::Formal, Tone::Friendly, Tone::Concise];
    let letters: Vec<String> = (1..=count).map(|i| format!("Letter variant {i}")).collect();
    let tones: Vec<Tone> = (0..count).map(|i| cycle[i % cycle.len()]).collect();
    serde_json::from_value(json!({
        "letters": letters,
        "tones_used": tones,
        "analysis": {"company_name": "Acme Corp", "position_title": "Platform Engineer"},
        "skill_matches": [{"skill": "Kubernetes", "matched": false, "confidence": 0.4}],
        "missing_skills": ["Kubernetes"],
        "recommendations": []
    }))
    .unwrap()
}

pub fn api_failure(status: u16, message: &str) -> ApiError {
    ApiError::Api {
        status,
        message: message.to_string(),
    }
}

pub fn generic_failure() -> ApiError {
    ApiError::Decode(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
}

type ScriptedGenerate = (Option<oneshot::Receiver<()>>, Result<GenerationResponse, ApiError>);

/// Backend double that records every call and replays scripted results in order.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<&'static str>>,
    generate_requests: Mutex<Vec<GenerationRequest>>,
    export_requests: Mutex<Vec<ExportRequest>>,
    extract_results: Mutex<VecDeque<Result<String, ApiError>>>,
    generate_results: Mutex<VecDeque<ScriptedGenerate>>,
    export_results: Mutex<VecDeque<Result<Bytes, ApiError>>>,
}

impl MockApi {
    pub fn push_extract(&self, result: Result<String, ApiError>) {
        lock(&self.extract_results).push_back(result);
    }

    pub fn push_generate(&self, result: Result<GenerationResponse, ApiError>) {
        lock(&self.generate_results).push_back((None, result));
    }

    /// Scripts a generate result that is held back until the sender fires.
    pub fn push_gated_generate(
        &self,
        result: Result<GenerationResponse, ApiError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.generate_results).push_back((Some(rx), result));
        tx
    }

    pub fn push_export(&self, result: Result<Bytes, ApiError>) {
        lock(&self.export_results).push_back(result);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn generate_requests(&self) -> Vec<GenerationRequest> {
        lock(&self.generate_requests).clone()
    }

    pub fn export_requests(&self) -> Vec<ExportRequest> {
        lock(&self.export_requests).clone()
    }

    fn record(&self, call: &'static str) {
        lock(&self.calls).push(call);
    }

    fn unscripted(call: &str) -> ApiError {
        api_failure(599, &format!("no scripted response for {call}"))
    }
}

#[async_trait]
impl CoverLetterApi for MockApi {
    async fn test_endpoint(&self) -> Result<TestResponse, ApiError> {
        self.record("test");
        Ok(TestResponse {
            message: "Cover letter API is working!".to_string(),
            status: Some("success".to_string()),
        })
    }

    async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        self.record("health");
        Ok(HealthResponse {
            status: "healthy".to_string(),
            service: "cover-letter-generator".to_string(),
            version: None,
        })
    }

    async fn extract_cv_text(&self, _file: &SelectedFile) -> Result<String, ApiError> {
        self.record("extract");
        lock(&self.extract_results)
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("extract")))
    }

    async fn generate_cover_letter(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ApiError> {
        self.record("generate");
        lock(&self.generate_requests).push(request.clone());
        let scripted = lock(&self.generate_results).pop_front();
        let Some((gate, result)) = scripted else {
            return Err(Self::unscripted("generate"));
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }

    async fn export_pdf(&self, request: &ExportRequest) -> Result<Bytes, ApiError> {
        self.record("export_pdf");
        lock(&self.export_requests).push(request.clone());
        lock(&self.export_results)
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("export_pdf")))
    }

    async fn export_docx(&self, request: &ExportRequest) -> Result<Bytes, ApiError> {
        self.record("export_docx");
        lock(&self.export_requests).push(request.clone());
        lock(&self.export_results)
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("export_docx")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Create(ObjectUrl),
    Click(ObjectUrl, String),
    Revoke(ObjectUrl),
}

#[derive(Debug, Default, Clone, Copy)]
enum ClickMode {
    #[default]
    Succeed,
    Fail,
    Panic,
}

/// Download sink that only records the object-URL lifecycle.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    next_id: AtomicUsize,
    click_mode: ClickMode,
}

impl RecordingSink {
    pub fn failing_clicks() -> Self {
        Self {
            click_mode: ClickMode::Fail,
            ..Self::default()
        }
    }

    pub fn panicking_clicks() -> Self {
        Self {
            click_mode: ClickMode::Panic,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        lock(&self.events).clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|e| matches!(e, SinkEvent::Create(_)))
    }

    pub fn revoke_count(&self) -> usize {
        self.count(|e| matches!(e, SinkEvent::Revoke(_)))
    }

    pub fn clicks(&self) -> Vec<(ObjectUrl, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Click(url, name) => Some((url, name)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        lock(&self.events).iter().filter(|e| pred(e)).count()
    }
}

impl DownloadSink for RecordingSink {
    fn create_object_url(&self, _payload: Bytes, _mime_type: &str) -> Result<ObjectUrl, DownloadError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let url = ObjectUrl(format!("blob:test-{id}"));
        lock(&self.events).push(SinkEvent::Create(url.clone()));
        Ok(url)
    }

    fn click(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError> {
        lock(&self.events).push(SinkEvent::Click(url.clone(), file_name.to_string()));
        match self.click_mode {
            ClickMode::Succeed => Ok(PathBuf::from(file_name)),
            ClickMode::Fail => Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only download directory",
            ))),
            ClickMode::Panic => panic!("synthetic click failure"),
        }
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        lock(&self.events).push(SinkEvent::Revoke(url.clone()));
    }
}

/// Clipboard that keeps every copied text.
#[derive(Default)]
pub struct RecordingClipboard {
    copied: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn copied(&self) -> Vec<String> {
        lock(&self.copied).clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> std::io::Result<()> {
        if self.fail {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "terminal closed",
            ));
        }
        lock(&self.copied).push(text.to_string());
        Ok(())
    }
}

/// Tracing events seen by a `counting_subscriber`, by level.
#[derive(Clone, Default)]
pub struct EventCounts {
    total: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
    warnings: Arc<AtomicUsize>,
}

impl EventCounts {
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }
}

struct CountingLayer(EventCounts);

impl<S: Subscriber> Layer<S> for CountingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.0.total.fetch_add(1, Ordering::SeqCst);
        match *event.metadata().level() {
            Level::ERROR => self.0.errors.fetch_add(1, Ordering::SeqCst),
            Level::WARN => self.0.warnings.fetch_add(1, Ordering::SeqCst),
            _ => 0,
        };
    }
}

/// A subscriber that only counts events; install it with `set_default`.
pub fn counting_subscriber() -> (impl Subscriber + Send + Sync, EventCounts) {
    let counts = EventCounts::default();
    let subscriber = tracing_subscriber::registry().with(CountingLayer(counts.clone()));
    (subscriber, counts)
}
