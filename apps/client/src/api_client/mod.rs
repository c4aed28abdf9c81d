//! API Client: the single point of entry for all cover-letter backend calls.
//!
//! No other module talks HTTP. Every call is one attempt with no retries and
//! no explicit timeout; retry policy belongs to the caller.
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::export::ExportFormat;
use crate::models::{
    ExportRequest, ExtractedText, GenerationRequest, GenerationResponse, HealthResponse,
    TestResponse,
};
use crate::upload::SelectedFile;

const TEST_ENDPOINT: &str = "/api/test";
const HEALTH_ENDPOINT: &str = "/health";
const EXTRACT_CV_ENDPOINT: &str = "/api/extract-cv-text";
const GENERATE_ENDPOINT: &str = "/api/generate-cover-letter";
const EXPORT_PDF_ENDPOINT: &str = "/api/export/pdf";
const EXPORT_DOCX_ENDPOINT: &str = "/api/export/docx";

/// Multipart field carrying the uploaded CV.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The backend surface the page controller depends on.
///
/// `ApiClient` is the HTTP implementation; tests substitute a scripted one.
#[async_trait]
pub trait CoverLetterApi: Send + Sync {
    async fn test_endpoint(&self) -> Result<TestResponse, ApiError>;

    async fn health_check(&self) -> Result<HealthResponse, ApiError>;

    /// Returns the extracted text verbatim, blank or not.
    async fn extract_cv_text(&self, file: &SelectedFile) -> Result<String, ApiError>;

    async fn generate_cover_letter(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ApiError>;

    async fn export_pdf(&self, request: &ExportRequest) -> Result<Bytes, ApiError>;

    async fn export_docx(&self, request: &ExportRequest) -> Result<Bytes, ApiError>;

    async fn export(
        &self,
        format: ExportFormat,
        request: &ExportRequest,
    ) -> Result<Bytes, ApiError> {
        match format {
            ExportFormat::Pdf => self.export_pdf(request).await,
            ExportFormat::Docx => self.export_docx(request).await,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Sends the request once and turns any non-2xx status into `ApiError::Api`.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body, status);
        warn!("Backend returned {}: {}", status, message);
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        let response = self.send(self.client.get(&url)).await?;
        read_json(response).await
    }

    async fn post_for_bytes(
        &self,
        endpoint: &str,
        request: &ExportRequest,
    ) -> Result<Bytes, ApiError> {
        let url = self.url(endpoint);
        debug!("POST {} ({} chars of letter)", url, request.letter.len());
        let response = self.send(self.client.post(&url).json(request)).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl CoverLetterApi for ApiClient {
    async fn test_endpoint(&self) -> Result<TestResponse, ApiError> {
        self.get_json(TEST_ENDPOINT).await
    }

    async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        self.get_json(HEALTH_ENDPOINT).await
    }

    async fn extract_cv_text(&self, file: &SelectedFile) -> Result<String, ApiError> {
        let url = self.url(EXTRACT_CV_ENDPOINT);
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!("POST {} ({}, {} bytes)", url, file.file_name, file.size());
        let response = self.send(self.client.post(&url).multipart(form)).await?;
        let extracted: ExtractedText = read_json(response).await?;
        Ok(extracted.text)
    }

    async fn generate_cover_letter(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ApiError> {
        let url = self.url(GENERATE_ENDPOINT);
        debug!(
            "POST {} (tone={}, variants={})",
            url, request.tone, request.variants
        );
        let response = self.send(self.client.post(&url).json(request)).await?;
        read_json(response).await
    }

    async fn export_pdf(&self, request: &ExportRequest) -> Result<Bytes, ApiError> {
        self.post_for_bytes(EXPORT_PDF_ENDPOINT, request).await
    }

    async fn export_docx(&self, request: &ExportRequest) -> Result<Bytes, ApiError> {
        self.post_for_bytes(EXPORT_DOCX_ENDPOINT, request).await
    }
}

/// Reads the whole body first so a malformed payload surfaces as `Decode`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Pulls a human-readable message out of an error body.
///
/// Understands FastAPI `detail` (string or validation list), `message`, and
/// `error.message`; falls back to the raw body, then the status reason.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| message_from_json(&v));

    let message = match from_json {
        Some(msg) => msg,
        None => body.trim().to_string(),
    };

    if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        message
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    if let Some(detail) = value.get("detail") {
        match detail {
            Value::String(s) => return Some(s.clone()),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                if !joined.is_empty() {
                    return Some(joined);
                }
            }
            _ => {}
        }
    }
    if let Some(msg) = value.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(err) => err
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
        None => None,
    }
}
