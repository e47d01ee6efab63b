use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use super::{
    AudioUpload, ChatReply, ChatRequest, ChatTransport, TranscriptionReply,
    TranscriptionTransport,
};
use crate::error::TransportError;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(TransportError::NotFound);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(300).collect();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: snippet,
        });
    }
    Ok(response)
}

/// `POST {base}/chat`
pub struct HttpChatTransport {
    client: Client,
    url: String,
}

impl HttpChatTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: endpoint(base_url, "chat"),
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        debug!("POST {} (thread {})", self.url, request.thread_id);
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(classify)?;
        let response = check_status(response).await?;
        response.json::<ChatReply>().await.map_err(classify)
    }
}

/// `POST {base}/transcribe` with a multipart `file` field
pub struct HttpTranscriptionTransport {
    client: Client,
    url: String,
}

impl HttpTranscriptionTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: endpoint(base_url, "transcribe"),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionTransport for HttpTranscriptionTransport {
    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionReply, TransportError> {
        info!(
            "Uploading {} ({} bytes, {}) to {}",
            upload.file_name,
            upload.bytes.len(),
            upload.mime_type,
            self.url
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;
        let response = check_status(response).await?;
        response
            .json::<TranscriptionReply>()
            .await
            .map_err(classify)
    }
}

/// `GET {base}/health`
pub async fn check_health(base_url: &str) -> Result<serde_json::Value> {
    let url = endpoint(base_url, "health");
    let response = Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?
        .error_for_status()
        .context("Health check failed")?;
    response
        .json()
        .await
        .context("Health check returned invalid JSON")
}
