//! Reqwest implementation of [`VideoApi`].

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info};

use sora_models::{JobId, JobSnapshot};

use crate::api::VideoApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{CreateBody, CreateVideoRequest, Download, RemixBody, SubmitEnvelope};

/// Error bodies are read up to this many bytes.
const MAX_ERROR_BODY: usize = 4 << 20;

/// HTTP client for the video generation API.
pub struct SoraClient {
    http: Client,
    config: ClientConfig,
}

impl SoraClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        // No overall timeout here: downloads are bounded by the caller's deadline.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("sora-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn job_path(id: &JobId) -> String {
        format!("/videos/{}", urlencoding::encode(id.as_str()))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.config.api_key)
    }

    /// Send a bounded request and turn non-2xx into [`ClientError::Api`].
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = self
            .authorized(builder)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        check_status(response).await
    }

    async fn submit(&self, builder: RequestBuilder) -> ClientResult<JobId> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        let envelope: SubmitEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::protocol(format!("invalid job envelope: {}", e)))?;

        if let Some(error) = envelope.error.filter(|e| e.is_set()) {
            return Err(ClientError::Rejected(error.message));
        }
        if envelope.id.trim().is_empty() {
            return Err(ClientError::MissingJobId);
        }
        Ok(JobId::from(envelope.id))
    }
}

#[async_trait]
impl VideoApi for SoraClient {
    async fn create(&self, request: CreateVideoRequest) -> ClientResult<JobId> {
        let url = self.url("/videos");
        let builder = self.http.post(&url);

        let builder = match request.input_reference {
            Some(asset) => {
                debug!(
                    filename = %asset.filename,
                    content_type = %asset.content_type,
                    bytes = asset.bytes.len(),
                    "Attaching input reference"
                );
                let part = Part::bytes(asset.bytes)
                    .file_name(asset.filename)
                    .mime_str(&asset.content_type)
                    .map_err(|e| ClientError::config(format!("invalid content type: {}", e)))?;
                let form = Form::new()
                    .text("model", request.model.as_str())
                    .text("prompt", request.prompt)
                    .text("size", request.size.as_str())
                    .text("seconds", request.seconds.as_str())
                    .part("input_reference", part);
                builder.multipart(form)
            }
            None => builder.json(&CreateBody {
                model: request.model.as_str(),
                prompt: &request.prompt,
                size: request.size.as_str(),
                seconds: request.seconds.as_str(),
            }),
        };

        let id = self.submit(builder).await?;
        info!(job_id = %id, "Video job created");
        Ok(id)
    }

    async fn remix(&self, source: &JobId, prompt: &str) -> ClientResult<JobId> {
        let url = self.url(&format!("{}/remix", Self::job_path(source)));
        let id = self
            .submit(self.http.post(&url).json(&RemixBody { prompt }))
            .await?;
        info!(job_id = %id, source = %source, "Remix job created");
        Ok(id)
    }

    async fn status(&self, id: &JobId) -> ClientResult<JobSnapshot> {
        let url = self.url(&Self::job_path(id));
        let response = self
            .send(self.http.get(&url).header("Accept", "application/json"))
            .await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::protocol(format!("invalid status envelope: {}", e)))
    }

    fn content_url(&self, id: &JobId) -> String {
        self.url(&format!("{}/content", Self::job_path(id)))
    }

    async fn download(&self, url: &str) -> ClientResult<Download> {
        let response = self.authorized(self.http.get(url)).send().await?;
        let response = check_status(response).await?;
        let content_length = response.content_length().filter(|len| *len > 0);

        debug!(url = %url, content_length = ?content_length, "Download started");
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::Transport))
            .boxed();

        Ok(Download {
            content_length,
            stream,
        })
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_error_body(response).await;
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Best-effort read of a bounded error body.
async fn read_error_body(mut response: Response) -> String {
    let mut buf = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        let room = MAX_ERROR_BODY - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() >= MAX_ERROR_BODY {
            break;
        }
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}
