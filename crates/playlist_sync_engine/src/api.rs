use std::time::Duration;

use futures_util::StreamExt;
use playlist_sync_core::{ControlCommand, JobSnapshot, JobSummary, PlaylistCreated};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ApiError, ConfigStatus};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1337".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

/// The job server's HTTP surface.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn config_status(&self) -> Result<ConfigStatus, ApiError>;

    async fn submit_playlist(&self, url: &str) -> Result<PlaylistCreated, ApiError>;

    async fn job(&self, job_id: &str) -> Result<JobSnapshot, ApiError>;

    async fn jobs(&self) -> Result<Vec<JobSummary>, ApiError>;

    async fn control(&self, job_id: &str, command: ControlCommand) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    base: Url,
    client: reqwest::Client,
    max_bytes: u64,
}

#[derive(Serialize)]
struct PlaylistRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            base,
            client,
            max_bytes: settings.max_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        join_segments(&self.base, segments).ok_or_else(|| ApiError::InvalidUrl(self.base.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = self.read_body(response).await?;
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        Ok(body)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let too_large = ApiError::TooLarge {
            max_bytes: self.max_bytes,
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(too_large);
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(too_large);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let body = self.send(self.client.get(url)).await?;
        decode(&body)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn config_status(&self) -> Result<ConfigStatus, ApiError> {
        self.get_json(&["api", "config"]).await
    }

    async fn submit_playlist(&self, url: &str) -> Result<PlaylistCreated, ApiError> {
        let endpoint = self.endpoint(&["api", "playlist"])?;
        let payload = serde_json::to_vec(&PlaylistRequest { url })
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let body = self.send(request).await?;
        decode(&body)
    }

    async fn job(&self, job_id: &str) -> Result<JobSnapshot, ApiError> {
        self.get_json(&["api", "jobs", job_id]).await
    }

    async fn jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        self.get_json(&["api", "jobs"]).await
    }

    async fn control(&self, job_id: &str, command: ControlCommand) -> Result<(), ApiError> {
        let action = match command {
            ControlCommand::Stop => "stop",
            ControlCommand::Resume => "resume",
        };
        let endpoint = self.endpoint(&["api", "jobs", job_id, action])?;
        self.send(self.client.post(endpoint)).await?;
        Ok(())
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(format!("unsupported base url {url}")));
    }
    Ok(url)
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}

fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}
