use playlist_sync_core::{
    ChannelId, ControlCommand, Failure, FetchKind, JobId, JobSnapshot, JobSummary,
    PlaylistCreated,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {status}")]
    HttpStatus { status: u16, detail: Option<String> },
    #[error("timeout")]
    Timeout,
    #[error("response too large (max {max_bytes})")]
    TooLarge { max_bytes: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server-provided explanation, when the server sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::HttpStatus { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::new(self.detail().map(ToOwned::to_owned))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("invalid push url: {0}")]
    InvalidUrl(String),
    #[error("push connect failed: {0}")]
    Connect(String),
}

/// One delivery from a push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Snapshot(JobSnapshot),
    /// The server reported a job error instead of a snapshot.
    JobError(String),
    /// The channel closed, by the server or because the connection dropped.
    Closed,
    /// The channel failed.
    Failed(String),
}

/// Response of `GET /api/config`. Only `configured` matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConfigStatus {
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ConfigChecked(Result<ConfigStatus, ApiError>),
    PlaylistSubmitted(Result<PlaylistCreated, ApiError>),
    JobsListed(Result<Vec<JobSummary>, ApiError>),
    Push {
        channel: ChannelId,
        event: PushEvent,
    },
    Fetched {
        channel: ChannelId,
        kind: FetchKind,
        result: Result<JobSnapshot, ApiError>,
    },
    ControlCompleted {
        job_id: JobId,
        command: ControlCommand,
        result: Result<(), ApiError>,
    },
}
