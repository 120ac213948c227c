use std::fmt;

use serde::Deserialize;

pub type JobId = String;

/// Identity of one `open` of a transport. Deliveries tagged with an older
/// channel belong to a cancelled transport and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Overall job status as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Running,
    Stopped,
    Complete,
    /// Anything the server sends that we do not know about.
    Other(String),
}

impl JobStatus {
    /// `complete` and `stopped` mean nothing changes without a user action.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Stopped | JobStatus::Complete)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Stopped => "stopped",
            JobStatus::Complete => "complete",
            JobStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "running" => JobStatus::Running,
            "stopped" => JobStatus::Stopped,
            "complete" => JobStatus::Complete,
            _ => JobStatus::Other(raw),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        JobStatus::from(raw.to_string())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-track status. The server drives every transition; the client only
/// renders what it receives, in any order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum TrackStatus {
    #[default]
    Pending,
    Searching,
    Found,
    Downloading,
    Tagging,
    Complete,
    Failed,
    NotFound,
    Other(String),
}

impl TrackStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackStatus::Complete | TrackStatus::Failed | TrackStatus::NotFound
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TrackStatus::Failed | TrackStatus::NotFound)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TrackStatus::Pending => "pending",
            TrackStatus::Searching => "searching",
            TrackStatus::Found => "found",
            TrackStatus::Downloading => "downloading",
            TrackStatus::Tagging => "tagging",
            TrackStatus::Complete => "complete",
            TrackStatus::Failed => "failed",
            TrackStatus::NotFound => "not_found",
            TrackStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for TrackStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => TrackStatus::Pending,
            "searching" => TrackStatus::Searching,
            "found" => TrackStatus::Found,
            "downloading" => TrackStatus::Downloading,
            "tagging" => TrackStatus::Tagging,
            "complete" => TrackStatus::Complete,
            "failed" => TrackStatus::Failed,
            "not_found" => TrackStatus::NotFound,
            _ => TrackStatus::Other(raw),
        }
    }
}

impl From<&str> for TrackStatus {
    fn from(raw: &str) -> Self {
        TrackStatus::from(raw.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TrackJob {
    #[serde(default)]
    pub track: TrackInfo,
    #[serde(default)]
    pub status: TrackStatus,
    #[serde(default)]
    pub progress_pct: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Full job state as delivered by either channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub job_id: JobId,
    #[serde(default)]
    pub playlist_name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub tracks: Vec<TrackJob>,
}

/// One entry of the server's job list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub playlist_name: String,
    #[serde(default)]
    pub track_count: usize,
    #[serde(default)]
    pub completed: Option<usize>,
    #[serde(default)]
    pub failed: Option<usize>,
}

/// Acknowledgement of a playlist submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistCreated {
    pub job_id: JobId,
    #[serde(default)]
    pub playlist_name: String,
    #[serde(default)]
    pub track_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Stop,
    Resume,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Stop => write!(f, "stop"),
            ControlCommand::Resume => write!(f, "resume"),
        }
    }
}

/// Which fetch produced a snapshot: the one-shot correction after a push
/// close, or a regular poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Correction,
    Poll,
}

/// A failed request as seen by the core: only the server-provided text,
/// if any, matters for what the user is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(detail: Option<String>) -> Self {
        Self { detail }
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn message_or(&self, generic: &str) -> String {
        self.detail
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(generic)
            .to_string()
    }
}
