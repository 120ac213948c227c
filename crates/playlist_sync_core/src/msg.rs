use crate::{
    ChannelId, ControlCommand, Failure, FetchKind, JobId, JobSnapshot, JobSummary,
    PlaylistCreated,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Front end is up. An explicitly requested playlist URL is submitted
    /// once the server turns out to be configured.
    Started { playlist_url: Option<String> },
    /// Result of the server configuration probe.
    ConfigChecked { configured: bool },
    ConfigCheckFailed(Failure),
    /// User submitted a playlist URL.
    UrlSubmitted(String),
    PlaylistStarted(PlaylistCreated),
    PlaylistRejected(Failure),
    /// Startup discovery result.
    JobsListed(Vec<JobSummary>),
    JobsListFailed(Failure),
    /// User asked to show an existing job.
    JobSelected { job_id: JobId },
    PushSnapshot {
        channel: ChannelId,
        snapshot: JobSnapshot,
    },
    /// Server reported a job error over the push channel.
    PushJobError { channel: ChannelId, message: String },
    PushClosed { channel: ChannelId },
    PushFailed { channel: ChannelId, reason: String },
    FetchCompleted {
        channel: ChannelId,
        kind: FetchKind,
        result: Result<JobSnapshot, Failure>,
    },
    StopClicked,
    ResumeClicked,
    ControlCompleted {
        job_id: JobId,
        command: ControlCommand,
        result: Result<(), Failure>,
    },
    /// Front end is going away.
    Teardown,
    NoOp,
}
