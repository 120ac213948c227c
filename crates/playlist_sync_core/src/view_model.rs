use crate::{Controls, JobId, JobStatus, TrackJob, TrackStatus, TransportMode};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub session: Option<SessionView>,
    pub rows: Vec<TrackRowView>,
    pub stats: JobStats,
    pub controls: Controls,
    pub transport: TransportMode,
    pub notice: Option<Notice>,
    pub submitting: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub job_id: JobId,
    pub playlist_name: Option<String>,
    pub status: Option<JobStatus>,
    pub track_count_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message for the user. Only things the user has to act on end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

/// One rendered track row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRowView {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub status: TrackStatus,
    pub status_label: String,
    /// Present only while the track is downloading.
    pub progress_pct: Option<f64>,
    pub tooltip: Option<String>,
}

pub fn status_label(status: &TrackStatus) -> String {
    match status {
        TrackStatus::Pending => "Pending",
        TrackStatus::Searching => "Searching",
        TrackStatus::Found => "Found",
        TrackStatus::Downloading => "Downloading",
        TrackStatus::Tagging => "Tagging",
        TrackStatus::Complete => "Complete",
        TrackStatus::Failed => "Failed",
        TrackStatus::NotFound => "Not Found",
        TrackStatus::Other(raw) => raw,
    }
    .to_string()
}

/// Renders one row. Pure: the same track job always yields the same row.
pub fn render_row(job: &TrackJob) -> TrackRowView {
    let progress_pct = match job.status {
        TrackStatus::Downloading => Some(clamp_pct(job.progress_pct.unwrap_or(0.0))),
        _ => None,
    };
    let tooltip = job
        .error
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned);

    TrackRowView {
        title: job.track.title.clone(),
        artist: job.track.artist.clone(),
        album: job.track.album.clone(),
        status: job.status.clone(),
        status_label: status_label(&job.status),
        progress_pct,
        tooltip,
    }
}

fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Aggregate progress over a snapshot's tracks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JobStats {
    pub total: usize,
    pub complete: usize,
    pub failed: usize,
    pub percent: f64,
}

impl JobStats {
    pub fn from_tracks(tracks: &[TrackJob]) -> Self {
        let total = tracks.len();
        let complete = tracks
            .iter()
            .filter(|job| job.status == TrackStatus::Complete)
            .count();
        let failed = tracks.iter().filter(|job| job.status.is_failure()).count();
        let percent = if total == 0 {
            0.0
        } else {
            (complete + failed) as f64 / total as f64 * 100.0
        };
        Self {
            total,
            complete,
            failed,
            percent,
        }
    }

    pub fn total_text(&self) -> String {
        format!("{} tracks", self.total)
    }

    pub fn complete_text(&self) -> String {
        format!("{} complete", self.complete)
    }

    /// `None` when nothing has failed, so no failed text is shown.
    pub fn failed_text(&self) -> Option<String> {
        (self.failed > 0).then(|| format!("{} failed", self.failed))
    }

    pub fn percent_text(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}
