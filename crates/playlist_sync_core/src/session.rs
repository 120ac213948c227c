use crate::reconcile::{Reconciler, ViewPatch};
use crate::view_model::JobStats;
use crate::{Controls, JobId, JobSnapshot, JobStatus, JobSummary, TransportManager};

/// Everything tracked for the one job currently on screen.
///
/// The session exclusively owns its transport; replacing the session
/// closes that transport first (see `AppState::start_session`).
#[derive(Debug, Clone, PartialEq)]
pub struct JobSession {
    job_id: JobId,
    playlist_name: Option<String>,
    announced_tracks: Option<usize>,
    status: Option<JobStatus>,
    transport: TransportManager,
    reconciler: Reconciler,
    controls: Controls,
}

impl JobSession {
    pub fn new(
        job_id: impl Into<JobId>,
        playlist_name: Option<String>,
        announced_tracks: Option<usize>,
    ) -> Self {
        let job_id = job_id.into();
        Self {
            transport: TransportManager::new(job_id.clone()),
            job_id,
            playlist_name,
            announced_tracks,
            status: None,
            reconciler: Reconciler::new(),
            controls: Controls::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn playlist_name(&self) -> Option<&str> {
        self.playlist_name.as_deref()
    }

    /// Last status reported by the server, if any snapshot arrived yet.
    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    pub fn transport(&self) -> &TransportManager {
        &self.transport
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn stats(&self) -> JobStats {
        self.reconciler.stats()
    }

    /// "N tracks" from the latest snapshot, or from the submission
    /// acknowledgement before any snapshot arrived.
    pub fn track_count_text(&self) -> Option<String> {
        if self.status.is_some() {
            Some(self.reconciler.stats().total_text())
        } else {
            self.announced_tracks.map(|count| format!("{count} tracks"))
        }
    }

    pub(crate) fn transport_mut(&mut self) -> &mut TransportManager {
        &mut self.transport
    }

    pub(crate) fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: &JobSnapshot) -> Vec<ViewPatch> {
        if self.playlist_name.is_none() {
            self.playlist_name = snapshot
                .playlist_name
                .clone()
                .filter(|name| !name.is_empty());
        }
        self.status = Some(snapshot.status.clone());
        let patches = self.reconciler.apply(&snapshot.tracks);
        self.controls.apply_status(&snapshot.status);
        patches
    }
}

/// Picks the job to show at startup: the first one still running or
/// stopped, otherwise the most recently created one (the server lists jobs
/// in creation order).
pub fn select_relevant_job(jobs: &[JobSummary]) -> Option<&JobSummary> {
    jobs.iter()
        .find(|job| matches!(job.status, JobStatus::Running | JobStatus::Stopped))
        .or_else(|| jobs.last())
}
