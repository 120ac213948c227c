use std::mem;

use crate::reconcile::ViewPatch;
use crate::view_model::{AppViewModel, Notice, SessionView};
use crate::{ChannelId, Effect, JobId, JobSession, JobSnapshot, TransportMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    #[default]
    NotStarted,
    Pending,
    Done,
}

/// Outcome of the startup `GET /api/config` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerCheck {
    #[default]
    Pending,
    Configured,
    NotConfigured,
    /// The check itself failed; startup will not go further on its own.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    session: Option<JobSession>,
    next_channel: u64,
    pending_url: Option<String>,
    server_check: ServerCheck,
    discovery: DiscoveryState,
    submitting: bool,
    notice: Option<Notice>,
    patches: Vec<ViewPatch>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let session = self.session.as_ref();
        AppViewModel {
            session: session.map(|session| SessionView {
                job_id: session.job_id().to_string(),
                playlist_name: session.playlist_name().map(ToOwned::to_owned),
                status: session.status().cloned(),
                track_count_text: session.track_count_text(),
            }),
            rows: session
                .map(|session| session.reconciler().rows().to_vec())
                .unwrap_or_default(),
            stats: session.map(JobSession::stats).unwrap_or_default(),
            controls: session
                .map(|session| *session.controls())
                .unwrap_or_default(),
            transport: self.transport_mode(),
            notice: self.notice.clone(),
            submitting: self.submitting,
            dirty: self.dirty,
        }
    }

    pub fn session(&self) -> Option<&JobSession> {
        self.session.as_ref()
    }

    pub fn transport_mode(&self) -> TransportMode {
        self.session
            .as_ref()
            .map(|session| session.transport().mode())
            .unwrap_or_default()
    }

    /// `None` until the server answered the config check.
    pub fn configured(&self) -> Option<bool> {
        match self.server_check {
            ServerCheck::Configured => Some(true),
            ServerCheck::NotConfigured => Some(false),
            ServerCheck::Pending | ServerCheck::Unreachable => None,
        }
    }

    pub fn server_check(&self) -> ServerCheck {
        self.server_check
    }

    pub fn discovery(&self) -> DiscoveryState {
        self.discovery
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        mem::take(&mut self.dirty)
    }

    /// Drains the row patches accumulated since the last call.
    pub fn take_patches(&mut self) -> Vec<ViewPatch> {
        mem::take(&mut self.patches)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_pending_url(&mut self, url: Option<String>) {
        self.pending_url = url;
    }

    pub(crate) fn take_pending_url(&mut self) -> Option<String> {
        self.pending_url.take()
    }

    pub(crate) fn set_server_check(&mut self, check: ServerCheck) {
        self.server_check = check;
    }

    /// Returns false when discovery already ran.
    pub(crate) fn begin_discovery(&mut self) -> bool {
        if self.discovery != DiscoveryState::NotStarted {
            return false;
        }
        self.discovery = DiscoveryState::Pending;
        true
    }

    /// Returns false for a discovery result nobody asked for.
    pub(crate) fn finish_discovery(&mut self) -> bool {
        if self.discovery != DiscoveryState::Pending {
            return false;
        }
        self.discovery = DiscoveryState::Done;
        true
    }

    pub(crate) fn begin_submission(&mut self) {
        self.submitting = true;
        self.mark_dirty();
    }

    pub(crate) fn finish_submission(&mut self) {
        self.submitting = false;
        self.mark_dirty();
    }

    fn allocate_channel(&mut self) -> ChannelId {
        self.next_channel += 1;
        ChannelId(self.next_channel)
    }

    /// Replaces the current session. The old transport is closed before the
    /// new one opens, so no stale channel can deliver into the new session.
    pub(crate) fn start_session(
        &mut self,
        job_id: JobId,
        playlist_name: Option<String>,
        announced_tracks: Option<usize>,
    ) -> Vec<Effect> {
        let replaced = self.session.is_some();
        let mut effects = self.teardown_session();
        if replaced {
            self.patches.push(ViewPatch::Rebuild(Vec::new()));
        }

        let channel = self.allocate_channel();
        let mut session = JobSession::new(job_id, playlist_name, announced_tracks);
        effects.extend(
            session
                .transport_mut()
                .open(channel)
                .into_iter()
                .map(Effect::Transport),
        );
        self.session = Some(session);
        self.mark_dirty();
        effects
    }

    /// Re-arms the current session's push channel under a fresh channel id.
    pub(crate) fn reopen_transport(&mut self) -> Vec<Effect> {
        let channel = self.allocate_channel();
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        self.dirty = true;
        session
            .transport_mut()
            .open(channel)
            .into_iter()
            .map(Effect::Transport)
            .collect()
    }

    pub(crate) fn teardown_session(&mut self) -> Vec<Effect> {
        match self.session.take() {
            Some(mut session) => {
                self.mark_dirty();
                session
                    .transport_mut()
                    .close()
                    .into_iter()
                    .map(Effect::Transport)
                    .collect()
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut JobSession> {
        self.session.as_mut()
    }

    pub(crate) fn session_accepts_push(&self, channel: ChannelId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.transport().accepts_push(channel))
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: &JobSnapshot) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let patches = session.apply_snapshot(snapshot);
        self.patches.extend(patches);
        self.mark_dirty();
    }
}
