use std::mem;
use std::time::Duration;

use playlist_sync_core::{update, AppState, Effect, Msg};
use sync_logging::{sync_debug, sync_warn};

use crate::{EngineCommand, EngineEvent, EngineHandle, PushEvent};

/// Single writer of the sync state: feeds engine events and user messages
/// through `update` one at a time and hands the resulting effects to the
/// engine.
pub struct SyncRunner {
    state: AppState,
    engine: EngineHandle,
}

impl SyncRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            state: AppState::new(),
            engine,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.engine.execute(effect_to_command(effect));
        }
    }

    /// Waits up to `timeout` for one engine event and applies it.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        match self.engine.recv_timeout(timeout) {
            Some(event) => {
                self.dispatch(event_to_msg(event));
                true
            }
            None => false,
        }
    }

    /// Applies every event that is already waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.engine.try_recv() {
            self.dispatch(event_to_msg(event));
            applied += 1;
        }
        applied
    }
}

pub fn effect_to_command(effect: Effect) -> EngineCommand {
    match effect {
        Effect::CheckConfig => EngineCommand::CheckConfig,
        Effect::SubmitPlaylist { url } => EngineCommand::SubmitPlaylist { url },
        Effect::DiscoverJobs => EngineCommand::ListJobs,
        Effect::Transport(command) => EngineCommand::Transport(command),
        Effect::SendControl { job_id, command } => EngineCommand::Control { job_id, command },
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ConfigChecked(Ok(status)) => Msg::ConfigChecked {
            configured: status.configured,
        },
        EngineEvent::ConfigChecked(Err(err)) => {
            sync_warn!("Config check failed: {}", err);
            Msg::ConfigCheckFailed(err.to_failure())
        }
        EngineEvent::PlaylistSubmitted(Ok(created)) => Msg::PlaylistStarted(created),
        EngineEvent::PlaylistSubmitted(Err(err)) => {
            sync_warn!("Playlist submission failed: {}", err);
            Msg::PlaylistRejected(err.to_failure())
        }
        EngineEvent::JobsListed(Ok(jobs)) => Msg::JobsListed(jobs),
        EngineEvent::JobsListed(Err(err)) => {
            sync_warn!("Job discovery failed: {}", err);
            Msg::JobsListFailed(err.to_failure())
        }
        EngineEvent::Push { channel, event } => match event {
            PushEvent::Snapshot(snapshot) => Msg::PushSnapshot { channel, snapshot },
            PushEvent::JobError(message) => Msg::PushJobError { channel, message },
            PushEvent::Closed => {
                sync_debug!("Push channel {} closed", channel);
                Msg::PushClosed { channel }
            }
            PushEvent::Failed(reason) => Msg::PushFailed { channel, reason },
        },
        EngineEvent::Fetched {
            channel,
            kind,
            result,
        } => Msg::FetchCompleted {
            channel,
            kind,
            result: result.map_err(|err| err.to_failure()),
        },
        EngineEvent::ControlCompleted {
            job_id,
            command,
            result,
        } => {
            if let Err(err) = &result {
                sync_warn!("{} for job {} failed: {}", command, job_id, err);
            }
            Msg::ControlCompleted {
                job_id,
                command,
                result: result.map_err(|err| err.to_failure()),
            }
        }
    }
}
