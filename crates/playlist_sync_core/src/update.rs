use crate::session::select_relevant_job;
use crate::state::ServerCheck;
use crate::view_model::Notice;
use crate::{AppState, ControlCommand, Effect, Msg, TransportMode};

const MISSING_URL: &str = "Please enter a playlist URL";
const NOT_CONFIGURED: &str = "Server is not configured yet. Finish setup at /settings first.";
const SERVER_UNREACHABLE: &str = "Could not reach the server";
const SUBMIT_FAILED: &str = "Failed to start download";
const STOP_FAILED: &str = "Failed to stop job";
const RESUME_FAILED: &str = "Failed to resume job";
const JOB_ERROR: &str = "Job failed";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started { playlist_url } => {
            state.set_pending_url(playlist_url.and_then(|url| non_empty(&url)));
            vec![Effect::CheckConfig]
        }
        Msg::ConfigChecked { configured } => {
            state.set_server_check(if configured {
                ServerCheck::Configured
            } else {
                ServerCheck::NotConfigured
            });
            if !configured {
                state.take_pending_url();
                state.set_notice(Notice::info(NOT_CONFIGURED));
                Vec::new()
            } else if let Some(url) = state.take_pending_url() {
                submit(&mut state, &url)
            } else if state.session().is_none() && state.begin_discovery() {
                vec![Effect::DiscoverJobs]
            } else {
                Vec::new()
            }
        }
        Msg::ConfigCheckFailed(failure) => {
            state.set_server_check(ServerCheck::Unreachable);
            // Nothing will submit it once the check has failed.
            state.take_pending_url();
            state.set_notice(Notice::error(failure.message_or(SERVER_UNREACHABLE)));
            Vec::new()
        }
        Msg::UrlSubmitted(raw) => submit(&mut state, &raw),
        Msg::PlaylistStarted(created) => {
            state.finish_submission();
            state.clear_notice();
            let name = Some(created.playlist_name).filter(|name| !name.is_empty());
            state.start_session(created.job_id, name, Some(created.track_count))
        }
        Msg::PlaylistRejected(failure) => {
            state.finish_submission();
            state.set_notice(Notice::error(failure.message_or(SUBMIT_FAILED)));
            Vec::new()
        }
        Msg::JobsListed(jobs) => {
            // A job the user started while discovery was in flight wins.
            if !state.finish_discovery() || state.session().is_some() || state.is_submitting() {
                Vec::new()
            } else {
                match select_relevant_job(&jobs) {
                    Some(job) => {
                        let name = Some(job.playlist_name.clone()).filter(|name| !name.is_empty());
                        state.start_session(job.job_id.clone(), name, Some(job.track_count))
                    }
                    None => Vec::new(),
                }
            }
        }
        Msg::JobsListFailed(_) => {
            state.finish_discovery();
            Vec::new()
        }
        Msg::JobSelected { job_id } => {
            let already_tracking = state.session().is_some_and(|session| {
                session.job_id() == job_id && session.transport().mode() != TransportMode::Idle
            });
            if already_tracking {
                Vec::new()
            } else {
                state.start_session(job_id, None, None)
            }
        }
        Msg::PushSnapshot { channel, snapshot } => {
            if state.session_accepts_push(channel) {
                state.apply_snapshot(&snapshot);
            }
            Vec::new()
        }
        Msg::PushJobError { channel, message } => {
            if state.session_accepts_push(channel) {
                let text = if message.trim().is_empty() {
                    JOB_ERROR.to_string()
                } else {
                    message
                };
                state.set_notice(Notice::error(text));
            }
            Vec::new()
        }
        Msg::PushClosed { channel } => transport_effects(&mut state, |session| {
            session.transport_mut().on_push_closed(channel)
        }),
        Msg::PushFailed { channel, .. } => transport_effects(&mut state, |session| {
            session.transport_mut().on_push_failed(channel)
        }),
        Msg::FetchCompleted {
            channel,
            kind,
            result,
        } => {
            let Some(session) = state.session_mut() else {
                return (state, Vec::new());
            };
            let status = result.as_ref().ok().map(|snapshot| &snapshot.status);
            let verdict = session.transport_mut().on_fetch(channel, kind, status);
            if verdict.apply {
                if let Ok(snapshot) = &result {
                    state.apply_snapshot(snapshot);
                }
            }
            if !verdict.commands.is_empty() {
                state.mark_dirty();
            }
            verdict.commands.into_iter().map(Effect::Transport).collect()
        }
        Msg::StopClicked => control_clicked(&mut state, ControlCommand::Stop),
        Msg::ResumeClicked => control_clicked(&mut state, ControlCommand::Resume),
        Msg::ControlCompleted {
            job_id,
            command,
            result,
        } => {
            let Some(session) = state
                .session_mut()
                .filter(|session| session.job_id() == job_id)
            else {
                return (state, Vec::new());
            };
            let succeeded = result.is_ok();
            match command {
                ControlCommand::Stop => session.controls_mut().stop_settled(succeeded),
                ControlCommand::Resume => session.controls_mut().resume_settled(succeeded),
            }
            state.mark_dirty();

            match (command, result) {
                (ControlCommand::Stop, Ok(())) => Vec::new(),
                (ControlCommand::Resume, Ok(())) => {
                    state.clear_notice();
                    // Tracking stopped on the terminal `stopped` state; start it again.
                    state.reopen_transport()
                }
                (ControlCommand::Stop, Err(failure)) => {
                    state.set_notice(Notice::error(failure.message_or(STOP_FAILED)));
                    Vec::new()
                }
                (ControlCommand::Resume, Err(failure)) => {
                    state.set_notice(Notice::error(failure.message_or(RESUME_FAILED)));
                    Vec::new()
                }
            }
        }
        Msg::Teardown => state.teardown_session(),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, raw: &str) -> Vec<Effect> {
    if state.is_submitting() {
        return Vec::new();
    }
    let Some(url) = non_empty(raw) else {
        state.set_notice(Notice::error(MISSING_URL));
        return Vec::new();
    };
    state.clear_notice();
    state.begin_submission();
    vec![Effect::SubmitPlaylist { url }]
}

fn control_clicked(state: &mut AppState, command: ControlCommand) -> Vec<Effect> {
    let Some(session) = state.session_mut() else {
        return Vec::new();
    };
    let started = match command {
        ControlCommand::Stop => session.controls_mut().begin_stop(),
        ControlCommand::Resume => session.controls_mut().begin_resume(),
    };
    if !started {
        return Vec::new();
    }
    let job_id = session.job_id().to_string();
    state.mark_dirty();
    vec![Effect::SendControl { job_id, command }]
}

fn transport_effects(
    state: &mut AppState,
    transition: impl FnOnce(&mut crate::JobSession) -> Vec<crate::TransportCommand>,
) -> Vec<Effect> {
    let Some(session) = state.session_mut() else {
        return Vec::new();
    };
    let commands = transition(session);
    if !commands.is_empty() {
        state.mark_dirty();
    }
    commands.into_iter().map(Effect::Transport).collect()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
