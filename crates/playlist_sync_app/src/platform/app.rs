use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use playlist_sync_core::{AppState, DiscoveryState, Msg, ServerCheck, TransportMode};
use playlist_sync_engine::{EngineHandle, SyncRunner};
use sync_logging::{sync_debug, sync_info};

use super::config::AppConfig;
use super::render::{render_patch, render_view};

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Input {
    Msg(Msg),
    Quit,
}

/// Maps one line typed by the user to an input. Blank lines are ignored.
pub(crate) fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let input = match line {
        "" => return None,
        "stop" => Input::Msg(Msg::StopClicked),
        "resume" => Input::Msg(Msg::ResumeClicked),
        "quit" | "exit" | "q" => Input::Quit,
        _ => match line.strip_prefix("job ") {
            Some(job_id) if !job_id.trim().is_empty() => Input::Msg(Msg::JobSelected {
                job_id: job_id.trim().to_string(),
            }),
            _ => Input::Msg(Msg::UrlSubmitted(line.to_string())),
        },
    };
    Some(input)
}

/// True once there is nothing left to follow: startup settled and the
/// current job, if any, reached a state the transport no longer tracks.
pub(crate) fn nothing_left_to_follow(state: &AppState) -> bool {
    if state.server_check() == ServerCheck::Pending || state.is_submitting() {
        return false;
    }
    if state.discovery() == DiscoveryState::Pending {
        return false;
    }
    state.transport_mode() == TransportMode::Idle
        && state
            .session()
            .and_then(|session| session.status())
            .is_none_or(|status| status.is_terminal())
}

pub fn run(config: &AppConfig, playlist_url: Option<String>) -> anyhow::Result<()> {
    let settings = config.engine_settings();
    sync_info!("Following jobs on {}", settings.api.base_url);
    let engine = EngineHandle::new(settings).context("failed to start the sync engine")?;
    let mut runner = SyncRunner::new(engine);

    let (input_tx, input_rx) = mpsc::channel();
    spawn_stdin_reader(input_tx);

    let mut out = io::stdout();
    runner.dispatch(Msg::Started { playlist_url });

    let mut stdin_open = true;
    'main: loop {
        while stdin_open {
            match input_rx.try_recv() {
                Ok(Input::Msg(msg)) => runner.dispatch(msg),
                Ok(Input::Quit) => break 'main,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    sync_debug!("stdin closed");
                    stdin_open = false;
                }
            }
        }

        runner.pump(PUMP_INTERVAL);
        runner.drain();
        render_changes(runner.state_mut(), &mut out)?;

        if !stdin_open && nothing_left_to_follow(runner.state()) {
            break;
        }
    }

    runner.dispatch(Msg::Teardown);
    render_changes(runner.state_mut(), &mut out)?;
    sync_info!("Stopped following");
    Ok(())
}

fn render_changes(state: &mut AppState, out: &mut impl Write) -> io::Result<()> {
    let patches = state.take_patches();
    let dirty = state.consume_dirty();
    for line in patches.iter().flat_map(render_patch) {
        writeln!(out, "{line}")?;
    }
    if dirty || !patches.is_empty() {
        for line in render_view(&state.view()) {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(input) = parse_input(&line) {
                let quit = input == Input::Quit;
                if tx.send(input).is_err() || quit {
                    break;
                }
            }
        }
    });
}
