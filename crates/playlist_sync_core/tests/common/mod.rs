#![allow(dead_code)]

use std::sync::Once;

use playlist_sync_core::{
    update, AppState, ChannelId, Effect, JobSnapshot, Msg, PlaylistCreated, TransportCommand,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sync_logging::initialize_for_tests);
}

pub fn snapshot(json: serde_json::Value) -> JobSnapshot {
    serde_json::from_value(json).expect("valid snapshot")
}

/// Drives a fresh state through a configured server and a submitted
/// playlist, returning the state and the channel the push transport opened.
pub fn started_session(job_id: &str, track_count: usize) -> (AppState, ChannelId) {
    let (state, _) = update(AppState::new(), Msg::Started { playlist_url: None });
    let (state, _) = update(state, Msg::ConfigChecked { configured: true });
    let (state, _) = update(state, Msg::UrlSubmitted("https://open.spotify.com/playlist/abc".into()));
    let (mut state, effects) = update(
        state,
        Msg::PlaylistStarted(PlaylistCreated {
            job_id: job_id.into(),
            playlist_name: "Road Trip".into(),
            track_count,
        }),
    );
    state.consume_dirty();
    state.take_patches();
    let channel = opened_channel(&effects).expect("push opened");
    (state, channel)
}

pub fn opened_channel(effects: &[Effect]) -> Option<ChannelId> {
    effects.iter().find_map(|effect| match effect {
        Effect::Transport(TransportCommand::OpenPush { channel, .. }) => Some(*channel),
        _ => None,
    })
}

pub fn transport_commands(effects: Vec<Effect>) -> Vec<TransportCommand> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Transport(command) => Some(command),
            _ => None,
        })
        .collect()
}
