//! Playlist sync engine: job server IO and effect execution.
mod api;
mod engine;
mod push;
mod runner;
mod types;

pub use api::{ApiSettings, JobApi, ReqwestJobApi};
pub use engine::{EngineCommand, EngineHandle, EngineSettings};
pub use push::{decode_push_payload, PushConnector, PushStream, WsPushConnector};
pub use runner::{effect_to_command, event_to_msg, SyncRunner};
pub use types::{ApiError, ConfigStatus, EngineEvent, PushError, PushEvent};
