//! Front-end configuration: an optional RON file overridden by flags.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use playlist_sync_engine::{ApiSettings, EngineSettings};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "playlist_sync.ron";

#[derive(Debug, Parser)]
#[command(
    name = "playlist_sync",
    about = "Follow a playlist download job from the terminal"
)]
pub struct Cli {
    /// Playlist URL to submit at startup.
    pub playlist_url: Option<String>,
    /// Base URL of the job server.
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Write logs to this file instead of the terminal (both with `--verbose`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Debug-level logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub fallback_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            server_url: engine.api.base_url,
            poll_interval_ms: millis(engine.poll_interval),
            fallback_delay_ms: millis(engine.fallback_delay),
            request_timeout_ms: millis(engine.api.request_timeout),
            log_file: None,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {:?}", path))
            }
        };
        ron::from_str(&text).with_context(|| format!("failed to parse config {:?}", path))
    }

    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(server) = &cli.server {
            self.server_url = server.clone();
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = Some(log_file.clone());
        }
        self.verbose |= cli.verbose;
        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        EngineSettings {
            api: ApiSettings {
                base_url: self.server_url.clone(),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                ..defaults.api
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            fallback_delay: Duration::from_millis(self.fallback_delay_ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
