//! Terminal front end: configuration, logging setup and the render loop.

mod app;
mod config;
mod render;

use log::LevelFilter;
use sync_logging::LogDestination;

use config::AppConfig;
pub use config::Cli;

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.config)?.with_overrides(&cli);

    let (destination, level) = log_setup(&config);
    sync_logging::initialize(destination, level);

    app::run(&config, cli.playlist_url)
}

/// A log file takes the log; `verbose` mirrors it to the terminal too.
/// Without a file the terminal is shared with the job view, so only
/// warnings reach it unless `verbose` is set.
fn log_setup(config: &AppConfig) -> (LogDestination, LevelFilter) {
    match (&config.log_file, config.verbose) {
        (Some(path), true) => (LogDestination::Both(path.clone()), LevelFilter::Debug),
        (Some(path), false) => (LogDestination::File(path.clone()), LevelFilter::Info),
        (None, true) => (LogDestination::Terminal, LevelFilter::Debug),
        (None, false) => (LogDestination::Terminal, LevelFilter::Warn),
    }
}
