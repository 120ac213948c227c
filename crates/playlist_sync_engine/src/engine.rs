use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use playlist_sync_core::{ChannelId, ControlCommand, FetchKind, JobId, TransportCommand};
use sync_logging::{sync_debug, sync_error, sync_info, sync_warn};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::api::{ApiSettings, JobApi, ReqwestJobApi};
use crate::push::{PushConnector, WsPushConnector};
use crate::{ApiError, EngineEvent, PushEvent};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll_interval: Duration,
    /// Delay before the single corrective fetch after a push close.
    pub fallback_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            poll_interval: Duration::from_secs(2),
            fallback_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    CheckConfig,
    SubmitPlaylist { url: String },
    ListJobs,
    Transport(TransportCommand),
    Control { job_id: JobId, command: ControlCommand },
}

/// Runs engine commands on a background tokio runtime and hands events back.
///
/// Dropping the handle stops the engine thread, which cancels every task
/// still running.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let api = ReqwestJobApi::new(settings.api.clone())?;
        let push = WsPushConnector::new(api.base_url().clone());
        Ok(Self::with_backends(settings, Arc::new(api), Arc::new(push)))
    }

    pub fn with_backends(
        settings: EngineSettings,
        api: Arc<dyn JobApi>,
        push: Arc<dyn PushConnector>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let backend = Backend {
            api,
            push,
            poll_interval: settings.poll_interval,
            fallback_delay: settings.fallback_delay,
            events: event_tx,
        };

        thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    sync_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut tasks = TaskRegistry::default();
            while let Ok(command) = cmd_rx.recv() {
                tasks.prune();
                handle_command(&runtime, &mut tasks, &backend, command);
            }
            tasks.abort_all();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn execute(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            sync_error!("Engine thread is gone; command dropped");
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

#[derive(Clone)]
struct Backend {
    api: Arc<dyn JobApi>,
    push: Arc<dyn PushConnector>,
    poll_interval: Duration,
    fallback_delay: Duration,
    events: mpsc::Sender<EngineEvent>,
}

impl Backend {
    /// Returns false once nobody listens any more.
    fn emit(&self, event: EngineEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Transport tasks per channel. Push and poll work are tracked apart so a
/// failing push leg can be closed while its channel moves on to polling.
#[derive(Default)]
struct TaskRegistry {
    push: HashMap<ChannelId, JoinHandle<()>>,
    poll: HashMap<ChannelId, Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    fn prune(&mut self) {
        self.push.retain(|_, task| !task.is_finished());
        self.poll.retain(|_, tasks| {
            tasks.retain(|task| !task.is_finished());
            !tasks.is_empty()
        });
    }

    fn set_push(&mut self, channel: ChannelId, task: JoinHandle<()>) {
        if let Some(previous) = self.push.insert(channel, task) {
            previous.abort();
        }
    }

    fn close_push(&mut self, channel: ChannelId) {
        if let Some(task) = self.push.remove(&channel) {
            task.abort();
        }
    }

    fn add_poll(&mut self, channel: ChannelId, task: JoinHandle<()>) {
        self.poll.entry(channel).or_default().push(task);
    }

    fn stop_polling(&mut self, channel: ChannelId) {
        for task in self.poll.remove(&channel).unwrap_or_default() {
            task.abort();
        }
    }

    fn abort_all(&mut self) {
        for (_, task) in self.push.drain() {
            task.abort();
        }
        for (_, tasks) in self.poll.drain() {
            tasks.iter().for_each(JoinHandle::abort);
        }
    }
}

fn handle_command(
    runtime: &Runtime,
    tasks: &mut TaskRegistry,
    backend: &Backend,
    command: EngineCommand,
) {
    let backend = backend.clone();
    match command {
        EngineCommand::CheckConfig => {
            runtime.spawn(async move {
                let result = backend.api.config_status().await;
                backend.emit(EngineEvent::ConfigChecked(result));
            });
        }
        EngineCommand::SubmitPlaylist { url } => {
            sync_info!("Submitting playlist url_len={} url={}", url.len(), url);
            runtime.spawn(async move {
                let result = backend.api.submit_playlist(&url).await;
                backend.emit(EngineEvent::PlaylistSubmitted(result));
            });
        }
        EngineCommand::ListJobs => {
            runtime.spawn(async move {
                let result = backend.api.jobs().await;
                backend.emit(EngineEvent::JobsListed(result));
            });
        }
        EngineCommand::Control { job_id, command } => {
            sync_info!("Sending {} for job {}", command, job_id);
            runtime.spawn(async move {
                let result = backend.api.control(&job_id, command).await;
                backend.emit(EngineEvent::ControlCompleted {
                    job_id,
                    command,
                    result,
                });
            });
        }
        EngineCommand::Transport(command) => handle_transport(runtime, tasks, backend, command),
    }
}

fn handle_transport(
    runtime: &Runtime,
    tasks: &mut TaskRegistry,
    backend: Backend,
    command: TransportCommand,
) {
    match command {
        TransportCommand::OpenPush { channel, job_id } => {
            sync_debug!("Opening push channel {} for job {}", channel, job_id);
            tasks.set_push(channel, runtime.spawn(run_push(backend, channel, job_id)));
        }
        TransportCommand::ClosePush { channel } => {
            sync_debug!("Closing push channel {}", channel);
            tasks.close_push(channel);
        }
        TransportCommand::FetchOnce { channel, job_id } => {
            tasks.add_poll(channel, runtime.spawn(run_correction(backend, channel, job_id)));
        }
        TransportCommand::StartPolling { channel, job_id } => {
            sync_info!(
                "Polling job {} every {:?} on {}",
                job_id,
                backend.poll_interval,
                channel
            );
            tasks.add_poll(channel, runtime.spawn(run_poll(backend, channel, job_id)));
        }
        TransportCommand::StopPolling { channel } => {
            sync_debug!("Stopping poll on {}", channel);
            tasks.stop_polling(channel);
        }
    }
}

async fn run_push(backend: Backend, channel: ChannelId, job_id: JobId) {
    let mut stream = match backend.push.connect(&job_id).await {
        Ok(stream) => stream,
        Err(err) => {
            sync_warn!("Push channel {} for job {} failed to open: {}", channel, job_id, err);
            backend.emit(EngineEvent::Push {
                channel,
                event: PushEvent::Failed(err.to_string()),
            });
            return;
        }
    };

    while let Some(event) = stream.next().await {
        let last = matches!(event, PushEvent::Closed | PushEvent::Failed(_));
        if let PushEvent::Failed(reason) = &event {
            sync_warn!("Push channel {} failed: {}", channel, reason);
        }
        if !backend.emit(EngineEvent::Push { channel, event }) || last {
            return;
        }
    }

    sync_debug!("Push channel {} ended", channel);
    backend.emit(EngineEvent::Push {
        channel,
        event: PushEvent::Closed,
    });
}

async fn run_correction(backend: Backend, channel: ChannelId, job_id: JobId) {
    tokio::time::sleep(backend.fallback_delay).await;
    let result = backend.api.job(&job_id).await;
    if let Err(err) = &result {
        sync_warn!("Corrective fetch for job {} failed: {}", job_id, err);
    }
    backend.emit(EngineEvent::Fetched {
        channel,
        kind: FetchKind::Correction,
        result,
    });
}

async fn run_poll(backend: Backend, channel: ChannelId, job_id: JobId) {
    loop {
        tokio::time::sleep(backend.poll_interval).await;
        let result = backend.api.job(&job_id).await;
        let terminal = matches!(&result, Ok(snapshot) if snapshot.status.is_terminal());
        if let Err(err) = &result {
            // Swallowed; the next tick retries.
            sync_warn!("Poll for job {} failed: {}", job_id, err);
        }
        let delivered = backend.emit(EngineEvent::Fetched {
            channel,
            kind: FetchKind::Poll,
            result,
        });
        if !delivered || terminal {
            sync_debug!("Poll on {} finished (terminal={})", channel, terminal);
            return;
        }
    }
}
