#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use playlist_sync_engine::{
    ApiSettings, EngineHandle, EngineSettings, JobApi, PushConnector, PushError, PushEvent,
    PushStream, ReqwestJobApi, SyncRunner,
};
use tokio::sync::mpsc;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sync_logging::initialize_for_tests);
}

pub fn fast_settings(base_url: &str) -> EngineSettings {
    EngineSettings {
        api: ApiSettings {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(2),
            ..ApiSettings::default()
        },
        poll_interval: Duration::from_millis(40),
        fallback_delay: Duration::from_millis(20),
    }
}

/// Sender side of one scripted push connection.
pub type PushFeed = mpsc::UnboundedSender<PushEvent>;

enum Script {
    Open(mpsc::UnboundedReceiver<PushEvent>),
    Refuse(String),
}

/// Push connector whose connections are fed by the test.
#[derive(Default)]
pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    connected: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a connection and returns the feed for its messages.
    pub fn expect_connection(&self) -> PushFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().unwrap().push_back(Script::Open(rx));
        tx
    }

    pub fn refuse_next(&self, reason: &str) {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::Refuse(reason.to_string()));
    }

    pub fn connected_jobs(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PushConnector for ScriptedConnector {
    async fn connect(&self, job_id: &str) -> Result<PushStream, PushError> {
        self.connected.lock().unwrap().push(job_id.to_string());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Open(rx)) => Ok(futures_util::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            })
            .boxed()),
            Some(Script::Refuse(reason)) => Err(PushError::Connect(reason)),
            None => Err(PushError::Connect("no scripted connection".into())),
        }
    }
}

pub fn runner_for(server_uri: &str, connector: Arc<ScriptedConnector>) -> SyncRunner {
    let settings = fast_settings(server_uri);
    let api: Arc<dyn JobApi> =
        Arc::new(ReqwestJobApi::new(settings.api.clone()).expect("valid api settings"));
    SyncRunner::new(EngineHandle::with_backends(settings, api, connector))
}

/// Pumps engine events until `done` holds or the deadline passes.
pub fn pump_until(runner: &mut SyncRunner, mut done: impl FnMut(&SyncRunner) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(runner) {
            return true;
        }
        runner.pump(Duration::from_millis(20));
    }
    done(runner)
}

/// Keeps pumping for `window`, for asserting that nothing else happens.
pub fn pump_for(runner: &mut SyncRunner, window: Duration) {
    let deadline = Instant::now() + window;
    while Instant::now() < deadline {
        runner.pump(Duration::from_millis(10));
    }
}

pub fn snapshot(json: serde_json::Value) -> playlist_sync_core::JobSnapshot {
    serde_json::from_value(json).expect("valid snapshot")
}
