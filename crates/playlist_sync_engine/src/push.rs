use futures_util::stream::BoxStream;
use futures_util::{future, StreamExt};
use playlist_sync_core::JobSnapshot;
use serde::Deserialize;
use sync_logging::{sync_debug, sync_warn};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

use crate::api::join_segments;
use crate::{PushError, PushEvent};

pub type PushStream = BoxStream<'static, PushEvent>;

/// Opens the per-job push channel.
#[async_trait::async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, job_id: &str) -> Result<PushStream, PushError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PushPayload {
    Error { error: String },
    Snapshot(JobSnapshot),
}

/// Decodes one push message: either a snapshot or a server-side job error.
pub fn decode_push_payload(text: &str) -> Result<PushEvent, serde_json::Error> {
    let payload: PushPayload = serde_json::from_str(text)?;
    Ok(match payload {
        PushPayload::Error { error } => PushEvent::JobError(error),
        PushPayload::Snapshot(snapshot) => PushEvent::Snapshot(snapshot),
    })
}

/// WebSocket push channel at `<base>/ws/jobs/{id}`.
#[derive(Debug, Clone)]
pub struct WsPushConnector {
    base: Url,
}

impl WsPushConnector {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn push_url(&self, job_id: &str) -> Result<Url, PushError> {
        let invalid = || PushError::InvalidUrl(self.base.to_string());
        let mut url = join_segments(&self.base, &["ws", "jobs", job_id]).ok_or_else(invalid)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|_| invalid())?;
        Ok(url)
    }
}

#[async_trait::async_trait]
impl PushConnector for WsPushConnector {
    async fn connect(&self, job_id: &str) -> Result<PushStream, PushError> {
        let url = self.push_url(job_id)?;
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| PushError::Connect(err.to_string()))?;
        Ok(socket
            .filter_map(|frame| future::ready(decode_frame(frame)))
            .boxed())
    }
}

fn decode_frame(frame: Result<Message, WsError>) -> Option<PushEvent> {
    match frame {
        Ok(Message::Text(text)) => decode_text(&text),
        Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
            Ok(text) => decode_text(text),
            Err(_) => {
                sync_warn!("Ignoring non-UTF-8 push frame ({} bytes)", bytes.len());
                None
            }
        },
        Ok(Message::Close(_)) => Some(PushEvent::Closed),
        Ok(_) => None,
        Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Some(PushEvent::Closed),
        // A dropped connection is a closure, not a protocol failure.
        Err(
            err @ (WsError::Io(_)
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)),
        ) => {
            sync_debug!("Push connection dropped: {}", err);
            Some(PushEvent::Closed)
        }
        Err(err) => Some(PushEvent::Failed(err.to_string())),
    }
}

fn decode_text(text: &str) -> Option<PushEvent> {
    match decode_push_payload(text) {
        Ok(event) => Some(event),
        Err(err) => {
            sync_warn!("Ignoring malformed push message: {}", err);
            None
        }
    }
}
