use crate::{ControlCommand, TransportCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckConfig,
    SubmitPlaylist { url: String },
    DiscoverJobs,
    Transport(TransportCommand),
    SendControl {
        job_id: crate::JobId,
        command: ControlCommand,
    },
}
