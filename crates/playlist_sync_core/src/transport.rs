//! Push-first, poll-fallback transport as an explicit state machine.
//!
//! The manager does no IO. Each transition returns the commands the engine
//! has to run, and every delivery from the engine is checked against the
//! current phase and channel before the session applies it. Push and poll
//! can never be active at the same time because they are variants of the
//! same phase.
use std::mem;

use crate::{ChannelId, FetchKind, JobId, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Idle,
    Push,
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    OpenPush { channel: ChannelId, job_id: JobId },
    ClosePush { channel: ChannelId },
    /// Single delayed fetch after the push channel closed.
    FetchOnce { channel: ChannelId, job_id: JobId },
    StartPolling { channel: ChannelId, job_id: JobId },
    /// Cancels the poll timer and any pending one-shot fetch.
    StopPolling { channel: ChannelId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Push {
        channel: ChannelId,
    },
    Poll {
        channel: ChannelId,
        awaiting_correction: bool,
    },
}

/// Outcome of a fetch delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchVerdict {
    /// Whether the fetched snapshot should be applied to the view.
    pub apply: bool,
    pub commands: Vec<TransportCommand>,
}

impl FetchVerdict {
    fn rejected() -> Self {
        Self {
            apply: false,
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportManager {
    job_id: JobId,
    phase: Phase,
}

impl TransportManager {
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            phase: Phase::Idle,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn mode(&self) -> TransportMode {
        match self.phase {
            Phase::Idle => TransportMode::Idle,
            Phase::Push { .. } => TransportMode::Push,
            Phase::Poll { .. } => TransportMode::Poll,
        }
    }

    pub fn channel(&self) -> Option<ChannelId> {
        match self.phase {
            Phase::Idle => None,
            Phase::Push { channel } | Phase::Poll { channel, .. } => Some(channel),
        }
    }

    /// Opens the push channel, closing whatever was active first.
    pub fn open(&mut self, channel: ChannelId) -> Vec<TransportCommand> {
        let mut commands = self.close();
        self.phase = Phase::Push { channel };
        commands.push(TransportCommand::OpenPush {
            channel,
            job_id: self.job_id.clone(),
        });
        commands
    }

    /// Idempotent teardown.
    pub fn close(&mut self) -> Vec<TransportCommand> {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Vec::new(),
            Phase::Push { channel } => vec![TransportCommand::ClosePush { channel }],
            Phase::Poll { channel, .. } => vec![TransportCommand::StopPolling { channel }],
        }
    }

    pub fn accepts_push(&self, channel: ChannelId) -> bool {
        matches!(self.phase, Phase::Push { channel: active } if active == channel)
    }

    /// Clean close or network drop: one delayed correction, then polling.
    pub fn on_push_closed(&mut self, channel: ChannelId) -> Vec<TransportCommand> {
        if !self.accepts_push(channel) {
            return Vec::new();
        }
        self.phase = Phase::Poll {
            channel,
            awaiting_correction: true,
        };
        vec![TransportCommand::FetchOnce {
            channel,
            job_id: self.job_id.clone(),
        }]
    }

    /// Transport error: close now and poll without delay.
    pub fn on_push_failed(&mut self, channel: ChannelId) -> Vec<TransportCommand> {
        if !self.accepts_push(channel) {
            return Vec::new();
        }
        self.phase = Phase::Poll {
            channel,
            awaiting_correction: false,
        };
        vec![
            TransportCommand::ClosePush { channel },
            TransportCommand::StartPolling {
                channel,
                job_id: self.job_id.clone(),
            },
        ]
    }

    /// `status` is the fetched snapshot's status, or `None` when the fetch
    /// failed.
    pub fn on_fetch(
        &mut self,
        channel: ChannelId,
        kind: FetchKind,
        status: Option<&JobStatus>,
    ) -> FetchVerdict {
        let Phase::Poll {
            channel: active,
            awaiting_correction,
        } = self.phase
        else {
            return FetchVerdict::rejected();
        };
        if active != channel {
            return FetchVerdict::rejected();
        }

        let terminal = status.is_some_and(JobStatus::is_terminal);
        let commands = match kind {
            FetchKind::Correction => {
                if !awaiting_correction {
                    return FetchVerdict::rejected();
                }
                if terminal {
                    self.phase = Phase::Idle;
                    Vec::new()
                } else {
                    self.phase = Phase::Poll {
                        channel,
                        awaiting_correction: false,
                    };
                    vec![TransportCommand::StartPolling {
                        channel,
                        job_id: self.job_id.clone(),
                    }]
                }
            }
            FetchKind::Poll => {
                if terminal {
                    self.phase = Phase::Idle;
                    vec![TransportCommand::StopPolling { channel }]
                } else {
                    Vec::new()
                }
            }
        };

        FetchVerdict {
            apply: status.is_some(),
            commands,
        }
    }
}
