use crate::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordance {
    pub visible: bool,
    pub enabled: bool,
}

impl Affordance {
    pub const HIDDEN: Affordance = Affordance {
        visible: false,
        enabled: false,
    };
    pub const ACTIVE: Affordance = Affordance {
        visible: true,
        enabled: true,
    };

    pub fn is_actionable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Visibility and enablement of the stop/resume actions.
///
/// Status decides visibility. An in-flight command keeps its own action
/// disabled until the server acknowledges or rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub stop: Affordance,
    pub resume: Affordance,
    stop_pending: bool,
    resume_pending: bool,
    /// The server accepted a stop; the job keeps reporting `running` until
    /// its worker notices.
    stop_acknowledged: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_status(&mut self, status: &JobStatus) {
        match status {
            JobStatus::Running => {
                self.stop = if self.stop_acknowledged {
                    Affordance {
                        visible: true,
                        enabled: false,
                    }
                } else {
                    Affordance::ACTIVE
                };
                self.resume = Affordance::HIDDEN;
            }
            JobStatus::Stopped => {
                self.stop = Affordance::HIDDEN;
                self.resume = Affordance::ACTIVE;
            }
            JobStatus::Complete => {
                self.stop = Affordance::HIDDEN;
                self.resume = Affordance::HIDDEN;
            }
            JobStatus::Other(_) => {}
        }
        if !matches!(status, JobStatus::Running | JobStatus::Other(_)) {
            self.stop_acknowledged = false;
        }
        self.hold_pending();
    }

    /// Returns false when stop is not currently actionable.
    pub fn begin_stop(&mut self) -> bool {
        if !self.stop.is_actionable() || self.stop_pending {
            return false;
        }
        self.stop_pending = true;
        self.stop.enabled = false;
        true
    }

    /// A successful stop keeps the action disabled until the job leaves
    /// `running`.
    pub fn stop_settled(&mut self, succeeded: bool) {
        self.stop_pending = false;
        if succeeded {
            self.stop_acknowledged = self.stop.visible;
        } else if self.stop.visible {
            self.stop.enabled = true;
        }
    }

    pub fn begin_resume(&mut self) -> bool {
        if !self.resume.is_actionable() || self.resume_pending {
            return false;
        }
        self.resume_pending = true;
        self.resume.enabled = false;
        true
    }

    pub fn resume_settled(&mut self, succeeded: bool) {
        self.resume_pending = false;
        if !succeeded && self.resume.visible {
            self.resume.enabled = true;
        }
    }

    fn hold_pending(&mut self) {
        if self.stop_pending {
            self.stop.enabled = false;
        }
        if self.resume_pending {
            self.resume.enabled = false;
        }
    }
}
