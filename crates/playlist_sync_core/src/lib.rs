//! Playlist sync core: pure job-tracking state machine and view-model helpers.
mod controls;
mod effect;
mod model;
mod msg;
mod reconcile;
mod session;
mod state;
mod transport;
mod update;
mod view_model;

pub use controls::{Affordance, Controls};
pub use effect::Effect;
pub use model::{
    ChannelId, ControlCommand, Failure, FetchKind, JobId, JobSnapshot, JobStatus, JobSummary,
    PlaylistCreated, TrackInfo, TrackJob, TrackStatus,
};
pub use msg::Msg;
pub use reconcile::{Reconciler, ViewPatch};
pub use session::{select_relevant_job, JobSession};
pub use state::{AppState, DiscoveryState, ServerCheck};
pub use transport::{FetchVerdict, TransportCommand, TransportManager, TransportMode};
pub use update::update;
pub use view_model::{
    render_row, status_label, AppViewModel, JobStats, Notice, NoticeKind, SessionView,
    TrackRowView,
};
