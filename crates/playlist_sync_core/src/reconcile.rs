use crate::view_model::{render_row, JobStats, TrackRowView};
use crate::TrackJob;

/// A change the front end has to apply to its rendered track list.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewPatch {
    /// Replace the whole list.
    Rebuild(Vec<TrackRowView>),
    /// Re-render the row at `index` in place.
    Row { index: usize, row: TrackRowView },
}

/// Keeps the rendered rows of one job and diffs snapshots against them.
///
/// Rows are matched by position only. Track order and count do not change
/// during a job, so a length mismatch means the list was never populated
/// (or the server broke that contract) and the list is rebuilt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciler {
    rows: Vec<TrackRowView>,
    stats: JobStats,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TrackRowView] {
        &self.rows
    }

    pub fn stats(&self) -> JobStats {
        self.stats
    }

    pub fn apply(&mut self, tracks: &[TrackJob]) -> Vec<ViewPatch> {
        self.stats = JobStats::from_tracks(tracks);

        if tracks.len() != self.rows.len() {
            self.rows = tracks.iter().map(render_row).collect();
            return vec![ViewPatch::Rebuild(self.rows.clone())];
        }

        let mut patches = Vec::new();
        for (index, (row, job)) in self.rows.iter_mut().zip(tracks).enumerate() {
            let next = render_row(job);
            if *row != next {
                *row = next.clone();
                patches.push(ViewPatch::Row { index, row: next });
            }
        }
        patches
    }
}
