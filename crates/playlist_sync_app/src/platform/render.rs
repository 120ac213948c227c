use playlist_sync_core::{AppViewModel, NoticeKind, TrackRowView, TransportMode, ViewPatch};

/// Summary block: header, counters, control hints and any notice.
pub fn render_view(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    match &view.session {
        Some(session) => {
            let name = session.playlist_name.as_deref().unwrap_or("Untitled playlist");
            let status = session
                .status
                .as_ref()
                .map(|status| status.as_str().to_string())
                .unwrap_or_else(|| "waiting".to_string());
            let mut header = format!("== {name} [{status}] ({})", transport_label(view.transport));
            if let Some(count) = &session.track_count_text {
                header.push_str(&format!(" {count}"));
            }
            lines.push(header);

            if !view.rows.is_empty() {
                let mut stats = format!(
                    "   {} | {} | {}",
                    view.stats.total_text(),
                    view.stats.complete_text(),
                    view.stats.percent_text()
                );
                if let Some(failed) = view.stats.failed_text() {
                    stats.push_str(&format!(" | {failed}"));
                }
                lines.push(stats);
            }
        }
        None if view.submitting => lines.push("== Starting download...".to_string()),
        None => lines.push("== No job. Paste a playlist URL to start.".to_string()),
    }

    let hints = control_hints(view);
    if !hints.is_empty() {
        lines.push(format!("   {}", hints.join("  ")));
    }

    if let Some(notice) = &view.notice {
        let prefix = match notice.kind {
            NoticeKind::Info => "note",
            NoticeKind::Error => "error",
        };
        lines.push(format!("   {prefix}: {}", notice.text));
    }
    lines
}

pub fn render_patch(patch: &ViewPatch) -> Vec<String> {
    match patch {
        ViewPatch::Rebuild(rows) => rows
            .iter()
            .enumerate()
            .map(|(index, row)| format_row(index, row))
            .collect(),
        ViewPatch::Row { index, row } => vec![format_row(*index, row)],
    }
}

pub fn format_row(index: usize, row: &TrackRowView) -> String {
    let mut line = format!("{:>4}. {} - {}", index + 1, row.title, row.artist);
    if !row.album.is_empty() {
        line.push_str(&format!(" ({})", row.album));
    }
    match row.progress_pct {
        Some(pct) => line.push_str(&format!(" [{} {:.0}%]", row.status_label, pct)),
        None => line.push_str(&format!(" [{}]", row.status_label)),
    }
    if let Some(tooltip) = &row.tooltip {
        if row.status.is_failure() {
            line.push_str(&format!(" !! {tooltip}"));
        } else {
            line.push_str(&format!(" ({tooltip})"));
        }
    }
    line
}

fn control_hints(view: &AppViewModel) -> Vec<&'static str> {
    let mut hints = Vec::new();
    if view.controls.stop.visible {
        hints.push(if view.controls.stop.enabled {
            "[stop]"
        } else {
            "[stopping...]"
        });
    }
    if view.controls.resume.visible {
        hints.push(if view.controls.resume.enabled {
            "[resume]"
        } else {
            "[resuming...]"
        });
    }
    hints
}

fn transport_label(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Idle => "idle",
        TransportMode::Push => "live",
        TransportMode::Poll => "polling",
    }
}
