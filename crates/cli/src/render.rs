//! Terminal rendering of the mixer.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use console::style;

use xeneon_protocol::AudioSession;

use crate::panels::ResolvedPanel;
use crate::sync::{Connection, MixerView, SyncState};

const BAR_WIDTH: usize = 20;

pub const MSG_CONNECTING: &str = "Connecting to agent...";
pub const MSG_OFFLINE_EMPTY: &str = "Agent offline and nothing cached yet.";
pub const MSG_NO_PINNED: &str =
    "No pinned apps are playing audio. Pin one with `xeneon pin <app>`.";

pub fn volume_bar(level: f64) -> String {
    let filled = ((level.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Mixer rows: one line per displayed session.
pub fn mixer_table(rows: &[&AudioSession]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["App", "Volume", "", "Muted", "Device"]);
    for session in rows {
        let level = session.volume_level();
        table.add_row(vec![
            Cell::new(&session.name),
            Cell::new(format!("{level:.0}%")).set_alignment(CellAlignment::Right),
            Cell::new(volume_bar(level)),
            Cell::new(if session.muted { "yes" } else { "" }),
            Cell::new(&session.device_name),
        ]);
    }
    table
}

/// Every active session with its pin state.
pub fn sessions_table(sessions: &[AudioSession], pinned: &[String]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Pinned", "App", "Volume", "Muted", "PID"]);
    for session in sessions {
        let is_pinned = pinned.iter().any(|p| *p == session.name);
        table.add_row(vec![
            Cell::new(if is_pinned { "*" } else { "" }),
            Cell::new(&session.name),
            Cell::new(&session.volume_percent).set_alignment(CellAlignment::Right),
            Cell::new(if session.muted { "yes" } else { "" }),
            Cell::new(&session.process_id),
        ]);
    }
    table
}

pub fn panels_table(panels: &[ResolvedPanel]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Panel", "URL", "Width", "Scale", "Crop", "Hint"]);
    for panel in panels {
        table.add_row(vec![
            Cell::new(panel.name),
            Cell::new(panel.url.as_str()),
            Cell::new(format!("{}%", panel.width_pct)),
            Cell::new(format!("{:.0}%", panel.scale * 100.0)),
            Cell::new(format!("{}px", panel.crop_top_px)),
            Cell::new(
                panel
                    .hint
                    .as_ref()
                    .map(|h| h.to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    table
}

pub fn status_line(state: &SyncState) -> String {
    match state.connection() {
        Connection::Up => format!("{} {}", style("●").green(), state.status()),
        Connection::Down => format!("{} {}", style("●").red(), state.status()),
        Connection::Unknown => format!("{} {}", style("○").dim(), state.status()),
    }
}

/// The full mixer screen: table or empty-state message, then the status line.
pub fn render_mixer(state: &SyncState) -> String {
    let body = match state.view() {
        MixerView::Connecting => MSG_CONNECTING.to_string(),
        MixerView::Offline { rows } if rows.is_empty() => MSG_OFFLINE_EMPTY.to_string(),
        MixerView::Offline { rows } => mixer_table(&rows).to_string(),
        MixerView::NoPinnedApps => MSG_NO_PINNED.to_string(),
        MixerView::Rows(rows) => mixer_table(&rows).to_string(),
    };
    format!("{body}\n{}", status_line(state))
}
