//! Output formatting: table, JSON, plain.
//!
//! Renders discovery results in the format selected by `--output`.
//! Table uses `tabled`, structured formats use serde, plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use iolite_core::Room;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Room rendering ───────────────────────────────────────────────────

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ROOM")]
    name: String,
    #[tabled(rename = "DEVICES")]
    devices: usize,
    #[tabled(rename = "CURRENT")]
    current: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "WINDOW")]
    window: String,
}

fn room_row(room: &Room) -> RoomRow {
    let (current, target, window) = room.heating.as_ref().map_or_else(
        || ("-".into(), "-".into(), "-".into()),
        |heating| {
            (
                heating
                    .current_temp
                    .map_or_else(|| "-".into(), |t| format!("{t:.1}°C")),
                format!("{:.1}°C", heating.target_temp),
                match heating.window_open {
                    Some(true) => "open".into(),
                    Some(false) => "closed".into(),
                    None => "unknown".into(),
                },
            )
        },
    );

    RoomRow {
        name: room.name.clone(),
        devices: room.devices.len(),
        current,
        target,
        window,
    }
}

/// Render the discovered rooms in the chosen format.
pub fn render_rooms(format: &OutputFormat, rooms: &[Room]) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<RoomRow> = rooms.iter().map(room_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json_pretty(rooms),
        OutputFormat::JsonCompact => render_json_compact(rooms),
        OutputFormat::Plain => rooms
            .iter()
            .map(|room| room.identifier.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render one room with its device list (detail view).
pub fn render_room_detail(room: &Room, color: bool) -> String {
    let mut out = String::new();
    if color {
        out.push_str(&format!("{}\n", room.name.bold()));
    } else {
        out.push_str(&format!("{}\n", room.name));
    }

    let mut devices: Vec<_> = room.devices.values().collect();
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    for device in devices {
        out.push_str(&format!(
            "  {} [{}] {}\n",
            device.identifier,
            device.device_type(),
            device.name
        ));
    }
    out
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Pretty-printed JSON.
pub fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

/// Compact single-line JSON.
pub fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

// ── Tests ────────────────────────────────────────────────────────────
