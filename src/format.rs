use crate::system::snapshot::{DiskUsage, SystemSnapshot};

pub const UNAVAILABLE: &str = "Unavailable";

const FAILURE_PREFIX: &str = "[SYSINFO] Failed to get system info: ";

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// How the status line is decorated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkupStyle {
    #[default]
    Plain,
    /// `§`-prefixed colour codes understood by game chat clients.
    Legacy,
}

impl MarkupStyle {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "legacy" | "minecraft" | "section" => MarkupStyle::Legacy,
            _ => MarkupStyle::Plain,
        }
    }

    fn paint(self, code: char, text: &str) -> String {
        match self {
            MarkupStyle::Plain => text.to_string(),
            MarkupStyle::Legacy => format!("§{code}{text}§r"),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            MarkupStyle::Plain => "",
            MarkupStyle::Legacy => "§6[SYSINFO]§r ",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub markup: MarkupStyle,
    /// Render a failed disk probe as `0.0 / 0.0 GB (0% free)` instead of
    /// the placeholder.
    pub legacy_disk_fallback: bool,
}

pub fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

pub fn gibibytes(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// `CPU: 37.4% | Temp: 48.3°C | RAM: 512 / 2048 MB | Disk: 10.5 / 32.0 GB (67% free)`
pub fn render_status_line(snapshot: &SystemSnapshot, options: &RenderOptions) -> String {
    let cpu = snapshot
        .cpu_load_percent
        .map(|pct| format!("{pct:.1}%"))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let temp = snapshot
        .cpu_temperature_celsius
        .map(|celsius| format!("{celsius:.1}°C"))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let ram = snapshot
        .memory
        .map(|m| {
            format!(
                "{:.0} / {:.0} MB",
                mebibytes(m.used_bytes),
                mebibytes(m.total_bytes)
            )
        })
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let disk = match (snapshot.disk, options.legacy_disk_fallback) {
        (Some(disk), _) => format_disk(&disk),
        (None, true) => format_disk(&DiskUsage {
            used_bytes: 0,
            total_bytes: 0,
            free_percent: 0.0,
        }),
        (None, false) => UNAVAILABLE.to_string(),
    };

    let markup = options.markup;
    format!(
        "{}CPU: {} | Temp: {} | RAM: {} | Disk: {}",
        markup.prefix(),
        markup.paint('a', &cpu),
        markup.paint('c', &temp),
        markup.paint('b', &ram),
        markup.paint('e', &disk),
    )
}

/// The single-line report used when snapshot assembly itself blew up.
pub fn render_failure(message: &str, markup: MarkupStyle) -> String {
    match markup {
        MarkupStyle::Plain => format!("{FAILURE_PREFIX}{message}"),
        MarkupStyle::Legacy => format!("§c{FAILURE_PREFIX}{message}"),
    }
}

fn format_disk(disk: &DiskUsage) -> String {
    format!(
        "{:.1} / {:.1} GB ({:.0}% free)",
        gibibytes(disk.used_bytes),
        gibibytes(disk.total_bytes),
        disk.free_percent
    )
}
