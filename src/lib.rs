pub mod config;
pub mod format;
pub mod system;

use std::path::Path;

use system::StatusAggregator;
use system::disk::DiskProbe;

/// Samples the host once and renders the plain status line. Never fails:
/// unavailable metrics show as placeholders. `disk_path` picks the volume
/// reported under "Disk" (default: the working directory).
pub fn produce_status_line(disk_path: Option<&Path>) -> String {
    StatusAggregator::default()
        .with_disk(DiskProbe::new(disk_path.map(Path::to_path_buf)))
        .status_line()
}
