use serde::Serialize;

/// Physical memory in bytes, taken from one OS query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Space on the volume holding the probed path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DiskUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub free_percent: f64,
}

/// Result of running every probe once. `None` means that probe failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_load_percent: Option<f64>,
    pub cpu_temperature_celsius: Option<f64>,
    pub memory: Option<MemoryUsage>,
    pub disk: Option<DiskUsage>,
}
