use std::time::Duration;

use sysinfo::{CpuRefreshKind, MINIMUM_CPU_UPDATE_INTERVAL, RefreshKind, System};

use super::collector::Probe;
use super::error::ProbeError;

const SOURCE: &str = "cpu";

/// System-wide CPU load, sampled as the delta between two refreshes.
pub struct CpuProbe {
    interval: Duration,
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new(MINIMUM_CPU_UPDATE_INTERVAL)
    }
}

impl CpuProbe {
    /// sysinfo needs at least `MINIMUM_CPU_UPDATE_INTERVAL` between the two
    /// refreshes, so shorter intervals are raised to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Probe for CpuProbe {
    /// Load as a fraction in `[0, 1]`.
    type Reading = f64;

    fn name(&self) -> &'static str {
        SOURCE
    }

    fn sample(&self) -> Result<f64, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::os_query(SOURCE, "platform not supported"));
        }

        let mut sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        if sys.cpus().is_empty() {
            return Err(ProbeError::unavailable(SOURCE, "no CPUs reported"));
        }

        std::thread::sleep(self.interval);
        sys.refresh_cpu_usage();

        load_fraction(sys.global_cpu_usage())
    }
}

/// Converts a usage percentage into a fraction, rejecting the NaN/negative
/// values some platforms report before a usable delta exists.
pub(crate) fn load_fraction(percent: f32) -> Result<f64, ProbeError> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(ProbeError::unavailable(
            SOURCE,
            format!("no usable load figure yet (got {percent})"),
        ));
    }
    Ok((f64::from(percent) / 100.0).min(1.0))
}
