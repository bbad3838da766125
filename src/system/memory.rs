use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use super::collector::Probe;
use super::error::ProbeError;
use super::snapshot::MemoryUsage;

const SOURCE: &str = "memory";

/// Which figure counts as "free" when deriving used memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryBasis {
    /// Reclaimable memory included (`MemAvailable` on Linux).
    #[default]
    Available,
    /// Strictly unused pages (`MemFree` on Linux).
    Free,
}

impl MemoryBasis {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "free" => MemoryBasis::Free,
            _ => MemoryBasis::Available,
        }
    }
}

#[derive(Default)]
pub struct MemoryProbe {
    basis: MemoryBasis,
}

impl MemoryProbe {
    pub fn new(basis: MemoryBasis) -> Self {
        Self { basis }
    }
}

impl Probe for MemoryProbe {
    type Reading = MemoryUsage;

    fn name(&self) -> &'static str {
        SOURCE
    }

    fn sample(&self) -> Result<MemoryUsage, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::os_query(SOURCE, "platform not supported"));
        }

        // One refresh so total and free come from the same reading.
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        let free = match self.basis {
            MemoryBasis::Available => sys.available_memory(),
            MemoryBasis::Free => sys.free_memory(),
        };

        memory_usage(sys.total_memory(), free)
    }
}

pub(crate) fn memory_usage(total_bytes: u64, free_bytes: u64) -> Result<MemoryUsage, ProbeError> {
    if total_bytes == 0 {
        return Err(ProbeError::os_query(SOURCE, "total memory reported as 0"));
    }
    if free_bytes > total_bytes {
        tracing::warn!(
            total_bytes,
            free_bytes,
            "free memory exceeds total, clamping used to 0"
        );
    }
    Ok(MemoryUsage {
        used_bytes: total_bytes.saturating_sub(free_bytes),
        total_bytes,
    })
}
