pub mod collector;
pub mod cpu;
pub mod disk;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod temperature;

pub use collector::{Probe, StatusAggregator};
pub use error::ProbeError;
pub use snapshot::{DiskUsage, MemoryUsage, SystemSnapshot};
