use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::config::{Config, TemperatureConfig};
use crate::format::{MarkupStyle, RenderOptions, render_failure, render_status_line};

use super::cpu::CpuProbe;
use super::disk::DiskProbe;
use super::error::ProbeError;
use super::memory::{MemoryBasis, MemoryProbe};
use super::snapshot::{DiskUsage, MemoryUsage, SystemSnapshot};
use super::temperature::{TemperatureProbe, TemperatureSource};

/// One OS-backed metric. Implementations open their own handles on every
/// call and keep no state between samples.
pub trait Probe {
    type Reading;

    fn name(&self) -> &'static str;
    fn sample(&self) -> Result<Self::Reading, ProbeError>;
}

type BoxedProbe<R> = Box<dyn Probe<Reading = R> + Send + Sync>;

/// Runs the four probes and turns the results into a [`SystemSnapshot`] or a
/// rendered status line. A failed probe only blanks its own field.
pub struct StatusAggregator {
    cpu: BoxedProbe<f64>,
    temperature: BoxedProbe<f64>,
    memory: BoxedProbe<MemoryUsage>,
    disk: BoxedProbe<DiskUsage>,
    render: RenderOptions,
}

impl Default for StatusAggregator {
    fn default() -> Self {
        StatusAggregator {
            cpu: Box::new(CpuProbe::default()),
            temperature: Box::new(TemperatureProbe::default()),
            memory: Box::new(MemoryProbe::default()),
            disk: Box::new(DiskProbe::default()),
            render: RenderOptions::default(),
        }
    }
}

impl StatusAggregator {
    pub fn from_config(config: &Config) -> Self {
        StatusAggregator::default()
            .with_cpu(CpuProbe::new(Duration::from_millis(
                config.cpu.sample_interval_ms,
            )))
            .with_temperature(TemperatureProbe::new(temperature_sources(
                &config.temperature,
            )))
            .with_memory(MemoryProbe::new(MemoryBasis::from_name(
                &config.memory.basis,
            )))
            .with_disk(DiskProbe::new(config.disk.path.clone()))
            .with_render(RenderOptions {
                markup: MarkupStyle::from_name(&config.output.markup),
                legacy_disk_fallback: config.output.legacy_disk_fallback,
            })
    }

    pub fn with_cpu(mut self, probe: impl Probe<Reading = f64> + Send + Sync + 'static) -> Self {
        self.cpu = Box::new(probe);
        self
    }

    pub fn with_temperature(
        mut self,
        probe: impl Probe<Reading = f64> + Send + Sync + 'static,
    ) -> Self {
        self.temperature = Box::new(probe);
        self
    }

    pub fn with_memory(
        mut self,
        probe: impl Probe<Reading = MemoryUsage> + Send + Sync + 'static,
    ) -> Self {
        self.memory = Box::new(probe);
        self
    }

    pub fn with_disk(
        mut self,
        probe: impl Probe<Reading = DiskUsage> + Send + Sync + 'static,
    ) -> Self {
        self.disk = Box::new(probe);
        self
    }

    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn render_options(&self) -> RenderOptions {
        self.render
    }

    /// Samples every probe once, in sequence. Never fails: if assembly
    /// panics, every field comes back absent.
    pub fn snapshot(&self) -> SystemSnapshot {
        self.try_snapshot().unwrap_or_default()
    }

    /// Like [`snapshot`](Self::snapshot), but a panic while sampling is
    /// returned as its message instead of an empty snapshot.
    pub fn try_snapshot(&self) -> Result<SystemSnapshot, String> {
        panic::catch_unwind(AssertUnwindSafe(|| self.assemble())).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "failed to get system info");
            message
        })
    }

    /// The rendered status line. If assembling the snapshot panics, the
    /// whole report collapses into a single failure message.
    pub fn status_line(&self) -> String {
        match self.try_snapshot() {
            Ok(snapshot) => render_status_line(&snapshot, &self.render),
            Err(message) => render_failure(&message, self.render.markup),
        }
    }

    /// The snapshot as JSON, or `{"error": "<message>"}` if sampling panicked.
    pub fn json_report(&self) -> Result<String, serde_json::Error> {
        match self.try_snapshot() {
            Ok(snapshot) => serde_json::to_string(&snapshot),
            Err(message) => serde_json::to_string(&serde_json::json!({ "error": message })),
        }
    }

    fn assemble(&self) -> SystemSnapshot {
        let _span = tracing::debug_span!("aggregator.snapshot").entered();

        SystemSnapshot {
            cpu_load_percent: sample_field(self.cpu.as_ref()).map(|load| load * 100.0),
            cpu_temperature_celsius: sample_field(self.temperature.as_ref()),
            memory: sample_field(self.memory.as_ref()),
            disk: sample_field(self.disk.as_ref()),
        }
    }
}

/// Vendor command first unless it is blanked out, then the thermal zone.
fn temperature_sources(config: &TemperatureConfig) -> Vec<TemperatureSource> {
    let mut sources = Vec::with_capacity(2);
    let program = config.command.trim();
    if !program.is_empty() {
        sources.push(TemperatureSource::VendorCommand {
            program: program.to_string(),
            args: config.args.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        });
    }
    sources.push(TemperatureSource::ThermalZone {
        path: config.thermal_zone.clone(),
    });
    sources
}

fn sample_field<P: Probe + ?Sized>(probe: &P) -> Option<P::Reading> {
    match probe.sample() {
        Ok(reading) => Some(reading),
        Err(err) if err.is_expected() => {
            tracing::info!(probe = probe.name(), error = %err, "probe unavailable");
            None
        }
        Err(err) => {
            tracing::warn!(probe = probe.name(), error = %err, "probe failed");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}
