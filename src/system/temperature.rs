//! CPU/SoC temperature with ordered fallback sources.
//!
//! The default order asks the Raspberry Pi firmware tool first
//! (`vcgencmd measure_temp` prints `temp=48.3'C`) and then reads the kernel
//! thermal zone, which reports millidegrees Celsius as a plain integer.
//! The first source that yields a number wins.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::collector::Probe;
use super::error::ProbeError;

const SOURCE: &str = "temperature";

pub const VENDOR_COMMAND: &str = "vcgencmd";
pub const VENDOR_ARGS: [&str; 1] = ["measure_temp"];
pub const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1500);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, PartialEq)]
pub enum TemperatureSource {
    /// External diagnostic tool printing one `key=value<unit>` line.
    VendorCommand {
        program: String,
        args: Vec<String>,
        timeout: Duration,
    },
    /// Kernel pseudo-file holding an integer in millidegrees.
    ThermalZone { path: PathBuf },
}

impl TemperatureSource {
    pub fn vendor_default() -> Self {
        TemperatureSource::VendorCommand {
            program: VENDOR_COMMAND.to_string(),
            args: VENDOR_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn thermal_zone_default() -> Self {
        TemperatureSource::ThermalZone {
            path: PathBuf::from(THERMAL_ZONE_PATH),
        }
    }

    /// Degrees Celsius from this source alone.
    pub fn read(&self) -> Result<f64, ProbeError> {
        match self {
            TemperatureSource::VendorCommand {
                program,
                args,
                timeout,
            } => {
                let output = run_command(program, args, *timeout)?;
                parse_vendor_output(&output)
            }
            TemperatureSource::ThermalZone { path } => read_thermal_zone(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TemperatureSource::VendorCommand { program, args, .. } if args.is_empty() => {
                program.clone()
            }
            TemperatureSource::VendorCommand { program, args, .. } => {
                format!("{program} {}", args.join(" "))
            }
            TemperatureSource::ThermalZone { path } => path.display().to_string(),
        }
    }
}

pub struct TemperatureProbe {
    sources: Vec<TemperatureSource>,
}

impl Default for TemperatureProbe {
    fn default() -> Self {
        Self::new(vec![
            TemperatureSource::vendor_default(),
            TemperatureSource::thermal_zone_default(),
        ])
    }
}

impl TemperatureProbe {
    pub fn new(sources: Vec<TemperatureSource>) -> Self {
        Self { sources }
    }
}

impl Probe for TemperatureProbe {
    /// Degrees Celsius.
    type Reading = f64;

    fn name(&self) -> &'static str {
        SOURCE
    }

    fn sample(&self) -> Result<f64, ProbeError> {
        let mut failures = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.read() {
                Ok(celsius) => {
                    tracing::debug!(source = %source.describe(), celsius, "temperature read");
                    return Ok(celsius);
                }
                Err(err) => {
                    tracing::debug!(source = %source.describe(), error = %err, "temperature source failed");
                    failures.push(err.to_string());
                }
            }
        }

        let reason = if failures.is_empty() {
            "no sources configured".to_string()
        } else {
            failures.join("; ")
        };
        Err(ProbeError::unavailable(SOURCE, reason))
    }
}

/// Parses the first line of vendor output such as `temp=42.8'C` or
/// `temp=42.8°C`. Trailing unit characters are dropped; whatever remains
/// must be a number.
pub fn parse_vendor_output(output: &str) -> Result<f64, ProbeError> {
    let line = output.lines().next().unwrap_or_default().trim();
    let Some((_, value)) = line.split_once('=') else {
        return Err(ProbeError::parse(line, "missing '='"));
    };

    let numeric = value.trim().trim_end_matches(|c: char| !c.is_ascii_digit());
    let celsius: f64 = numeric
        .parse()
        .map_err(|e| ProbeError::parse(line, format!("{e}")))?;
    if !celsius.is_finite() {
        return Err(ProbeError::parse(line, "not a finite number"));
    }
    Ok(celsius)
}

/// Parses thermal zone content (`"50000\n"` is 50.0 °C).
pub fn parse_millidegrees(content: &str) -> Result<f64, ProbeError> {
    let trimmed = content.trim();
    let millidegrees: i64 = trimmed
        .parse()
        .map_err(|_| ProbeError::parse(trimmed, "expected integer millidegrees"))?;
    Ok(millidegrees as f64 / 1000.0)
}

fn read_thermal_zone(path: &Path) -> Result<f64, ProbeError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ProbeError::unavailable(path.display().to_string(), "no such file"),
        _ => ProbeError::os_query(path.display().to_string(), e.to_string()),
    })?;
    parse_millidegrees(&content)
}

/// Runs `program` and returns its stdout, killing it once `timeout` passes.
/// Stdout is drained on a helper thread so a chatty tool cannot stall on a
/// full pipe.
fn run_command(program: &str, args: &[String], timeout: Duration) -> Result<String, ProbeError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ProbeError::unavailable(program, "command not found"),
            _ => ProbeError::os_query(program, format!("spawn failed: {e}")),
        })?;

    let (tx, rx) = mpsc::channel();
    if let Some(mut stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut output = String::new();
            let result = stdout.read_to_string(&mut output).map(|_| output);
            let _ = tx.send(result);
        });
    } else {
        let _ = tx.send(Ok(String::new()));
    }

    let timed_out = || {
        ProbeError::unavailable(
            program,
            format!("timed out after {} ms", timeout.as_millis()),
        )
    };
    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(timed_out());
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::os_query(program, format!("wait failed: {e}")));
            }
        }
    };

    if !status.success() {
        return Err(ProbeError::unavailable(program, format!("exited with {status}")));
    }

    // A grandchild may still hold the pipe open; stay within the deadline.
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProbeError::os_query(program, format!("reading stdout: {e}"))),
        Err(_) => Err(timed_out()),
    }
}
