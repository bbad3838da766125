use std::path::{Path, PathBuf};

use super::collector::Probe;
use super::error::ProbeError;
use super::snapshot::DiskUsage;

const SOURCE: &str = "disk";

/// Space on the volume that contains `path`.
pub struct DiskProbe {
    path: Option<PathBuf>,
}

impl Default for DiskProbe {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DiskProbe {
    /// `None` probes the process working directory.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn target(&self) -> Result<PathBuf, ProbeError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .map_err(|e| ProbeError::os_query(SOURCE, format!("working directory: {e}")))?,
        };
        path.canonicalize()
            .map_err(|e| ProbeError::os_query(SOURCE, format!("{}: {e}", path.display())))
    }
}

impl Probe for DiskProbe {
    type Reading = DiskUsage;

    fn name(&self) -> &'static str {
        SOURCE
    }

    fn sample(&self) -> Result<DiskUsage, ProbeError> {
        let target = self.target()?;
        let (total, free) = volume_space(&target)?;
        tracing::debug!(path = %target.display(), total, free, "disk volume");
        disk_usage(total, free)
    }
}

/// Total and free bytes of the filesystem holding `target`, asked of the
/// path itself so tmpfs and other virtual mounts report their own size.
/// Free counts root-reserved blocks (`f_bfree`), as `df` does for used space.
#[cfg(unix)]
fn volume_space(target: &Path) -> Result<(u64, u64), ProbeError> {
    use nix::sys::statvfs::statvfs;

    let stats = statvfs(target)
        .map_err(|e| ProbeError::os_query(SOURCE, format!("statvfs {}: {e}", target.display())))?;
    Ok(space_from_blocks(
        stats.blocks() as u64,
        stats.blocks_free() as u64,
        stats.fragment_size() as u64,
    ))
}

/// Without statvfs, fall back to the mount list. Only available space is
/// exposed there.
#[cfg(not(unix))]
fn volume_space(target: &Path) -> Result<(u64, u64), ProbeError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let mounts = disks
        .list()
        .iter()
        .map(|d| (d.mount_point(), d.total_space(), d.available_space()));
    volume_for(target, mounts)
        .map(|(_, total, free)| (total, free))
        .ok_or_else(|| {
            ProbeError::unavailable(
                SOURCE,
                format!("no mounted volume contains {}", target.display()),
            )
        })
}

pub(crate) fn space_from_blocks(blocks: u64, blocks_free: u64, fragment_size: u64) -> (u64, u64) {
    (
        blocks.saturating_mul(fragment_size),
        blocks_free.saturating_mul(fragment_size),
    )
}

/// Picks the mount point with the longest path prefix of `target`.
#[cfg_attr(unix, allow(dead_code))]
pub(crate) fn volume_for<'a>(
    target: &Path,
    mounts: impl IntoIterator<Item = (&'a Path, u64, u64)>,
) -> Option<(&'a Path, u64, u64)> {
    mounts
        .into_iter()
        .filter(|(mount, _, _)| target.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.components().count())
}

pub(crate) fn disk_usage(total_bytes: u64, free_bytes: u64) -> Result<DiskUsage, ProbeError> {
    if total_bytes == 0 {
        return Err(ProbeError::os_query(SOURCE, "volume reports 0 bytes total"));
    }
    let free_bytes = free_bytes.min(total_bytes);
    Ok(DiskUsage {
        used_bytes: total_bytes - free_bytes,
        total_bytes,
        free_percent: (free_bytes as f64 * 100.0 / total_bytes as f64).min(100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn thirty_of_hundred_used_is_seventy_free() {
        let usage = disk_usage(100 * GIB, 70 * GIB).unwrap();
        assert_eq!(usage.used_bytes, 30 * GIB);
        assert_eq!(usage.total_bytes, 100 * GIB);
        assert!((usage.free_percent - 70.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sized_volume_is_query_failure() {
        assert!(matches!(
            disk_usage(0, 0),
            Err(ProbeError::OsQueryFailed { .. })
        ));
    }

    #[test]
    fn free_above_total_is_clamped() {
        let usage = disk_usage(10, 20).unwrap();
        assert_eq!(usage.used_bytes, 0);
        assert!((usage.free_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn longest_mount_prefix_wins() {
        let mounts = vec![
            (Path::new("/"), 100, 50),
            (Path::new("/home"), 200, 20),
            (Path::new("/home/pi/data"), 300, 30),
            (Path::new("/ho"), 1, 1),
        ];
        let (mount, total, _) = volume_for(Path::new("/home/pi/world"), mounts.clone()).unwrap();
        assert_eq!(mount, Path::new("/home"));
        assert_eq!(total, 200);

        let (mount, _, _) = volume_for(Path::new("/srv"), mounts).unwrap();
        assert_eq!(mount, Path::new("/"));
    }

    #[test]
    fn no_matching_mount() {
        let mounts = vec![(Path::new("/mnt/usb"), 100, 50)];
        assert!(volume_for(Path::new("/home"), mounts).is_none());
    }

    #[test]
    fn missing_path_is_query_failure() {
        let probe = DiskProbe::new(Some(PathBuf::from("/nonexistent/vitals/path")));
        assert!(matches!(
            probe.sample(),
            Err(ProbeError::OsQueryFailed { .. })
        ));
    }

    #[test]
    fn block_counts_scale_by_fragment_size() {
        let (total, free) = space_from_blocks(1000, 250, 4096);
        assert_eq!(total, 1000 * 4096);
        assert_eq!(free, 250 * 4096);
        assert_eq!(space_from_blocks(u64::MAX, 1, 4096).0, u64::MAX);
    }

    #[cfg(unix)]
    #[test]
    fn free_includes_reserved_blocks() {
        use nix::sys::statvfs::statvfs;

        let root = Path::new("/");
        let stats = statvfs(root).unwrap();
        let unit = stats.fragment_size() as u64;
        let expected_free = stats.blocks_free() as u64 * unit;
        let (_, free) = volume_space(root).unwrap();
        // Other processes may write meanwhile.
        let slack = 256 * 1024 * 1024;
        assert!(free.abs_diff(expected_free) < slack, "{free} vs {expected_free}");
        assert!(stats.blocks_free() >= stats.blocks_available());
    }

    #[cfg(unix)]
    #[test]
    fn separate_mount_reports_its_own_size() {
        use std::os::unix::fs::MetadataExt;

        let shm = Path::new("/dev/shm");
        let (Ok(shm_meta), Ok(root_meta)) = (std::fs::metadata(shm), std::fs::metadata("/")) else {
            return;
        };
        if shm_meta.dev() == root_meta.dev() {
            return;
        }
        let root = DiskProbe::new(Some(PathBuf::from("/"))).sample().unwrap();
        if let Ok(usage) = DiskProbe::new(Some(shm.to_path_buf())).sample() {
            let (total, _) = volume_space(shm).unwrap();
            assert_eq!(usage.total_bytes, total);
            assert_ne!(usage.total_bytes, root.total_bytes);
        }
    }

    #[cfg(unix)]
    #[test]
    fn proc_is_not_mistaken_for_root() {
        let root = DiskProbe::new(Some(PathBuf::from("/"))).sample().unwrap();
        match DiskProbe::new(Some(PathBuf::from("/proc"))).sample() {
            Ok(usage) => assert_ne!(usage.total_bytes, root.total_bytes),
            Err(err) => assert!(matches!(err, ProbeError::OsQueryFailed { .. }), "{err}"),
        }
    }

    proptest! {
        #[test]
        fn free_percent_stays_in_range(total in 1u64..u64::MAX, free in any::<u64>()) {
            let usage = disk_usage(total, free).unwrap();
            prop_assert!((0.0..=100.0).contains(&usage.free_percent));
            prop_assert!(usage.used_bytes <= usage.total_bytes);
        }
    }
}
