use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

const PROBE_FILES: [&str; 4] = [
    "src/system/cpu.rs",
    "src/system/memory.rs",
    "src/system/temperature.rs",
    "src/system/disk.rs",
];

#[test]
fn probes_do_not_know_about_rendering_or_config() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut violations = Vec::new();

    for file in PROBE_FILES {
        let content = fs::read_to_string(root.join(file)).unwrap_or_default();
        for forbidden in ["crate::format", "crate::config", "super::cpu", "super::memory", "super::disk", "super::temperature"] {
            if content.contains(forbidden) {
                violations.push(format!("{file} imports forbidden dependency `{forbidden}`"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Probe layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn format_module_is_pure() {
    let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/format.rs");
    let content = fs::read_to_string(&file).unwrap_or_default();
    let mut violations = Vec::new();

    for forbidden in ["sysinfo", "std::process", "std::fs", "crate::system::collector"] {
        if content.contains(forbidden) {
            violations.push(format!(
                "{} imports forbidden dependency `{}`",
                rel(&file),
                forbidden
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Formatter purity violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_process_wide_state() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for forbidden in ["static mut", "OnceLock", "LazyLock", "lazy_static", "thread_local!"] {
            if content.contains(forbidden) {
                violations.push(format!("{} uses `{}`", rel(&file), forbidden));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Shared state found:\n{}",
        violations.join("\n")
    );
}

#[test]
fn target_os_cfg_is_not_used() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if content.contains("target_os") {
            violations.push(format!(
                "{} contains `target_os` cfg; platform differences belong to sysinfo",
                rel(&file)
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Unexpected target_os cfg usage:\n{}",
        violations.join("\n")
    );
}
