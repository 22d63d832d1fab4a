//! Diagnostics helpers.
//!
//! - **About info**: version, build timestamp, git SHA, platform
//! - **Log rotation helpers**: used by `lib.rs` to configure rolling log files.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "order-desk";

/// Returns version, build timestamp, git SHA, and platform info.
pub fn get_about_info() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("BUILD_TIMESTAMP"),
        "gitSha": env!("BUILD_GIT_SHA"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    })
}

/// Default log directory under the platform's local data dir.
pub fn default_log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join("order-desk").join("logs")
}

/// Prune old log files in `log_dir`, keeping only the most recent `keep`.
/// Returns how many files were removed.
pub fn prune_old_logs(log_dir: &Path, keep: usize) -> usize {
    if !log_dir.exists() {
        return 0;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| name.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false);
            if is_log {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(std::time::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to prune log file {}: {e}", path.display()),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_about_info_has_required_fields() {
        let info = get_about_info();
        assert!(info.get("version").is_some());
        assert!(info.get("buildTimestamp").is_some());
        assert!(info.get("gitSha").is_some());
        assert!(info.get("platform").is_some());
    }

    #[test]
    fn test_default_log_dir_is_stable() {
        let d1 = default_log_dir();
        let d2 = default_log_dir();
        assert_eq!(d1, d2);
        assert!(d1.ends_with("order-desk/logs"));
    }

    #[test]
    fn test_prune_keeps_newest_log_files_only() {
        let dir = std::env::temp_dir().join(format!("desk_logs_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let now = SystemTime::now();
        for i in 0..4u64 {
            let path = dir.join(format!("{LOG_FILE_PREFIX}.2026-10-1{i}"));
            let file = fs::File::create(&path).unwrap();
            file.set_modified(now - Duration::from_secs(3600 * (4 - i)))
                .unwrap();
        }
        fs::write(dir.join("unrelated.txt"), "keep me").unwrap();

        let removed = prune_old_logs(&dir, 2);
        assert_eq!(removed, 2);
        assert!(dir.join(format!("{LOG_FILE_PREFIX}.2026-10-13")).exists());
        assert!(dir.join(format!("{LOG_FILE_PREFIX}.2026-10-12")).exists());
        assert!(!dir.join(format!("{LOG_FILE_PREFIX}.2026-10-10")).exists());
        assert!(dir.join("unrelated.txt").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let dir = std::env::temp_dir().join(format!("desk_missing_{}", uuid::Uuid::new_v4()));
        assert_eq!(prune_old_logs(&dir, 1), 0);
    }
}
