//! Download completion watcher. Chromium writes `.crdownload` partials and
//! renames them when the transfer finishes, so "done" means a non-partial
//! file that appeared after the watch started.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::SessionError;
use crate::waiter::Waiter;

const PARTIAL_SUFFIXES: [&str; 2] = [".crdownload", ".tmp"];

pub fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Blocks until a completed download shows up in `dir`, or the waiter's
/// deadline passes. With a filename, waits for exactly that file; without
/// one, returns the newest file that completed after the watch began.
pub fn wait_for_download(
    dir: &Path,
    filename: Option<&str>,
    waiter: &Waiter,
) -> Result<PathBuf, SessionError> {
    let since = SystemTime::now();
    let found = waiter.poll_until(|| completed_download(dir, filename, since))?;
    found.ok_or_else(|| SessionError::Timeout {
        target: filename
            .map(str::to_string)
            .unwrap_or_else(|| format!("download in {}", dir.display())),
        seconds: waiter.timeout_secs(),
    })
}

fn completed_download(
    dir: &Path,
    filename: Option<&str>,
    since: SystemTime,
) -> Result<Option<PathBuf>, SessionError> {
    if let Some(name) = filename {
        let path = dir.join(name);
        let partial_twin = dir.join(format!("{}.crdownload", name));
        if path.is_file() && !partial_twin.exists() {
            return Ok(Some(path));
        }
        return Ok(None);
    }

    let entries = fs::read_dir(dir).map_err(|e| SessionError::Download(e.to_string()))?;
    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| SessionError::Download(e.to_string()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_partial(&name) {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|e| SessionError::Download(e.to_string()))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|e| SessionError::Download(e.to_string()))?;
        if modified < since {
            continue;
        }
        let newer = newest
            .as_ref()
            .map(|(_, best)| modified > *best)
            .unwrap_or(true);
        if newer {
            newest = Some((entry.path(), modified));
        }
    }
    Ok(newest.map(|(path, _)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn quick_waiter() -> Waiter {
        Waiter::new(Duration::from_millis(50), Duration::from_millis(10))
    }

    #[test]
    fn test_partial_suffixes() {
        assert!(is_partial("report.pdf.crdownload"));
        assert!(is_partial("upload.tmp"));
        assert!(!is_partial("report.pdf"));
        assert!(!is_partial("notes.tmp.txt"));
    }

    #[test]
    fn test_named_download_found_once_complete() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("report.pdf"), b"data").unwrap();

        let path =
            wait_for_download(dir.path(), Some("report.pdf"), &quick_waiter()).unwrap();
        assert_eq!(path, dir.path().join("report.pdf"));
    }

    #[test]
    fn test_named_download_waits_out_partial_twin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("report.pdf"), b"partial data").unwrap();
        fs::write(dir.path().join("report.pdf.crdownload"), b"").unwrap();

        let err =
            wait_for_download(dir.path(), Some("report.pdf"), &quick_waiter()).unwrap_err();
        assert!(matches!(err, SessionError::Timeout { .. }));
    }

    #[test]
    fn test_unnamed_download_picks_a_file_that_lands_mid_watch() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data.csv");
        let writer = {
            let target = target.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                fs::write(&target, b"a,b").unwrap();
            })
        };

        let waiter = Waiter::new(Duration::from_secs(2), Duration::from_millis(10));
        let path = wait_for_download(dir.path(), None, &waiter).unwrap();
        writer.join().unwrap();
        assert_eq!(path, target);
    }

    #[test]
    fn test_unnamed_download_ignores_partials() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.csv.crdownload"), b"x").unwrap();

        let err = wait_for_download(dir.path(), None, &quick_waiter()).unwrap_err();
        assert!(matches!(err, SessionError::Timeout { .. }));
    }

    #[test]
    fn test_timeout_names_the_filename() {
        let dir = TempDir::new().unwrap();
        let err =
            wait_for_download(dir.path(), Some("missing.zip"), &quick_waiter()).unwrap_err();
        assert!(err.to_string().contains("missing.zip"));
    }
}
