//! Atomic file replacement for workflow state records.
//!
//! A record is written to a temporary file in the destination directory, fsynced, and
//! renamed over the target. A crash at any point leaves either the previous record or the
//! new one on disk, never a partial write.
//!
//! On Windows the rename is retried with bounded backoff because antivirus scanners and
//! indexers briefly hold handles on freshly written files. When the rename fails with
//! `EXDEV` the content is re-staged next to the target and renamed again.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Outcome of an atomic replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomicWriteOutcome {
    /// Bytes written to the target
    pub bytes_written: usize,
    /// Rename attempts that had to be repeated (Windows only)
    pub rename_retries: u32,
    /// Whether the content had to be re-staged because the temp dir sat on another filesystem
    pub restaged: bool,
}

/// Atomically replace `path` with `content`, creating parent directories as needed.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteOutcome> {
    let mut outcome = AtomicWriteOutcome {
        bytes_written: content.len(),
        ..AtomicWriteOutcome::default()
    };

    let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    crate::paths::ensure_dir_all(dir)
        .with_context(|| format!("Failed to create state directory: {dir}"))?;

    let staged = stage(dir, content.as_bytes())?;
    let staged_path = staged.path().to_path_buf();

    match persist(staged, path.as_std_path()) {
        Ok(retries) => outcome.rename_retries = retries,
        Err(e) if is_cross_device(&e) => {
            outcome.restaged = true;
            let bytes = fs::read(&staged_path)
                .with_context(|| format!("Failed to re-read staged file for {path}"))?;
            let restaged = stage(dir, &bytes)?;
            persist(restaged, path.as_std_path())
                .with_context(|| format!("Failed to replace {path} after re-staging"))?;
            let _ = fs::remove_file(&staged_path);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to atomically replace {path}")),
    }

    tracing::debug!(
        path = %path,
        bytes = outcome.bytes_written,
        retries = outcome.rename_retries,
        "state file replaced"
    );

    Ok(outcome)
}

/// Write `bytes` into a fresh temp file inside `dir` and fsync it
fn stage(dir: &Utf8Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in: {dir}"))?;
    temp.write_all(bytes)
        .context("Failed to write content to temporary file")?;
    temp.as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;
    Ok(temp)
}

#[cfg(target_os = "windows")]
fn persist(mut temp: NamedTempFile, target: &Path) -> Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;

    let mut retries = 0;
    loop {
        match temp.persist(target) {
            Ok(_) => return Ok(retries),
            Err(err) => {
                let transient = matches!(
                    err.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if !transient || retries >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(err.error));
                }
                thread::sleep(Duration::from_millis(INITIAL_DELAY_MS << retries));
                retries += 1;
                temp = err.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn persist(temp: NamedTempFile, target: &Path) -> Result<u32> {
    temp.persist(target)
        .map(|_| 0)
        .map_err(|e| anyhow::anyhow!(e.error))
}

#[cfg(unix)]
fn is_cross_device(err: &anyhow::Error) -> bool {
    // EXDEV on Linux and macOS
    err.downcast_ref::<std::io::Error>()
        .and_then(std::io::Error::raw_os_error)
        == Some(18)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &anyhow::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_write_creates_nested_state_dir() {
        let temp = TempDir::new().unwrap();
        let path = utf8_dir(&temp).join("state").join("p1.json");

        let outcome = write_file_atomic(&path, "{\"version\":\"1.0\"}").unwrap();

        assert_eq!(outcome.bytes_written, 17);
        assert_eq!(outcome.rename_retries, 0);
        assert!(!outcome.restaged);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"version\":\"1.0\"}");
    }

    #[test]
    fn test_write_replaces_existing_record() {
        let temp = TempDir::new().unwrap();
        let path = utf8_dir(&temp).join("p1.json");

        write_file_atomic(&path, "first").unwrap();
        write_file_atomic(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_leaves_no_temp_files_behind() {
        let temp = TempDir::new().unwrap();
        let dir = utf8_dir(&temp);

        write_file_atomic(&dir.join("a.json"), "{}").unwrap();
        write_file_atomic(&dir.join("a.json"), "{}").unwrap();

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_preserves_unicode() {
        let temp = TempDir::new().unwrap();
        let path = utf8_dir(&temp).join("u.json");

        write_file_atomic(&path, "Ziel: 世界 🌍").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Ziel: 世界 🌍");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_into_readonly_dir_fails_loudly() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = utf8_dir(&temp).join("ro");
        fs::create_dir(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        let result = write_file_atomic(&dir.join("p.json"), "{}");

        // Root ignores directory permissions; only assert when the OS enforced them.
        if result.is_err() {
            assert!(!dir.join("p.json").exists());
        }
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
