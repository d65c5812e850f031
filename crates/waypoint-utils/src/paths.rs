//! Well-known locations for persisted workflow state.

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use unicode_normalization::UnicodeNormalization;

thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Resolve waypoint home:
/// 1) thread-local override (tests use this)
/// 2) env `WAYPOINT_HOME`
/// 3) `<user home>/.waypoint`
/// 4) `.waypoint` relative to the working directory
#[must_use]
pub fn waypoint_home() -> Utf8PathBuf {
    if let Some(tl) = THREAD_HOME.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("WAYPOINT_HOME") {
        return Utf8PathBuf::from(p);
    }
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(".waypoint"))
        .unwrap_or_else(|| Utf8PathBuf::from(".waypoint"))
}

/// Returns `<home>/state`
#[must_use]
pub fn state_dir(home: &Utf8Path) -> Utf8PathBuf {
    home.join("state")
}

/// Filesystem-safe key for a project path.
///
/// The path is NFKC-normalized and every character outside `[A-Za-z0-9]` becomes `_`.
/// Runs of separators are kept, so `/a/b` and `/a//b` address different records exactly as
/// the raw paths differ.
///
/// ```rust
/// use waypoint_utils::paths::state_key;
///
/// assert_eq!(state_key("/home/dev/my-project"), "_home_dev_my_project");
/// ```
#[must_use]
pub fn state_key(project_path: &str) -> String {
    project_path
        .nfkc()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Returns `<home>/state/<key>.json`
#[must_use]
pub fn state_file(home: &Utf8Path, project_path: &str) -> Utf8PathBuf {
    state_dir(home).join(format!("{}.json", state_key(project_path)))
}

/// Human label for a workflow, taken from the last path component
#[must_use]
pub fn workflow_name(project_path: &str) -> String {
    let trimmed = project_path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(project_path)
        .to_string()
}

/// mkdir -p; treat `AlreadyExists` as success (removes TOCTTOU races)
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard for isolated home that clears thread-local state on drop
#[cfg(any(test, feature = "test-utils"))]
pub struct HomeGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl HomeGuard {
    /// The isolated home as a UTF-8 path
    #[must_use]
    pub fn home(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.inner.path().to_path_buf())
            .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for HomeGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Test helper: give this thread a unique waypoint home under the system temp dir.
///
/// Hold the `HomeGuard` for the test's duration so the directory stays alive.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn with_isolated_home() -> HomeGuard {
    let td = tempfile::TempDir::new().expect("create temp home");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf-8 temp dir");
    THREAD_HOME.with(|tl| *tl.borrow_mut() = Some(p));
    HomeGuard { inner: td }
}
