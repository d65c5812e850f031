//! Loads, creates and atomically persists workflow state records.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use tracing::{debug, info, warn};

use waypoint_utils::atomic_write::write_file_atomic;
use waypoint_utils::canonicalization::emit_jcs;
use waypoint_utils::error::WaypointError;
use waypoint_utils::paths;

use crate::domain::WorkflowType;
use crate::migration::migrate;
use crate::state::WorkflowState;

/// The only path by which workflow state reaches disk.
///
/// Records live at `<home>/state/<key>.json`, one per project path. The manager holds no
/// state of its own beyond `home`; every call reads or writes the file.
#[derive(Debug, Clone)]
pub struct StateManager {
    home: Utf8PathBuf,
}

impl StateManager {
    pub fn new(home: impl Into<Utf8PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Manager rooted at the resolved waypoint home (`WAYPOINT_HOME`, `~/.waypoint`).
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(paths::waypoint_home())
    }

    #[must_use]
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    #[must_use]
    pub fn state_path(&self, project_path: &str) -> Utf8PathBuf {
        paths::state_file(&self.home, project_path)
    }

    #[must_use]
    pub fn exists(&self, project_path: &str) -> bool {
        self.state_path(project_path).exists()
    }

    /// Read and decode the record for `project_path`.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no record exists.
    /// - `CorruptState` when the bytes do not parse, the version is unsupported, the record
    ///   violates an invariant, or it belongs to a different project. The file is left as is.
    pub fn load(&self, project_path: &str) -> Result<WorkflowState, WaypointError> {
        let path = self.state_path(project_path);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WaypointError::NotFound {
                    project: project_path.to_string(),
                });
            }
            Err(e) => return Err(WaypointError::Io(e)),
        };

        let corrupt = |reason: String| {
            warn!(path = %path, reason = %reason, "refusing to load workflow state");
            WaypointError::CorruptState {
                path: path.to_string(),
                reason,
            }
        };

        let mut record: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        if !record.is_object() {
            return Err(corrupt("record is not a JSON object".to_string()));
        }
        migrate(&mut record).map_err(corrupt)?;

        let state: WorkflowState =
            serde_json::from_value(record).map_err(|e| corrupt(e.to_string()))?;
        state.check_invariants().map_err(corrupt)?;

        if state.project_path != project_path {
            return Err(corrupt(format!(
                "record belongs to project '{}'",
                state.project_path
            )));
        }

        debug!(path = %path, phase = %state.current_phase, "workflow state loaded");
        Ok(state)
    }

    /// Construct a fresh state for `project_path` without writing it.
    ///
    /// Fails with `AlreadyExists` when a record is present and `overwrite` is false.
    pub fn create(
        &self,
        project_path: &str,
        workflow_type: WorkflowType,
        overwrite: bool,
    ) -> Result<WorkflowState, WaypointError> {
        let path = self.state_path(project_path);
        if path.exists() {
            if !overwrite {
                return Err(WaypointError::AlreadyExists {
                    project: project_path.to_string(),
                    path: path.to_string(),
                });
            }
            warn!(path = %path, "existing workflow state will be replaced on next save");
        }

        Ok(WorkflowState::new(project_path, workflow_type, Utc::now()))
    }

    /// Persist `state` atomically and stamp `lastUpdated`.
    ///
    /// `lastUpdated` never moves backwards, even if the wall clock does. On failure nothing
    /// at the record path has changed and the error is `PersistFailed`.
    pub fn save(&self, state: &mut WorkflowState) -> Result<(), WaypointError> {
        let path = self.state_path(&state.project_path);
        state.last_updated = Utc::now().max(state.last_updated);

        let persist_failed = |reason: String| WaypointError::PersistFailed {
            path: path.to_string(),
            reason,
        };

        let json = emit_jcs(&*state).map_err(|e| persist_failed(format!("{e:#}")))?;
        let outcome =
            write_file_atomic(&path, &json).map_err(|e| persist_failed(format!("{e:#}")))?;

        info!(
            path = %path,
            phase = %state.current_phase,
            bytes = outcome.bytes_written,
            "workflow state saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PhaseState;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> StateManager {
        StateManager::new(Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap())
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = manager(&temp).load("/p1").unwrap_err();
        assert!(matches!(err, WaypointError::NotFound { .. }));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);

        let mut state = mgr.create("/p1", WorkflowType::SpecDriven, false).unwrap();
        state.custom_data.set_value("q-scope", serde_json::json!("cli only"));
        let before = state.last_updated;
        mgr.save(&mut state).unwrap();

        let loaded = mgr.load("/p1").unwrap();
        assert!(loaded.last_updated >= before);
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_create_refuses_existing_record() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let mut state = mgr.create("/p1", WorkflowType::from("demo"), false).unwrap();
        mgr.save(&mut state).unwrap();

        let err = mgr.create("/p1", WorkflowType::from("demo"), false).unwrap_err();
        assert!(matches!(err, WaypointError::AlreadyExists { .. }));

        let fresh = mgr.create("/p1", WorkflowType::from("demo"), true).unwrap();
        assert!(
            fresh
                .phases
                .values()
                .all(|p| p.status == PhaseState::NotStarted)
        );
    }

    #[test]
    fn test_truncated_record_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let mut state = mgr.create("/p1", WorkflowType::ProjectManagement, false).unwrap();
        mgr.save(&mut state).unwrap();

        let path = mgr.state_path("/p1");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = mgr.load("/p1").unwrap_err();
        assert!(matches!(err, WaypointError::CorruptState { .. }));
        assert!(err.display_for_user().contains(path.as_str()));
        assert_eq!(std::fs::read(&path).unwrap(), &bytes[..bytes.len() / 2]);
    }

    #[test]
    fn test_version_checked_first() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let path = mgr.state_path("/p1");
        waypoint_utils::paths::ensure_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"version":"7.0","anything":true}"#).unwrap();

        let err = mgr.load("/p1").unwrap_err();
        match err {
            WaypointError::CorruptState { reason, .. } => assert!(reason.contains("7.0")),
            other => panic!("expected CorruptState, got {other:?}"),
        }
    }

    #[test]
    fn test_colliding_key_is_not_silently_shared() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let mut state = mgr.create("/a-b", WorkflowType::from("demo"), false).unwrap();
        mgr.save(&mut state).unwrap();

        assert_eq!(mgr.state_path("/a-b"), mgr.state_path("/a_b"));
        let err = mgr.load("/a_b").unwrap_err();
        assert!(matches!(err, WaypointError::CorruptState { .. }));
    }

    #[test]
    fn test_saved_bytes_are_canonical() {
        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let mut state = mgr.create("/p1", WorkflowType::from("demo"), false).unwrap();
        mgr.save(&mut state).unwrap();

        let written = std::fs::read_to_string(mgr.state_path("/p1")).unwrap();
        assert_eq!(written, emit_jcs(&state).unwrap());
        assert!(written.starts_with("{\"activeWorkflows\":[]"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_home_is_persist_failed() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let mgr = manager(&temp);
        let state_dir = temp.path().join("state");
        std::fs::create_dir(&state_dir).unwrap();
        std::fs::set_permissions(&state_dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        let mut state = mgr.create("/p1", WorkflowType::from("demo"), false).unwrap();
        let result = mgr.save(&mut state);
        std::fs::set_permissions(&state_dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users bypass directory permissions
        if let Err(err) = result {
            assert!(matches!(err, WaypointError::PersistFailed { .. }));
            assert!(!err.is_recoverable());
            assert!(!mgr.exists("/p1"));
        }
    }
}
