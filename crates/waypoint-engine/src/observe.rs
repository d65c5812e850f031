//! Filesystem observer feeding the detector.
//!
//! Layout directories are resolved against the project root. A directory that does not
//! exist yields `None` for its category, so reconciliation leaves that category alone.

use std::fs;
use std::io;
use std::path::Path;

use globset::GlobSet;
use tracing::debug;

use waypoint_config::LayoutConfig;
use waypoint_detector::{ObservedItem, Observations};
use waypoint_utils::error::WaypointError;

/// Gather goal files, workflow directories and integration markers under `project_root`.
///
/// Every list is sorted by path so repeated observations of an unchanged tree are identical.
pub fn observe(project_root: &Path, layout: &LayoutConfig) -> Result<Observations, WaypointError> {
    let matcher = layout.goal_matcher()?;

    let mut goals: Option<Vec<ObservedItem>> = None;
    for dir in &layout.goals_dirs {
        if let Some(found) = goal_files(project_root, dir, &matcher)? {
            goals.get_or_insert_with(Vec::new).extend(found);
        }
    }
    if let Some(goals) = goals.as_mut() {
        goals.sort_by(|a, b| a.path.cmp(&b.path));
    }

    let workflows = list_entries(project_root, &layout.workflows_dir, EntryKind::Directory)?;
    let integrations = list_entries(project_root, &layout.integrations_dir, EntryKind::File)?;

    debug!(
        root = %project_root.display(),
        goals = goals.as_ref().map(Vec::len),
        workflows = workflows.as_ref().map(Vec::len),
        integrations = integrations.as_ref().map(Vec::len),
        "filesystem observed"
    );

    Ok(Observations {
        goals,
        workflows,
        integrations,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// Directory entries, or `None` when the directory is absent
fn read_dir_if_present(dir: &Path) -> Result<Option<fs::ReadDir>, WaypointError> {
    match fs::read_dir(dir) {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn goal_files(
    root: &Path,
    dir: &str,
    matcher: &GlobSet,
) -> Result<Option<Vec<ObservedItem>>, WaypointError> {
    let Some(entries) = read_dir_if_present(&root.join(dir))? else {
        return Ok(None);
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let (Some(name), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        if matcher.is_match(name) {
            found.push(ObservedItem::new(stem).at(format!("{dir}/{name}")));
        }
    }
    Ok(Some(found))
}

fn list_entries(
    root: &Path,
    dir: &str,
    kind: EntryKind,
) -> Result<Option<Vec<ObservedItem>>, WaypointError> {
    let Some(entries) = read_dir_if_present(&root.join(dir))? else {
        return Ok(None);
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let wanted = match kind {
            EntryKind::File => file_type.is_file(),
            EntryKind::Directory => file_type.is_dir(),
        };
        if !wanted {
            continue;
        }
        let path = entry.path();
        let id = match kind {
            EntryKind::File => path.file_stem(),
            EntryKind::Directory => path.file_name(),
        };
        let (Some(id), Some(name)) = (
            id.and_then(|s| s.to_str()),
            path.file_name().and_then(|n| n.to_str()),
        ) else {
            continue;
        };
        // hidden entries (.gitkeep, .DS_Store) are not markers
        if name.starts_with('.') {
            continue;
        }
        found.push(ObservedItem::new(id).at(format!("{dir}/{name}")));
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(Some(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(items: &Option<Vec<ObservedItem>>) -> Vec<&str> {
        items
            .as_ref()
            .map(|items| items.iter().map(|i| i.id.as_str()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_missing_directories_are_not_observed() {
        let temp = TempDir::new().unwrap();

        let observed = observe(temp.path(), &LayoutConfig::default()).unwrap();
        assert_eq!(observed, Observations::default());
    }

    #[test]
    fn test_lists_are_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("goals")).unwrap();
        fs::write(root.join("goals/g2.md"), "# Goal two").unwrap();
        fs::write(root.join("goals/g1.md"), "# Goal one").unwrap();
        fs::write(root.join("goals/notes.txt"), "scratch").unwrap();
        fs::create_dir_all(root.join("goals/drafts")).unwrap();
        fs::create_dir_all(root.join("workflows/beta")).unwrap();
        fs::create_dir_all(root.join("workflows/alpha")).unwrap();
        fs::create_dir_all(root.join(".waypoint/integrations")).unwrap();
        fs::write(root.join(".waypoint/integrations/spec-driven.json"), "{}").unwrap();
        fs::write(root.join(".waypoint/integrations/.gitkeep"), "").unwrap();

        let observed = observe(root, &LayoutConfig::default()).unwrap();
        assert_eq!(ids(&observed.goals), vec!["g1", "g2"]);
        assert_eq!(
            observed.goals.as_ref().unwrap()[0].path.as_deref(),
            Some("goals/g1.md")
        );
        assert_eq!(ids(&observed.workflows), vec!["alpha", "beta"]);
        assert_eq!(ids(&observed.integrations), vec!["spec-driven"]);
    }

    #[test]
    fn test_empty_directory_is_observed_as_empty() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("goals")).unwrap();

        let observed = observe(temp.path(), &LayoutConfig::default()).unwrap();
        assert_eq!(observed.goals, Some(Vec::new()));
        assert_eq!(observed.workflows, None);
    }

    #[test]
    fn test_multiple_goal_dirs_and_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("goals")).unwrap();
        fs::create_dir_all(root.join("roadmap")).unwrap();
        fs::write(root.join("goals/g1.md"), "").unwrap();
        fs::write(root.join("roadmap/r1.goal"), "").unwrap();

        let layout = LayoutConfig {
            goals_dirs: vec!["goals".to_string(), "roadmap".to_string()],
            goal_patterns: vec!["*.md".to_string(), "*.goal".to_string()],
            ..LayoutConfig::default()
        };
        let observed = observe(root, &layout).unwrap();
        assert_eq!(ids(&observed.goals), vec!["g1", "r1"]);
    }
}
