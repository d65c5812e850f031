use camino::Utf8PathBuf;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use waypoint_utils::error::{ConfigError, WaypointError};

/// Suggestions returned by `next` when neither CLI nor file set a limit
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Days a selected goal may sit without any completion before a review is suggested
pub const DEFAULT_REVIEW_AFTER_DAYS: u32 = 14;

/// Configuration for waypoint operations.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that:
/// - Searches for `.waypoint/config.toml` upward from the current directory
/// - Stops at repository root markers (`.git`, `.hg`, `.svn`)
/// - Applies built-in defaults for unspecified values
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `config`, `programmatic`, or `default`)
/// for `waypoint status --verbose`.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// max_suggestions = 5
/// review_after_days = 14
///
/// [storage]
/// state_dir = ".waypoint"
///
/// [layout]
/// goals_dirs = ["goals/potential", "goals/selected"]
/// goal_patterns = ["*.md"]
/// workflows_dir = "workflows"
/// integrations_dir = ".waypoint/integrations"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values for engine behavior.
    pub defaults: Defaults,
    /// Where workflow state records live.
    pub storage: StorageConfig,
    /// Project layout scanned by the filesystem observer.
    pub layout: LayoutConfig,
    /// Source attribution for each setting (for status display).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Source of a configuration value for attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// Default configuration values
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub max_suggestions: Option<usize>,
    /// Age in days after which a stalled selected goal triggers a review suggestion
    pub review_after_days: Option<u32>,
    pub verbose: Option<bool>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            max_suggestions: Some(DEFAULT_MAX_SUGGESTIONS),
            review_after_days: Some(DEFAULT_REVIEW_AFTER_DAYS),
            verbose: Some(false),
        }
    }
}

/// State storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Overrides `WAYPOINT_HOME`; records land in `<state_dir>/state/`
    pub state_dir: Option<Utf8PathBuf>,
}

/// Project layout consulted when gathering observations.
///
/// All directories are relative to the project path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default = "default_goals_dirs")]
    pub goals_dirs: Vec<String>,
    #[serde(default = "default_goal_patterns")]
    pub goal_patterns: Vec<String>,
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: String,
    #[serde(default = "default_integrations_dir")]
    pub integrations_dir: String,
}

fn default_goals_dirs() -> Vec<String> {
    vec!["goals".to_string()]
}

fn default_goal_patterns() -> Vec<String> {
    vec!["*.md".to_string()]
}

fn default_workflows_dir() -> String {
    "workflows".to_string()
}

fn default_integrations_dir() -> String {
    ".waypoint/integrations".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            goals_dirs: default_goals_dirs(),
            goal_patterns: default_goal_patterns(),
            workflows_dir: default_workflows_dir(),
            integrations_dir: default_integrations_dir(),
        }
    }
}

impl LayoutConfig {
    /// Compile `goal_patterns` into a matcher for goal file names.
    pub fn goal_matcher(&self) -> Result<GlobSet, WaypointError> {
        if self.goal_patterns.is_empty() {
            return Err(WaypointError::Config(ConfigError::InvalidValue {
                key: "goal_patterns".to_string(),
                value: "at least one pattern is required".to_string(),
            }));
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.goal_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                WaypointError::Config(ConfigError::InvalidValue {
                    key: "goal_patterns".to_string(),
                    value: format!("{pattern}: {e}"),
                })
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| {
            WaypointError::Config(ConfigError::InvalidValue {
                key: "goal_patterns".to_string(),
                value: e.to_string(),
            })
        })
    }
}

impl Config {
    /// Effective suggestion limit
    #[must_use]
    pub fn max_suggestions(&self) -> usize {
        self.defaults
            .max_suggestions
            .unwrap_or(DEFAULT_MAX_SUGGESTIONS)
    }

    /// Effective review threshold in days
    #[must_use]
    pub fn review_after_days(&self) -> u32 {
        self.defaults
            .review_after_days
            .unwrap_or(DEFAULT_REVIEW_AFTER_DAYS)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Home directory for state records: `[storage].state_dir`, else the resolved waypoint home.
    #[must_use]
    pub fn state_home(&self) -> Utf8PathBuf {
        self.storage
            .state_dir
            .clone()
            .unwrap_or_else(waypoint_utils::paths::waypoint_home)
    }
}
