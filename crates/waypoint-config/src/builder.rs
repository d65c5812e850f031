use camino::Utf8PathBuf;
use std::collections::HashMap;

use waypoint_utils::error::WaypointError;

use super::{Config, ConfigSource, Defaults, LayoutConfig, StorageConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding waypoint and deterministic behavior independent of the
    /// user's environment and config files is required.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint_config::Config;
    ///
    /// let config = Config::builder()
    ///     .state_dir("/tmp/waypoint-state")
    ///     .max_suggestions(3)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.max_suggestions(), 3);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    state_dir: Option<Utf8PathBuf>,
    max_suggestions: Option<usize>,
    review_after_days: Option<u32>,
    verbose: Option<bool>,
    goals_dirs: Option<Vec<String>>,
    goal_patterns: Option<Vec<String>>,
    workflows_dir: Option<String>,
    integrations_dir: Option<String>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the `state/` record directory.
    #[must_use]
    pub fn state_dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.state_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = Some(max);
        self
    }

    #[must_use]
    pub fn review_after_days(mut self, days: u32) -> Self {
        self.review_after_days = Some(days);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn goals_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn goal_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goal_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn workflows_dir(mut self, dir: impl Into<String>) -> Self {
        self.workflows_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn integrations_dir(mut self, dir: impl Into<String>) -> Self {
        self.integrations_dir = Some(dir.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, WaypointError> {
        let mut source_attribution = HashMap::new();
        let mut defaults = Defaults::default();
        let mut storage = StorageConfig::default();
        let mut layout = LayoutConfig::default();

        for key in [
            "max_suggestions",
            "review_after_days",
            "verbose",
            "state_dir",
            "goals_dirs",
            "goal_patterns",
            "workflows_dir",
            "integrations_dir",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let mut set = |key: &str| {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        };

        if let Some(dir) = self.state_dir {
            storage.state_dir = Some(dir);
            set("state_dir");
        }
        if let Some(max) = self.max_suggestions {
            defaults.max_suggestions = Some(max);
            set("max_suggestions");
        }
        if let Some(days) = self.review_after_days {
            defaults.review_after_days = Some(days);
            set("review_after_days");
        }
        if let Some(verbose) = self.verbose {
            defaults.verbose = Some(verbose);
            set("verbose");
        }
        if let Some(dirs) = self.goals_dirs {
            layout.goals_dirs = dirs;
            set("goals_dirs");
        }
        if let Some(patterns) = self.goal_patterns {
            layout.goal_patterns = patterns;
            set("goal_patterns");
        }
        if let Some(dir) = self.workflows_dir {
            layout.workflows_dir = dir;
            set("workflows_dir");
        }
        if let Some(dir) = self.integrations_dir {
            layout.integrations_dir = dir;
            set("integrations_dir");
        }

        let config = Config {
            defaults,
            storage,
            layout,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
