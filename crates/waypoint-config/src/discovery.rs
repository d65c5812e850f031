use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use waypoint_utils::error::{ConfigError, WaypointError};

use super::{CliArgs, Config, ConfigSource, Defaults, LayoutConfig, StorageConfig};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    storage: Option<StorageConfig>,
    layout: Option<LayoutConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no explicit
    /// path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
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

        let config_path = if let Some(explicit_path) = &cli_args.config_path {
            if !explicit_path.exists() {
                return Err(WaypointError::Config(ConfigError::NotFound {
                    path: explicit_path.display().to_string(),
                })
                .into());
            }
            Some(explicit_path.clone())
        } else {
            Self::discover_config_file_from(start_dir)?
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.max_suggestions.is_some() {
                    defaults.max_suggestions = file_defaults.max_suggestions;
                    source_attribution.insert("max_suggestions".to_string(), config_source.clone());
                }
                if file_defaults.review_after_days.is_some() {
                    defaults.review_after_days = file_defaults.review_after_days;
                    source_attribution
                        .insert("review_after_days".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
            }

            if let Some(file_storage) = file_config.storage
                && let Some(state_dir) = file_storage.state_dir
            {
                storage.state_dir = Some(resolve_against_project(path, state_dir));
                source_attribution.insert("state_dir".to_string(), config_source.clone());
            }

            // The [layout] table is applied whole; omitted keys fall back to their defaults
            if let Some(file_layout) = file_config.layout {
                layout = file_layout;
                for key in [
                    "goals_dirs",
                    "goal_patterns",
                    "workflows_dir",
                    "integrations_dir",
                ] {
                    source_attribution.insert(key.to_string(), config_source.clone());
                }
            }
        }

        // Apply CLI overrides (highest priority)
        if let Some(state_dir) = &cli_args.state_dir {
            storage.state_dir = Some(
                Utf8PathBuf::from_path_buf(state_dir.clone()).map_err(|p| {
                    WaypointError::Config(ConfigError::InvalidValue {
                        key: "state_dir".to_string(),
                        value: format!("{} is not valid UTF-8", p.display()),
                    })
                })?,
            );
            source_attribution.insert("state_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(max) = cli_args.max_suggestions {
            defaults.max_suggestions = Some(max);
            source_attribution.insert("max_suggestions".to_string(), ConfigSource::Cli);
        }
        if let Some(days) = cli_args.review_after_days {
            defaults.review_after_days = Some(days);
            source_attribution.insert("review_after_days".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            storage,
            layout,
            source_attribution,
        };

        config.validate()?;

        tracing::debug!(
            config_file = ?config_path,
            max_suggestions = config.max_suggestions(),
            "configuration resolved"
        );

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.waypoint/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".waypoint").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                anyhow::Error::new(WaypointError::Config(ConfigError::InvalidFile(
                    e.to_string(),
                )))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

/// Relative `state_dir` values are anchored at the project holding `.waypoint/config.toml`
fn resolve_against_project(config_path: &Path, state_dir: Utf8PathBuf) -> Utf8PathBuf {
    if state_dir.is_absolute() {
        return state_dir;
    }
    config_path
        .parent()
        .and_then(Path::parent)
        .and_then(|root| Utf8PathBuf::from_path_buf(root.to_path_buf()).ok())
        .map(|root| root.join(&state_dir))
        .unwrap_or(state_dir)
}
