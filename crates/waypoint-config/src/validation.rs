use waypoint_utils::error::{ConfigError, WaypointError};

use super::Config;

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), WaypointError> {
        let mut errors = Vec::new();

        if let Some(max) = self.defaults.max_suggestions {
            if max == 0 {
                return Err(WaypointError::Config(ConfigError::InvalidValue {
                    key: "max_suggestions".to_string(),
                    value: "must be greater than 0".to_string(),
                }));
            }
            if max > 100 {
                return Err(WaypointError::Config(ConfigError::InvalidValue {
                    key: "max_suggestions".to_string(),
                    value: "exceeds maximum limit of 100".to_string(),
                }));
            }
        }

        if let Some(days) = self.defaults.review_after_days
            && days > 3650
        {
            return Err(WaypointError::Config(ConfigError::InvalidValue {
                key: "review_after_days".to_string(),
                value: "exceeds maximum limit of 3650 days".to_string(),
            }));
        }

        self.layout.goal_matcher()?;

        // Remaining layout problems are collected and reported together
        for dir in &self.layout.goals_dirs {
            if dir.trim().is_empty() {
                errors.push("goals_dirs entries must not be empty".to_string());
            }
        }
        if self.layout.workflows_dir.trim().is_empty() {
            errors.push("workflows_dir must not be empty".to_string());
        }
        if self.layout.integrations_dir.trim().is_empty() {
            errors.push("integrations_dir must not be empty".to_string());
        }

        if let Some(state_dir) = &self.storage.state_dir
            && state_dir.as_str().trim().is_empty()
        {
            errors.push("state_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            let error_count = errors.len();
            Err(WaypointError::Config(ConfigError::ValidationFailed {
                errors,
                error_count,
            }))
        }
    }
}
