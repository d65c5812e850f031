use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn stable_source_label(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::ConfigFile(_) => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Defaults => "default",
    }
}

fn source_label(source: Option<&ConfigSource>) -> String {
    match source {
        Some(src) => stable_source_label(src).to_string(),
        None => stable_source_label(&ConfigSource::Defaults).to_string(),
    }
}

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add_config("max_suggestions", self.max_suggestions().to_string());
        add_config("review_after_days", self.review_after_days().to_string());
        add_config("verbose", self.verbose().to_string());
        add_config("state_dir", self.state_home().to_string());
        add_config("goals_dirs", self.layout.goals_dirs.join(", "));
        add_config("goal_patterns", self.layout.goal_patterns.join(", "));
        add_config("workflows_dir", self.layout.workflows_dir.clone());
        add_config("integrations_dir", self.layout.integrations_dir.clone());

        config
    }
}
