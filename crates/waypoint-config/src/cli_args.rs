use std::path::PathBuf;

/// CLI arguments for configuration override
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub max_suggestions: Option<usize>,
    pub review_after_days: Option<u32>,
    pub verbose: Option<bool>,
}
