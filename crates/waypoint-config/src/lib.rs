//! Configuration management for waypoint
//!
//! Hierarchical configuration with discovery and precedence: CLI > file > defaults.
//! Configuration files are TOML with optional `[defaults]`, `[storage]` and `[layout]`
//! sections, discovered at `.waypoint/config.toml`.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
