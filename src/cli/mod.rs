//! Command-line interface for waypoint
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions (clap)
//! - `run`: entry point, configuration discovery and error reporting
//! - `commands`: command implementations

pub mod args;
mod commands;
mod run;

pub use args::{BlockerCommands, ClarifyCommands, Cli, Commands, GoalCommands};
pub use run::run;
