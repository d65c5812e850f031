//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Installs the tracing subscriber
//! - Dispatches to command handlers
//! - Handles all error output

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::debug;

use super::args::{BlockerCommands, ClarifyCommands, Cli, Commands, GoalCommands};
use super::commands;

use crate::{CliArgs, Config, ExitCode, GoalDetail, WaypointError, WorkflowHandle};
use waypoint_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// All output, errors included, is printed here. main.rs only exits with the returned code.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        state_dir: cli.state_dir.clone(),
        max_suggestions: None,
        review_after_days: cli.review_after_days,
        verbose: cli.verbose.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report(&err, "config", ExitCode::CLI_ARGS)),
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }

    let operation = cli.command.operation();
    debug!(
        operation,
        state_home = %config.state_home(),
        "dispatching command"
    );
    let handle = WorkflowHandle::from_config(config);

    match dispatch(&handle, cli.command) {
        Ok(()) => Ok(()),
        Err(err) => Err(report(&err, operation, ExitCode::INTERNAL)),
    }
}

fn dispatch(handle: &WorkflowHandle, command: Commands) -> Result<()> {
    match command {
        Commands::Init {
            project,
            workflow_type,
            force,
            json,
        } => commands::execute_init_command(
            handle,
            &project_key(&project.project)?,
            &workflow_type,
            force,
            json,
        ),
        Commands::Next {
            project,
            max,
            skip_sync,
            json,
        } => commands::execute_next_command(
            handle,
            &project_key(&project.project)?,
            max,
            skip_sync,
            json,
        ),
        Commands::Status { project, json } => {
            commands::execute_status_command(handle, &project_key(&project.project)?, json)
        }
        Commands::Advance {
            project,
            to,
            skip_validation,
            json,
        } => commands::execute_advance_command(
            handle,
            &project_key(&project.project)?,
            to.as_deref(),
            skip_validation,
            json,
        ),
        Commands::Validate { project, json } => {
            commands::execute_validate_command(handle, &project_key(&project.project)?, json)
        }
        Commands::Handoff {
            project,
            consumer,
            goal_id,
            json,
        } => commands::execute_handoff_command(
            handle,
            &project_key(&project)?,
            &consumer,
            &goal_id,
            json,
        ),
        Commands::Sync { project, json } => {
            commands::execute_sync_command(handle, &project_key(&project.project)?, json)
        }
        Commands::Step {
            project,
            step,
            phase,
            json,
        } => commands::execute_step_command(
            handle,
            &project_key(&project)?,
            phase.as_deref(),
            &step,
            json,
        ),
        Commands::Goal(goal) => dispatch_goal(handle, goal),
        Commands::Blocker(blocker) => dispatch_blocker(handle, blocker),
        Commands::Feature {
            project,
            name,
            json,
        } => commands::execute_feature_command(handle, &project_key(&project)?, &name, json),
        Commands::Clarify(clarify) => dispatch_clarify(handle, clarify),
        Commands::Complete {
            project,
            skip_validation,
            json,
        } => commands::execute_complete_command(
            handle,
            &project_key(&project.project)?,
            skip_validation,
            json,
        ),
    }
}

fn dispatch_goal(handle: &WorkflowHandle, command: GoalCommands) -> Result<()> {
    match command {
        GoalCommands::Add {
            project,
            goal_id,
            name,
            description,
            impact,
            effort,
        } => {
            let detail = (name.is_some()
                || description.is_some()
                || impact.is_some()
                || effort.is_some())
            .then(|| GoalDetail {
                name: name.unwrap_or_else(|| goal_id.clone()),
                description: description.unwrap_or_default(),
                impact,
                effort,
            });
            commands::execute_goal_add_command(handle, &project_key(&project)?, &goal_id, detail)
        }
        GoalCommands::Promote { project, goal_id } => commands::execute_goal_move_command(
            handle,
            &project_key(&project)?,
            &goal_id,
            "promote",
        ),
        GoalCommands::Complete { project, goal_id } => commands::execute_goal_move_command(
            handle,
            &project_key(&project)?,
            &goal_id,
            "complete",
        ),
        GoalCommands::Archive { project, goal_id } => commands::execute_goal_move_command(
            handle,
            &project_key(&project)?,
            &goal_id,
            "archive",
        ),
    }
}

fn dispatch_blocker(handle: &WorkflowHandle, command: BlockerCommands) -> Result<()> {
    match command {
        BlockerCommands::Add {
            project,
            description,
        } => {
            commands::execute_blocker_add_command(handle, &project_key(&project)?, &description)
        }
        BlockerCommands::Resolve { project, id } => {
            commands::execute_blocker_resolve_command(handle, &project_key(&project)?, &id)
        }
    }
}

fn dispatch_clarify(handle: &WorkflowHandle, command: ClarifyCommands) -> Result<()> {
    match command {
        ClarifyCommands::Add { project, question } => {
            commands::execute_clarify_add_command(handle, &project_key(&project)?, &question)
        }
        ClarifyCommands::Resolve { project, question } => {
            commands::execute_clarify_resolve_command(handle, &project_key(&project)?, &question)
        }
    }
}

/// Absolute, UTF-8 form of the project directory; the state record is keyed by it.
///
/// The directory does not have to exist, so this is not a canonicalization.
fn project_key(project: &Path) -> Result<String> {
    let absolute = std::path::absolute(project)
        .with_context(|| format!("Failed to resolve project path: {}", project.display()))?;
    path_to_string(&absolute)
}

fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .with_context(|| format!("Project path is not valid UTF-8: {}", path.display()))
}

/// Print the error for the user and map it to an exit code; `fallback` covers untyped errors
fn report(err: &anyhow::Error, operation: &str, fallback: ExitCode) -> ExitCode {
    let code = match err.downcast_ref::<WaypointError>() {
        Some(waypoint_err) => {
            eprint!("{}", waypoint_err.display_for_user());
            waypoint_err.to_exit_code()
        }
        None => {
            eprintln!("✗ {operation} failed: {err:#}");
            fallback
        }
    };
    debug!(operation, exit_code = %code, "command failed");
    code
}
