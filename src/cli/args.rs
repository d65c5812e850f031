//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// waypoint - stateful workflow orchestration
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Track multi-phase workflows, reconcile drift, and suggest what to do next")]
#[command(long_about = r#"
waypoint keeps one durable state record per project directory and guides the
project through its workflow's phases.

EXAMPLES:
  # Start a project-management workflow for the current directory
  waypoint init . --type project-management

  # Reconcile with goal files on disk and list ranked next steps
  waypoint next .

  # Record progress
  waypoint step . create-structure
  waypoint goal add . faster-checkout --name "Faster checkout"
  waypoint goal promote . faster-checkout

  # Check prerequisites, then move on
  waypoint validate .
  waypoint advance .

  # Prepare a call that hands a goal to a downstream tool
  waypoint handoff . spec-driven faster-checkout --json

  # Spec-driven workflows
  waypoint feature . checkout
  waypoint clarify add . "Is guest checkout in scope?"

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .waypoint/config.toml
  State records live under $WAYPOINT_HOME/state (default ~/.waypoint/state)

WORKFLOW TYPES:
  project-management  initialization → goal-development → execution → completion
  spec-driven         constitution → specification → clarification → planning → tasks → implementation
  any other name      initialization → planning → execution → completion
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding workflow state records (overrides WAYPOINT_HOME)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Days a selected goal may go without progress before a review is suggested
    #[arg(long, global = true)]
    pub review_after_days: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Project directory the workflow belongs to.
///
/// Only commands without further positionals default it, since clap cannot place an optional
/// positional before a required one.
#[derive(Args, Debug, Clone)]
pub struct ProjectArg {
    /// Project directory (the state record is keyed by its absolute path)
    #[arg(default_value = ".")]
    pub project: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a workflow for a project and start its first phase
    ///
    /// EXAMPLES:
    ///   waypoint init . --type spec-driven
    ///   waypoint init ~/work/checkout --force
    Init {
        #[command(flatten)]
        project: ProjectArg,

        /// Workflow type: project-management, spec-driven, or any name for the generic phases
        #[arg(long = "type", short = 't', default_value = "project-management")]
        workflow_type: String,

        /// Replace an existing workflow record
        #[arg(long)]
        force: bool,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile with the filesystem and list ranked next steps
    Next {
        #[command(flatten)]
        project: ProjectArg,

        /// Maximum number of suggestions (default from config)
        #[arg(long)]
        max: Option<usize>,

        /// Do not reconcile with the filesystem first
        #[arg(long)]
        skip_sync: bool,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Show phase progress, goals, integrations and blockers
    Status {
        #[command(flatten)]
        project: ProjectArg,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Advance to the next phase (or a later one with --to)
    Advance {
        #[command(flatten)]
        project: ProjectArg,

        /// Target phase (default: the next phase)
        #[arg(long)]
        to: Option<String>,

        /// Advance even if prerequisites are unmet (recorded in the audit trail)
        #[arg(long)]
        skip_validation: bool,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the next transition's prerequisites are met
    Validate {
        #[command(flatten)]
        project: ProjectArg,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Prepare the call that hands a goal to a downstream consumer
    ///
    /// EXAMPLES:
    ///   waypoint handoff . spec-driven faster-checkout
    ///   waypoint handoff . task-executor faster-checkout --json
    Handoff {
        /// Project directory
        project: PathBuf,

        /// Consumer name (spec-driven, task-executor)
        consumer: String,

        /// Goal to hand off
        goal_id: String,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile the recorded state with the project directory
    Sync {
        #[command(flatten)]
        project: ProjectArg,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a step of the current (or given) phase complete
    Step {
        /// Project directory
        project: PathBuf,

        /// Step id, e.g. create-structure
        step: String,

        /// Phase the step belongs to (default: the current phase)
        #[arg(long)]
        phase: Option<String>,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Record and resolve blockers
    #[command(subcommand)]
    Blocker(BlockerCommands),

    /// Name the feature a spec-driven workflow specifies
    ///
    /// EXAMPLES:
    ///   waypoint feature . checkout
    Feature {
        /// Project directory
        project: PathBuf,

        /// Feature name
        name: String,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Open and resolve clarification questions (spec-driven workflows)
    #[command(subcommand)]
    Clarify(ClarifyCommands),

    /// Complete the workflow at its terminal phase (the record is kept)
    Complete {
        #[command(flatten)]
        project: ProjectArg,

        /// Complete even if prerequisites are unmet (recorded in the audit trail)
        #[arg(long)]
        skip_validation: bool,

        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },
}

/// Goal lifecycle commands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Track a new potential goal
    Add {
        /// Project directory
        project: PathBuf,

        goal_id: String,

        /// Human-readable name
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        impact: Option<String>,

        #[arg(long)]
        effort: Option<String>,
    },

    /// Move a potential goal to selected
    Promote {
        /// Project directory
        project: PathBuf,

        goal_id: String,
    },

    /// Move a selected goal to completed
    Complete {
        /// Project directory
        project: PathBuf,

        goal_id: String,
    },

    /// Archive a goal from any other list
    Archive {
        /// Project directory
        project: PathBuf,

        goal_id: String,
    },
}

/// Blocker commands
#[derive(Subcommand)]
pub enum BlockerCommands {
    /// Record a blocker; every open blocker gates phase transitions
    Add {
        /// Project directory
        project: PathBuf,

        description: String,
    },

    /// Resolve a blocker by id (e.g. B-1)
    Resolve {
        /// Project directory
        project: PathBuf,

        id: String,
    },
}

/// Clarification commands
#[derive(Subcommand)]
pub enum ClarifyCommands {
    /// Open a question; open questions block planning
    Add {
        /// Project directory
        project: PathBuf,

        question: String,
    },

    /// Resolve an open question, matched by its exact text
    Resolve {
        /// Project directory
        project: PathBuf,

        question: String,
    },
}

impl Commands {
    /// Operation name used in error reports
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Next { .. } => "next",
            Self::Status { .. } => "status",
            Self::Advance { .. } => "advance",
            Self::Validate { .. } => "validate",
            Self::Handoff { .. } => "handoff",
            Self::Sync { .. } => "sync",
            Self::Step { .. } => "step",
            Self::Goal(_) => "goal",
            Self::Blocker(_) => "blocker",
            Self::Feature { .. } => "feature",
            Self::Clarify(_) => "clarify",
            Self::Complete { .. } => "complete",
        }
    }
}
