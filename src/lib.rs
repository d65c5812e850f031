//! waypoint - stateful workflow orchestration core
//!
//! waypoint tracks where a multi-phase workflow is, notices when the project directory has
//! drifted from what was recorded, ranks what to do next, gates phase transitions on their
//! prerequisites, and prepares structured handoffs to downstream tools.
//!
//! waypoint can be used in two ways:
//! - **CLI**: the `waypoint` binary
//! - **Library**: embed [`WorkflowHandle`] in a tool server
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! waypoint init . --type project-management
//! waypoint next .
//! waypoint step . create-structure
//! waypoint advance . --json
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use waypoint::{Config, WorkflowHandle};
//!
//! let config = Config::builder().state_dir("/tmp/waypoint-home").build()?;
//! let handle = WorkflowHandle::from_config(config);
//! handle.initialize("/work/checkout", "spec-driven", false)?;
//! let status = handle.get_status("/work/checkout")?;
//! println!("{} is in {}", status.name, status.current_phase);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # JSON Contracts
//!
//! State records and `--json` output are emitted in JCS (RFC 8785) canonical form. Use
//! [`emit_jcs`] for your own integrations.
//!
//! # Stable Public API
//!
//! The following re-exports are the stable surface for 1.x releases:
//!
//! - [`WorkflowHandle`], [`StatusReport`], [`NextStepsReport`]
//! - [`WorkflowState`] and its parts, [`WorkflowType`]
//! - [`Config`], [`ConfigBuilder`], [`CliArgs`]
//! - [`WaypointError`], [`ExitCode`]
//! - Pure components: [`reconcile`], [`suggest_next`], [`can_advance`], [`advance`],
//!   [`prepare_handoff`]
//!
//! Anything reached through `waypoint::cli` is not covered by semver.

pub mod cli;

pub use waypoint_config::{CliArgs, Config, ConfigBuilder, ConfigSource, LayoutConfig};
pub use waypoint_detector::{
    ChangeType, DriftCategory, DriftRecord, ObservedItem, Observations, Reconciliation,
    reconcile,
};
pub use waypoint_engine::{
    GoalCounts, NextStepsReport, PhaseProgress, StatusReport, WorkflowHandle, observe,
};
pub use waypoint_gate::{
    GateCondition, TransitionCheck, advance, begin, can_advance, can_complete, complete_workflow,
    readiness,
};
pub use waypoint_handoff::{
    Consumer, GoalContext, HandoffContext, HandoffResult, SuggestedCall, goal_context,
    prepare_builtin_handoff, prepare_handoff,
};
pub use waypoint_rules::{
    NextSteps, NextStepsStatus, PriorityTier, Rule, RuleContext, Suggestion, builtin_rules,
    suggest_next,
};
pub use waypoint_state::{
    Blocker, CustomData, GoalDetail, GoalStage, IntegrationRecord, PhaseState, PhaseStatus,
    StateManager, TransitionRecord, WorkflowState, WorkflowType,
};
pub use waypoint_utils::canonicalization::emit_jcs;
pub use waypoint_utils::error::{ConfigError, UserFriendlyError, WaypointError};
pub use waypoint_utils::exit_codes::ExitCode;
