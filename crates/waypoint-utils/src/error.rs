use std::fmt;
use std::io;
use thiserror::Error;

/// Library-level error type with user-friendly reporting.
///
/// `WaypointError` is returned by every waypoint operation that can fail. Apart from
/// [`PersistFailed`](Self::PersistFailed) and [`Io`](Self::Io), every variant is a
/// recoverable, typed outcome: the caller decides whether to re-initialize, pick another
/// phase, or show the message to the user.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration errors |
/// | 3 | `NotFound` |
/// | 4 | `AlreadyExists` |
/// | 5 | `CorruptState` |
/// | 6 | `Blocked` |
/// | 7 | `InvalidTarget` and other rejected arguments |
/// | 1 | Persistence / IO failures |
///
/// # Example
///
/// ```rust
/// use waypoint_utils::error::WaypointError;
/// use waypoint_utils::exit_codes::ExitCode;
///
/// let err = WaypointError::Blocked {
///     from: "goal-development".to_string(),
///     target: "execution".to_string(),
///     blockers: vec!["At least one selected goal is required".to_string()],
/// };
/// assert!(err.display_for_user().contains("selected goal"));
/// assert_eq!(err.to_exit_code(), ExitCode::BLOCKED);
/// ```
#[derive(Error, Debug)]
pub enum WaypointError {
    #[error("No workflow state found for project {project}")]
    NotFound { project: String },

    #[error("Workflow state already exists for project {project} at {path}")]
    AlreadyExists { project: String, path: String },

    #[error("Workflow state at {path} is corrupt: {reason}")]
    CorruptState { path: String, reason: String },

    #[error("Transition from {from} to {target} is blocked by {n} unmet prerequisite(s)", n = .blockers.len())]
    Blocked {
        from: String,
        target: String,
        blockers: Vec<String>,
    },

    #[error("Phase {target} is not reachable from {from}: {reason}")]
    InvalidTarget {
        from: String,
        target: String,
        reason: String,
    },

    #[error("Goal {goal_id} is not tracked by this workflow")]
    UnknownGoal { goal_id: String },

    #[error("Goal {goal_id} cannot move from {from} to {to}")]
    InvalidGoalTransition {
        goal_id: String,
        from: String,
        to: String,
    },

    #[error("Unknown handoff consumer {consumer}")]
    UnknownConsumer {
        consumer: String,
        known: Vec<String>,
    },

    #[error("Step {step} is not defined for phase {phase}")]
    UnknownStep { phase: String, step: String },

    #[error("Blocker {id} is not recorded")]
    UnknownBlocker { id: String },

    #[error("{operation} does not apply to {workflow_type} workflows")]
    UnsupportedOperation {
        operation: String,
        workflow_type: String,
        supported: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to persist workflow state at {path}: {reason}")]
    PersistFailed { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    State,
    Transition,
    Goals,
    Handoff,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::State => write!(f, "Workflow State"),
            Self::Transition => write!(f, "Phase Transition"),
            Self::Goals => write!(f, "Goals"),
            Self::Handoff => write!(f, "Handoff"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
            Self::ValidationFailed { errors, .. } => format!(
                "Configuration validation failed with {} errors: {}",
                errors.len(),
                errors.join(", ")
            ),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults], [storage] and [layout] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "waypoint searches for .waypoint/config.toml from the current directory up to the repository root."
                    .to_string(),
            ),
            Self::ValidationFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .waypoint/config.toml".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "max_suggestions" => vec!["Use a positive integer (e.g. 5)".to_string()],
                "review_after_days" => vec!["Use a non-negative number of days".to_string()],
                "goal_patterns" => vec![
                    "Use glob patterns such as '*.md'".to_string(),
                    "Provide at least one pattern".to_string(),
                ],
                _ => vec!["Check the documentation for valid values".to_string()],
            },
            Self::NotFound { .. } => vec![
                "Create .waypoint/config.toml or drop the --config flag to use defaults"
                    .to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Pass an explicit path with --config".to_string()]
            }
            Self::ValidationFailed { errors, .. } => errors
                .iter()
                .map(|error| format!("Fix: {error}"))
                .collect(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for WaypointError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { project } => {
                format!("No workflow has been initialized for '{project}'")
            }
            Self::AlreadyExists { project, .. } => {
                format!("A workflow is already initialized for '{project}'")
            }
            Self::CorruptState { path, reason } => {
                format!("The workflow state file {path} could not be trusted: {reason}")
            }
            Self::Blocked {
                from,
                target,
                blockers,
            } => {
                let mut message =
                    format!("Cannot advance from '{from}' to '{target}' yet. Outstanding items:");
                for blocker in blockers {
                    message.push_str(&format!("\n  - {blocker}"));
                }
                message
            }
            Self::InvalidTarget {
                from,
                target,
                reason,
            } => format!("Cannot move from phase '{from}' to '{target}': {reason}"),
            Self::UnknownGoal { goal_id } => {
                format!("Goal '{goal_id}' is not tracked by this workflow")
            }
            Self::InvalidGoalTransition { goal_id, from, to } => {
                format!("Goal '{goal_id}' is {from} and cannot be moved to {to}")
            }
            Self::UnknownConsumer { consumer, .. } => {
                format!("'{consumer}' is not a known handoff consumer")
            }
            Self::UnknownStep { phase, step } => {
                format!("Phase '{phase}' has no step named '{step}'")
            }
            Self::UnknownBlocker { id } => format!("No blocker with id '{id}' is recorded"),
            Self::UnsupportedOperation {
                operation,
                workflow_type,
                ..
            } => format!("'{operation}' is not available for a {workflow_type} workflow"),
            Self::Config(err) => err.user_message(),
            Self::PersistFailed { path, reason } => {
                format!("Workflow state was NOT saved to {path}: {reason}")
            }
            Self::Io(err) => format!("File system error: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Workflow state is created once per project with `waypoint init`.".to_string())
            }
            Self::AlreadyExists { path, .. } => Some(format!(
                "The existing record at {path} is kept as an audit trail and is never overwritten implicitly."
            )),
            Self::CorruptState { .. } => Some(
                "State records are never repaired silently. The file was left untouched.".to_string(),
            ),
            Self::Blocked { .. } => Some(
                "Phase transitions are gated on completion criteria of the current workflow state."
                    .to_string(),
            ),
            Self::InvalidTarget { .. } => {
                Some("Phases only move forward through the workflow's phase ordering.".to_string())
            }
            Self::InvalidGoalTransition { .. } => Some(
                "Goals move potential → selected → completed, and any goal may be archived."
                    .to_string(),
            ),
            Self::Config(err) => err.context(),
            Self::PersistFailed { .. } | Self::Io(_) => Some(
                "The state file is written through a temporary file and an atomic rename.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { project } => vec![format!(
                "Run `waypoint init {project} --type <workflow-type>` to start a workflow"
            )],
            Self::AlreadyExists { project, .. } => vec![
                format!("Use `waypoint status {project}` to inspect the existing workflow"),
                "Pass --force to discard it and start again".to_string(),
            ],
            Self::CorruptState { .. } => vec![
                "Restore the file from version control or a backup".to_string(),
                "Re-initialize with `waypoint init <project> --force`".to_string(),
            ],
            Self::Blocked { .. } => vec![
                "Resolve the items listed above, then retry".to_string(),
                "Use --skip-validation to force the transition (recorded in the audit trail)"
                    .to_string(),
            ],
            Self::InvalidTarget { .. } => vec![
                "Run `waypoint status <project>` to see the phase ordering".to_string(),
                "Model rework as a new step inside the current phase".to_string(),
            ],
            Self::UnknownGoal { .. } => vec![
                "Run `waypoint sync <project>` to pick up goal files from disk".to_string(),
                "Add the goal with `waypoint goal add <project> <goal-id>`".to_string(),
            ],
            Self::InvalidGoalTransition { .. } => {
                vec!["Check the goal's current list with `waypoint status <project>`".to_string()]
            }
            Self::UnknownConsumer { known, .. } => {
                vec![format!("Known consumers: {}", known.join(", "))]
            }
            Self::UnknownStep { .. } => {
                vec!["Run `waypoint status <project>` to list the phase's steps".to_string()]
            }
            Self::UnknownBlocker { .. } => {
                vec!["List open blockers with `waypoint status <project>`".to_string()]
            }
            Self::UnsupportedOperation { supported, .. } => {
                vec![format!("Only {supported} workflows record this")]
            }
            Self::Config(err) => err.suggestions(),
            Self::PersistFailed { .. } | Self::Io(_) => vec![
                "Check disk space and permissions of the state directory".to_string(),
                "Set WAYPOINT_HOME or --state-dir to a writable location".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::CorruptState { .. } => {
                ErrorCategory::State
            }
            Self::Blocked { .. } | Self::InvalidTarget { .. } | Self::UnknownStep { .. } => {
                ErrorCategory::Transition
            }
            Self::UnknownBlocker { .. } => ErrorCategory::Transition,
            Self::UnsupportedOperation { .. } => ErrorCategory::State,
            Self::UnknownGoal { .. } | Self::InvalidGoalTransition { .. } => ErrorCategory::Goals,
            Self::UnknownConsumer { .. } => ErrorCategory::Handoff,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::PersistFailed { .. } | Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl WaypointError {
    /// Render the error with context and suggestions for an end user.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the CLI exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::NotFound { .. } => ExitCode::NOT_FOUND,
            Self::AlreadyExists { .. } => ExitCode::ALREADY_EXISTS,
            Self::CorruptState { .. } => ExitCode::CORRUPT_STATE,
            Self::Blocked { .. } => ExitCode::BLOCKED,
            Self::InvalidTarget { .. }
            | Self::UnknownGoal { .. }
            | Self::InvalidGoalTransition { .. }
            | Self::UnknownConsumer { .. }
            | Self::UnknownStep { .. }
            | Self::UnknownBlocker { .. }
            | Self::UnsupportedOperation { .. } => ExitCode::INVALID_TARGET,
            Self::PersistFailed { .. } | Self::Io(_) => ExitCode::INTERNAL,
        }
    }

    /// Whether the caller can recover without operator intervention on the host.
    ///
    /// Only failed writes are fatal: "save succeeded" must mean "durable".
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::PersistFailed { .. } | Self::Io(_))
    }

    /// Itemized blockers for a [`Blocked`](Self::Blocked) error.
    #[must_use]
    pub fn blockers(&self) -> Option<&[String]> {
        match self {
            Self::Blocked { blockers, .. } => Some(blockers),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_blocked_lists_every_blocker_verbatim() {
        let err = WaypointError::Blocked {
            from: "goal-development".to_string(),
            target: "execution".to_string(),
            blockers: vec![
                "At least one selected goal is required before entering 'execution'".to_string(),
                "Step 'select-goals' of phase 'goal-development' is not complete".to_string(),
            ],
        };

        let rendered = err.display_for_user();
        assert!(rendered.contains("selected goal is required"));
        assert!(rendered.contains("'select-goals'"));
        assert!(rendered.contains("Suggestions:"));
        assert_eq!(err.blockers().map(<[String]>::len), Some(2));
        assert_eq!(
            err.to_string(),
            "Transition from goal-development to execution is blocked by 2 unmet prerequisite(s)"
        );
    }

    #[test]
    fn test_corrupt_state_is_human_readable() {
        let err = WaypointError::CorruptState {
            path: "/tmp/state/p1.json".to_string(),
            reason: "EOF while parsing an object at line 1 column 40".to_string(),
        };

        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: The workflow state file /tmp/state/p1.json"));
        assert!(rendered.contains("never repaired silently"));
        assert_eq!(err.category(), ErrorCategory::State);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_exit_code_mapping() {
        let cases = [
            (
                WaypointError::NotFound {
                    project: "/p1".to_string(),
                },
                ExitCode::NOT_FOUND,
            ),
            (
                WaypointError::AlreadyExists {
                    project: "/p1".to_string(),
                    path: "x".to_string(),
                },
                ExitCode::ALREADY_EXISTS,
            ),
            (
                WaypointError::InvalidTarget {
                    from: "b".to_string(),
                    target: "a".to_string(),
                    reason: "earlier phase".to_string(),
                },
                ExitCode::INVALID_TARGET,
            ),
            (
                WaypointError::Config(ConfigError::InvalidFile("bad".to_string())),
                ExitCode::CLI_ARGS,
            ),
            (
                WaypointError::PersistFailed {
                    path: "x".to_string(),
                    reason: "disk full".to_string(),
                },
                ExitCode::INTERNAL,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_exit_code(), expected, "{err}");
        }
    }

    #[test]
    fn test_persist_failure_is_fatal() {
        let err = WaypointError::PersistFailed {
            path: "/ro/state.json".to_string(),
            reason: "Permission denied".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert!(err.display_for_user().contains("NOT saved"));
    }

    #[test]
    fn test_unsupported_operation_names_the_domain() {
        let err = WaypointError::UnsupportedOperation {
            operation: "set_feature_name".to_string(),
            workflow_type: "project-management".to_string(),
            supported: "spec-driven".to_string(),
        };
        assert_eq!(err.to_exit_code(), ExitCode::INVALID_TARGET);
        assert_eq!(err.category(), ErrorCategory::State);
        let rendered = err.display_for_user();
        assert!(rendered.contains("project-management workflow"));
        assert!(rendered.contains("Only spec-driven workflows"));
    }

    #[test]
    fn test_config_suggestions_are_key_specific() {
        let err = ConfigError::InvalidValue {
            key: "max_suggestions".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(err.suggestions(), vec!["Use a positive integer (e.g. 5)"]);
    }
}
