//! Exit code constants for the waypoint CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | Internal failure, including failed state writes |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `NOT_FOUND` | No workflow state for the project |
//! | 4 | `ALREADY_EXISTS` | Workflow state already initialized |
//! | 5 | `CORRUPT_STATE` | Persisted state failed to parse or version check |
//! | 6 | `BLOCKED` | Phase transition prerequisites not met |
//! | 7 | `INVALID_TARGET` | Unreachable phase or rejected goal/step/consumer argument |

use std::fmt;

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public API and will not change in 1.x releases.
///
/// ```rust
/// use waypoint_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::BLOCKED.as_i32(), 6);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from(0));
/// assert_eq!(ExitCode::NOT_FOUND.to_string(), "3 (not_found)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure, including a state write that did not complete
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// No workflow state exists for the project path
    pub const NOT_FOUND: ExitCode = ExitCode(3);

    /// Workflow state already exists and overwrite was not requested
    pub const ALREADY_EXISTS: ExitCode = ExitCode(4);

    /// Persisted state could not be trusted
    pub const CORRUPT_STATE: ExitCode = ExitCode(5);

    /// Phase transition blocked by unmet prerequisites
    pub const BLOCKED: ExitCode = ExitCode(6);

    /// Target phase (or goal, step, consumer) rejected
    pub const INVALID_TARGET: ExitCode = ExitCode(7);

    /// Get the numeric exit code value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Stable name of the code, shown next to the number in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "success",
            2 => "cli_args",
            3 => "not_found",
            4 => "already_exists",
            5 => "corrupt_state",
            6 => "blocked",
            7 => "invalid_target",
            _ => "internal",
        }
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::NOT_FOUND.as_i32(), 3);
        assert_eq!(ExitCode::ALREADY_EXISTS.as_i32(), 4);
        assert_eq!(ExitCode::CORRUPT_STATE.as_i32(), 5);
        assert_eq!(ExitCode::BLOCKED.as_i32(), 6);
        assert_eq!(ExitCode::INVALID_TARGET.as_i32(), 7);
    }

    #[test]
    fn test_unknown_codes_render_as_internal() {
        assert_eq!(ExitCode::from(42).name(), "internal");
        assert_eq!(ExitCode::BLOCKED.to_string(), "6 (blocked)");
        assert_eq!(i32::from(ExitCode::CORRUPT_STATE), 5);
    }
}
