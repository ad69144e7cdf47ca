//! Exit codes for the dp-core CLI.
//!
//! Ranges:
//! - 0: success
//! - 10-19: caller errors (bad arguments, input files or configuration)
//! - 20-29: consistency and internal errors

use dp_common::{Error, ErrorCategory};

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,

    /// Invalid command-line arguments.
    ArgsError = 10,
    /// The diagram, strategy or request is invalid.
    InputError = 11,
    /// The model configuration could not be loaded or is invalid.
    ConfigError = 12,

    /// A strategy or solution violates a structural invariant.
    ConsistencyError = 20,
    /// Internal error (bug).
    InternalError = 21,
    /// Reading or writing a file failed.
    IoError = 22,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Ok
    }

    /// Whether the caller can fix the failure by changing the invocation.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Name used in JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ConsistencyError => "ERR_CONSISTENCY",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Request => ExitCode::InputError,
            ErrorCategory::Consistency => ExitCode::ConsistencyError,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Io => match err {
                Error::Json(_) => ExitCode::InputError,
                _ => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
