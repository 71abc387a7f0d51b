//! Error types for driver runs.
//!
//! A parser error is not in here: it is an ordinary result code that flows
//! back to the caller. These types cover the ways a run itself can fail.

use std::io;

/// Process status for every failure that is not a parser error code.
pub const FAILURE_STATUS: i32 = -1;

/// The machine broke the execution protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// Two consecutive pauses at the same offset.
    #[error("can't make progress after pause at offset {offset}")]
    Stall { offset: usize },

    /// `execute` returned a code other than the one recorded in its state.
    #[error("error code mismatch got={got} expected={expected}")]
    CodeMismatch { got: i32, expected: i32 },

    /// A pause reported a resume offset outside the range it was given.
    #[error("resume offset {offset} outside of {start}..={end}")]
    OffsetOutOfRange { offset: usize, start: usize, end: usize },
}

/// Invalid run parameters, rejected before the machine is invoked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid scan value")]
    InvalidChunkSize,

    #[error("Input can't be empty for benchmark")]
    EmptyInput,

    #[error("fragmentation plan covers {covered} bytes, input has {len}")]
    PlanLength { covered: usize, len: usize },

    #[error("fragmentation plan contains an empty chunk at index {index}")]
    EmptyChunk { index: usize },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Malformed command line or mode specification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("missing arguments")]
    MissingArguments,

    #[error("mode {0:?} is not `bench`, `loop` or `<from>:<to>`")]
    MissingColon(String),

    #[error("non-digit character in scan range {0:?}")]
    InvalidDigit(String),

    #[error("scan range {0:?} out of bounds")]
    Overflow(String),
}

/// Any failure of a driver run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("trace output failed: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Process exit status for this failure.
    pub fn exit_status(&self) -> i32 {
        FAILURE_STATUS
    }
}
