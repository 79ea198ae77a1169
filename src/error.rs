use thiserror::Error;

/// Unified error type for network construction, solving, and I/O.
#[derive(Error, Debug)]
pub enum PfError {
    /// No bus was ever added with `kind == Slack`.
    #[error("system has no slack bus")]
    NoSlackBus,

    /// More than one bus was added with `kind == Slack`.
    #[error("system has {0} slack buses, expected exactly one")]
    MultipleSlackBuses(usize),

    /// A line or transformer referenced a bus index past the end of the bus list.
    #[error("branch references unknown bus index {0}")]
    UnknownBus(usize),

    /// `run_pf` was called on a system with no buses.
    #[error("system has no buses")]
    EmptySystem,

    /// The Newton-Raphson correction system `J * dx = F` could not be solved.
    #[error("Jacobian is singular or numerically unsolvable at iteration {0}")]
    SingularJacobian(usize),

    /// The case-file parser hit a malformed or incomplete record.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Numeric field in a case-file record failed to parse.
    #[error("invalid numeric field: {0}")]
    InvalidNumber(#[from] std::num::ParseFloatError),

    /// Failure reading a case file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure serializing or deserializing a case snapshot.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PfResult<T> = Result<T, PfError>;
