//! Error types for the protocol core.

use lockstep_store::StoreError;
use lockstep_types::{ConfigError, Role, Step};
use thiserror::Error;

/// Errors raised by the I/O collaborators.
#[derive(Debug, Error)]
pub enum IoError {
    /// Reading or writing a file failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Input data did not parse.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Errors raised by the protocol core.
///
/// All of these stay local to the offending call; the protocol never
/// propagates an error across process boundaries. A quorum stall is not an
/// error at all, only an indefinitely non-advancing status.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Setup parameters were rejected.
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    /// The input collaborator yielded an empty dataset; init does not
    /// advance.
    #[error("Input collaborator yielded no data")]
    NoInput,

    /// A submitted payload variant does not fit the receiver's role and
    /// step. Nothing was mutated.
    #[error("Unexpected {payload} payload for {role} in step {step}")]
    UnexpectedPayload {
        /// Name of the rejected payload variant.
        payload: &'static str,
        /// The receiver's role.
        role: Role,
        /// The receiver's step at submission time.
        step: Step,
    },

    /// A well-known store key was missing or malformed.
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    /// An I/O collaborator failed.
    #[error("Run I/O failed: {0}")]
    Io(#[from] IoError),
}
