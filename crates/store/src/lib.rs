//! Shared state store for the lockstep protocol.
//!
//! Every piece of mutable protocol state lives in a key-value store rather
//! than in process memory: the current step, the run configuration, the
//! staged local contribution, the coordinator's collections, and the
//! availability flag. The store is the only channel through which the
//! poll handler, the data-exchange handler, and the transport layer
//! observe each other.
//!
//! Two layers:
//!
//! - [`StateStore`] - the raw contract: `get`/`set` on JSON values plus one
//!   atomic `append` primitive for the coordinator's collections.
//! - [`RunState`] - a typed facade over the well-known keys, so protocol
//!   code never touches raw JSON.

mod memory;
mod run_state;

pub use memory::MemoryStore;
pub use run_state::{keys, RunState};

use serde_json::Value;
use thiserror::Error;

/// Errors raised by typed access to the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A well-known key has not been set yet.
    #[error("Key not set: {0}")]
    Missing(String),

    /// The value under a key does not decode as the expected type.
    #[error("Value under key {key} has the wrong shape: {detail}")]
    WrongShape {
        /// The offending key.
        key: String,
        /// Decode failure detail.
        detail: String,
    },
}

/// The shared mutable store every protocol component reads and writes.
///
/// Implementations must make [`append`](StateStore::append) atomic with
/// respect to concurrent appends under the same key: the returned length
/// must count this append exactly once. Everything else is plain last
/// write wins.
pub trait StateStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value);

    /// Append `value` to the array under `key` and return the new length.
    ///
    /// Creates an empty array first if the key is absent. Fails if the key
    /// holds a non-array value.
    fn append(&self, key: &str, value: Value) -> Result<usize, StoreError>;

    /// Drop every key. Called once per run, at setup.
    fn reset(&self);
}
