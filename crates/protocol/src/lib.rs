//! Replicated step state machine for lockstep runs.
//!
//! Every participant process runs this same logic against its own shared
//! state store, driven entirely by an external caller polling
//! [`poll`]. One poll performs at most one step's work; availability flags
//! and two exact-count barriers keep the independently-polling processes
//! in lockstep.
//!
//! # Components
//!
//! - [`advance`] - one step of the state machine, dispatched over
//!   `(Role, Step)`
//! - [`quorum_reached`] - the exact-count barrier check
//! - [`submit`] / [`retrieve`] - the role-asymmetric data exchange
//! - [`poll`] - the single externally-callable entry point
//!
//! The domain computation and file I/O are injected through the
//! [`Computation`] and [`RunIo`] traits; the protocol itself performs no
//! I/O beyond the store.

mod error;
mod exchange;
mod machine;
mod poll;
mod quorum;
mod traits;

pub use error::{IoError, ProtocolError};
pub use exchange::{retrieve, submit};
pub use machine::advance;
pub use poll::{poll, StatusReport};
pub use quorum::quorum_reached;
pub use traits::{Computation, RunIo};
