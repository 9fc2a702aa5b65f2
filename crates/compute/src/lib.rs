//! Domain collaborators for lockstep runs.
//!
//! The protocol core treats the computation and the file I/O as opaque,
//! injected dependencies. This crate provides the concrete placeholders:
//! a weighted mean over numeric samples, directory-based sample I/O for
//! deployments, and an in-memory I/O for tests and the harness.

mod io;
mod mean;

pub use io::{DirIo, MemoryIo};
pub use mean::MeanComputation;
