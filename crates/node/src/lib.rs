//! Combined participant node.
//!
//! Composes the shared state store, the protocol core, and the injected
//! collaborators into one object exposing the three transport-agnostic
//! operations of a participant: `setup`, `status`, and the `submit` /
//! `retrieve` pair behind the data endpoint.

mod node;

pub use node::Node;
