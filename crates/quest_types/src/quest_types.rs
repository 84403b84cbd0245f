//! Quest Types - Core data structures for authored quest behavior
//!
//! This crate contains the pure data model consumed by the quest compiler:
//! behavior graphs (nodes, named ports, connections), per-entity variables,
//! and the quest project that owns them. Everything here is plain serde data;
//! nothing in this crate performs I/O or code generation.

mod project;
mod types;

pub use project::*;
pub use types::*;
