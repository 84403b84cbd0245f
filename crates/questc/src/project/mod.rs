//! Quest Project
//!
//! On-disk project layout, loading into the graph model, and source watching.

mod config;
mod loader;
mod watcher;

pub use config::*;
pub use loader::*;
pub use watcher::*;
