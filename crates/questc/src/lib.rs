//! questc - Quest behavior graph compiler
//!
//! This crate provides the command line front end around `quest_compiler`:
//! - Project loading (`quest.toml`, entity graphs, custom node libraries)
//! - Build pipeline (load, compile, report diagnostics, export)
//! - Script export to the output directory
//! - Source watching for rebuild-on-save

// Re-export core crates
pub use quest_compiler;
pub use quest_types;

// Build pipeline
pub mod build;

// Script export
pub mod export;

// Project management
pub mod project;
