//! Quest Compiler - Behavior graphs to Lua quest scripts
//!
//! This crate turns the behavior graphs of a [`QuestProject`] into Lua source
//! for the game's embedded scripting runtime. Compilation is a pure function of
//! its input: no I/O, no global state, byte-identical output for identical
//! input. Malformed graphs never fail the build; they surface as inline
//! diagnostic comments carrying a stable `FQT-CG-0xx` code.
//!
//! [`QuestProject`]: quest_types::QuestProject

pub use quest_types;

mod action_queue;
mod catalog;
mod compiler;
mod container;
mod diagnostics;
mod encoder;
mod lua;
mod nodes;
mod resolver;
mod template;
mod variable_nodes;
mod walker;

pub use action_queue::*;
pub use catalog::*;
pub use compiler::*;
pub use container::*;
pub use diagnostics::*;
pub use encoder::*;
pub use lua::*;
pub use nodes::register_builtin_nodes;
pub use resolver::*;
pub use template::*;
pub use variable_nodes::*;
pub use walker::*;
