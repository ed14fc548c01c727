//! Shared types for the roguebox workspace.
//!
//! This crate sits at the bottom of the dependency graph and carries the
//! pieces every other crate needs: the error taxonomy ([`RogueError`]) and
//! the per-run configuration surface ([`RogueBoxOptions`]).

pub mod error;
pub mod options;

pub use error::RogueError;
pub use options::RogueBoxOptions;
