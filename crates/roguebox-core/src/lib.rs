//! Core engine for driving Rogue as a programmatic environment.
//!
//! Turns the interactive, human-paced game into a synchronous
//! request/response API: send a keystroke, wait until the game has settled,
//! get back a structured frame plus a reward/terminal signal.
//!
//! # Architecture
//!
//! - [`screen::ScreenBuffer`]: vt100-emulated 80x24 grid fed from the PTY
//! - [`frame::Frame`]: immutable structured snapshot of one settled screen
//! - [`parser::FrameParser`]: raw grid -> [`frame::Frame`]
//! - [`sync::SyncEngine`]: command send/settle protocol with prompt
//!   dismissal and a hard timeout
//! - [`strategy`]: the narrow interfaces for pluggable reward/state/
//!   evaluation collaborators
//! - [`roguebox::RogueBox`]: public orchestrator owning all of the above
//! - [`mocks`]: scripted transports and collaborators for testing without
//!   a real Rogue binary

pub mod frame;
pub mod mocks;
pub mod parser;
pub mod roguebox;
pub mod screen;
pub mod strategy;
pub mod sync;

pub use frame::{Frame, StatusBar};
pub use parser::FrameParser;
pub use roguebox::{RogueBox, StepResult};
pub use screen::ScreenBuffer;
pub use strategy::{Evaluator, RewardGenerator, StateGenerator};
pub use sync::SyncEngine;
