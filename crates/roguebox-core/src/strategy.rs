//! Collaborator interfaces: reward, state and episode evaluation.
//!
//! The engine depends only on these traits, never on concrete strategies.
//! Implementations live in `roguebox-strategies`, where a name registry
//! lets options files select them as strings.
//!
//! All three collaborators consume the frame history rather than a single
//! frame, because several signals (level descent, movement deltas) require
//! comparing consecutive frames.

use crate::frame::Frame;

/// Computes the per-step reward from the frame history.
pub trait RewardGenerator: Send {
    /// Clear per-run state. Called on every (re)start.
    fn reset(&mut self);

    /// Compute the reward for the most recent step.
    fn compute_reward(&mut self, history: &[Frame]) -> f64;

    /// Whether the generator's goal condition was met by the last
    /// `compute_reward` call. A true value makes the step a win.
    fn goal_achieved(&self) -> bool;
}

/// Computes the state representation handed back to the caller.
///
/// The representation's shape is generator-defined; the engine treats it
/// as an opaque JSON value.
pub trait StateGenerator: Send {
    /// Clear per-run state. Called on every (re)start.
    fn reset(&mut self);

    /// Compute the state after the most recent step.
    fn compute_state(&mut self, history: &[Frame]) -> serde_json::Value;
}

/// Observes the run and decides when to end it.
pub trait Evaluator: Send {
    /// A new run is starting.
    fn on_run_begin(&mut self);

    /// A step completed. Returning true requests the run be ended as a
    /// loss (e.g. step budget exhausted).
    fn on_step(&mut self, history: &[Frame], command: char, reward: f64, step_count: u32)
        -> bool;

    /// The run ended. `died` reports whether the game-over screen was the
    /// cause, as opposed to an evaluator stop or a timeout.
    fn on_run_end(&mut self, history: &[Frame], won: bool, died: bool);
}
