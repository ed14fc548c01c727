//! Error types shared across all roguebox crates.

/// Errors that can occur while driving the game process.
///
/// Only [`Configuration`](RogueError::Configuration) is fatal: it is raised
/// before any process is spawned and is never retried. Everything else is
/// recoverable at the run level -- the orchestrator reports the step as lost
/// and stays usable through `reset`.
#[derive(Debug, thiserror::Error)]
pub enum RogueError {
    /// Bad executable path or otherwise unusable options. Raised at
    /// construction time, before any spawn attempt.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pseudo-terminal operation failed (spawn, read, write, kill).
    #[error("pty error: {0}")]
    Pty(String),

    /// The game never settled within the configured maximum wait. The
    /// child has been killed; the run counts as lost.
    #[error("game did not settle within {waited_ms} ms, process killed")]
    SyncTimeout {
        /// How long the engine waited before giving up.
        waited_ms: u64,
    },

    /// A command was sent while no run was active.
    #[error("no active run: call start() first")]
    NotStarted,

    /// A background decision worker was scheduled while one was already
    /// in flight.
    #[error("decision worker error: {0}")]
    Worker(String),
}
