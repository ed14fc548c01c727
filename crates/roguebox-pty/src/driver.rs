//! The process transport seam.
//!
//! Everything above this crate (synchronization engine, orchestrator, test
//! doubles) talks to the child process through [`ProcessDriver`]. The POSIX
//! backend is [`PtyProcess`](crate::pty::PtyProcess); tests substitute
//! scripted implementations.

use roguebox_types::RogueError;

/// A child process attached to a fixed-geometry pseudo-terminal.
///
/// Implementations own the process for their whole lifetime: dropping a
/// driver (or calling [`kill`](ProcessDriver::kill)) must terminate and
/// reap the child so no zombie or orphan survives the handle.
pub trait ProcessDriver: Send {
    /// Send raw keystroke bytes to the child's stdin.
    ///
    /// Writing to a dead child is an error the caller is expected to log
    /// and swallow -- a closed channel degrades the step, it does not
    /// crash the run.
    fn write(&mut self, data: &[u8]) -> Result<(), RogueError>;

    /// Read whatever output is currently available, without blocking.
    ///
    /// Returns the number of bytes placed in `buf`; 0 means no data was
    /// pending (or the child has exited and the channel drained).
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, RogueError>;

    /// Whether the child process is still running.
    fn is_alive(&self) -> bool;

    /// Forcibly terminate and reap the child. Idempotent: killing an
    /// already-dead child is a no-op.
    fn kill(&mut self);
}
