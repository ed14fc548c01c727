//! Pseudo-terminal process driver.
//!
//! Spawns the game in a PTY of fixed 80x24 geometry so all of its terminal
//! I/O can be intercepted: the master end is read non-blocking for screen
//! bytes and written for keystrokes.
//!
//! The [`ProcessDriver`] trait is the seam the rest of the engine programs
//! against; [`PtyProcess`] is the POSIX backend (openpty + fork + execvp).
//! A handle-based backend for non-POSIX platforms would implement the same
//! trait and be selected at construction time -- nothing above this crate
//! branches on platform.

pub mod driver;
pub mod pty;

pub use driver::ProcessDriver;
pub use pty::{verify_executable, PtyProcess};

/// Fixed terminal geometry: the game is always driven on an 80x24 screen.
pub const SCREEN_ROWS: u16 = 24;
/// Fixed terminal geometry: the game is always driven on an 80x24 screen.
pub const SCREEN_COLS: u16 = 80;
