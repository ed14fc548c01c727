//! The screen buffer: an 80x24 grid maintained by a vt100 emulator.
//!
//! Raw PTY bytes are fed to the emulator; reads always return the full
//! grid, every row padded to exactly 80 characters, so downstream code can
//! index cells by (row, column) without bounds surprises.

use roguebox_pty::{ProcessDriver, SCREEN_COLS, SCREEN_ROWS};
use roguebox_types::RogueError;

/// The most recently observed game screen.
///
/// Wraps a [`vt100::Parser`] so ANSI escape sequences, cursor movement and
/// partial redraws are all resolved into plain grid content.
pub struct ScreenBuffer {
    parser: vt100::Parser,
}

impl ScreenBuffer {
    /// Create an empty 80x24 screen (blank-filled before first data).
    pub fn new() -> Self {
        Self {
            parser: vt100::Parser::new(SCREEN_ROWS, SCREEN_COLS, 0),
        }
    }

    /// Feed raw terminal output to the emulator.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    /// Read available PTY output and feed it to the emulator.
    ///
    /// Returns the number of bytes read; 0 means the PTY had nothing
    /// pending.
    pub fn pump(&mut self, driver: &mut dyn ProcessDriver) -> Result<usize, RogueError> {
        let mut buf = [0u8; 4096];
        let n = driver.read_nonblocking(&mut buf)?;
        if n > 0 {
            self.parser.process(&buf[..n]);
        }
        Ok(n)
    }

    /// The full grid as 24 strings of exactly 80 characters each.
    ///
    /// Cells the emulator has never drawn come back as spaces, so the grid
    /// is always fully defined.
    pub fn rows(&self) -> Vec<String> {
        let screen = self.parser.screen();
        (0..SCREEN_ROWS)
            .map(|r| {
                let mut row = String::with_capacity(SCREEN_COLS as usize);
                for c in 0..SCREEN_COLS {
                    match screen.cell(r, c) {
                        Some(cell) if !cell.contents().is_empty() => {
                            row.push_str(&cell.contents());
                        }
                        _ => row.push(' '),
                    }
                }
                row
            })
            .collect()
    }

    /// The grid joined with newlines, for logging and LLM-style consumers.
    pub fn contents(&self) -> String {
        self.rows().join("\n")
    }

    /// A blank 24x80 grid, the state of the screen before any data arrives.
    pub fn blank_rows() -> Vec<String> {
        vec![" ".repeat(SCREEN_COLS as usize); SCREEN_ROWS as usize]
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_blank_and_fully_defined() {
        let screen = ScreenBuffer::new();
        let rows = screen.rows();
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.chars().count() == 80));
        assert!(rows.iter().all(|r| r.chars().all(|c| c == ' ')));
    }

    #[test]
    fn feed_places_text_at_cursor_positions() {
        let mut screen = ScreenBuffer::new();
        // move to row 5 col 3 (1-indexed in ANSI), write a player glyph
        screen.feed(b"\x1b[5;3H@");
        let rows = screen.rows();
        assert_eq!(rows[4].chars().nth(2), Some('@'));
        assert_eq!(rows[4].chars().count(), 80);
    }

    #[test]
    fn full_redraw_overwrites_previous_content() {
        let mut screen = ScreenBuffer::new();
        screen.feed(b"\x1b[1;1Hold message");
        screen.feed(b"\x1b[2J\x1b[1;1Hnew");
        let rows = screen.rows();
        assert!(rows[0].starts_with("new"));
        assert!(!rows[0].contains("old"));
    }

    #[test]
    fn blank_rows_are_24_by_80() {
        let rows = ScreenBuffer::blank_rows();
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.len() == 80));
    }
}
