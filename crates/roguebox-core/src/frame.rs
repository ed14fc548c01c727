//! The frame model: an immutable structured snapshot of one settled screen.
//!
//! Screen layout: row 0 is the message bar, rows 1..=22 are the dungeon
//! map, row 23 is the status bar. Map coordinates used throughout the
//! frame are therefore (screen row - 1, column), giving a 22x80 grid.

use std::collections::HashMap;

/// Number of dungeon map rows (screen rows minus message and status bars).
pub const MAP_ROWS: usize = 22;
/// Number of dungeon map columns.
pub const MAP_COLS: usize = 80;

/// The player glyph.
pub const PLAYER_TILE: char = '@';
/// The stairs glyph.
pub const STAIRS_TILE: char = '%';

/// Immobile dungeon features. These accumulate across frames of one level
/// because the player glyph hides whatever it stands on.
pub const ENVIRONMENT_TILES: &str = "#+.%-|";
/// Item glyphs.
pub const ITEM_TILES: &str = "^*!?$:)],=/";

/// Glyphs that block orthogonal movement (walls and undrawn cells).
const BLOCKING_TILES: &str = "-| ";

/// Player condition reported in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Hungry,
    Weak,
    Faint,
}

/// Parsed status bar fields.
///
/// A screen whose last row does not match the status format (tombstone,
/// inventory, mid-refresh) yields an empty bar that still carries the last
/// known dungeon level, so level-dependent logic keeps working.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBar {
    pub dungeon_level: u32,
    pub gold: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_strength: u32,
    pub max_strength: u32,
    pub armor: u32,
    pub exp_level: u32,
    pub exp_points: u32,
    pub condition: Option<Condition>,
    /// Present only on custom game builds that print `Cmd:` in the bar.
    pub command_count: Option<u32>,
    /// True when the last row did not match the status format at all.
    pub is_empty: bool,
}

impl StatusBar {
    /// An empty bar carrying forward a previously seen dungeon level.
    pub fn empty(dungeon_level: u32) -> Self {
        Self {
            dungeon_level,
            is_empty: true,
            ..Self::default()
        }
    }
}

/// Immutable snapshot derived from exactly one screen read.
///
/// Exactly one frame is produced per completed command, plus one bootstrap
/// frame at start.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Parsed status bar fields.
    pub status: StatusBar,
    /// The raw 24x80 screen this frame was built from.
    pub screen: Vec<String>,
    /// Accumulated 22x80 environment map for the current dungeon level.
    map: Vec<Vec<char>>,
    /// Tile glyph -> positions in map coordinates.
    positions: HashMap<char, Vec<(usize, usize)>>,
}

impl Frame {
    pub(crate) fn new(
        status: StatusBar,
        screen: Vec<String>,
        map: Vec<Vec<char>>,
        positions: HashMap<char, Vec<(usize, usize)>>,
    ) -> Self {
        Self {
            status,
            screen,
            map,
            positions,
        }
    }

    /// Whether the status bar was present and fully drawn.
    pub fn has_status(&self) -> bool {
        !self.status.is_empty
    }

    /// All known positions of a tile glyph, in map coordinates.
    pub fn positions_of(&self, tile: char) -> &[(usize, usize)] {
        self.positions.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The player's position, if the player glyph is on screen.
    pub fn player_pos(&self) -> Option<(usize, usize)> {
        self.positions_of(PLAYER_TILE).first().copied()
    }

    /// The stairs position, if the stairs are visible on this level.
    pub fn stairs_pos(&self) -> Option<(usize, usize)> {
        self.positions_of(STAIRS_TILE).first().copied()
    }

    /// The environment tile the player is standing on.
    ///
    /// Comes from the accumulated map, since the player glyph covers the
    /// tile on screen. `None` until the player has moved off the cell at
    /// least once this level.
    pub fn tile_below_player(&self) -> Option<char> {
        let (row, col) = self.player_pos()?;
        match self.map.get(row).and_then(|r| r.get(col)) {
            Some(' ') | None => None,
            Some(&tile) => Some(tile),
        }
    }

    /// The accumulated 22x80 environment map.
    pub fn environment_map(&self) -> &[Vec<char>] {
        &self.map
    }
}

/// Whether the screen is showing the game-over (tombstone) display.
///
/// Detected by the absence of the `Hp:` field in the status row. Known
/// false positive: inventory and other full-screen overlays also hide the
/// status bar.
pub fn screen_is_game_over(screen: &[String]) -> bool {
    match screen.last() {
        Some(row) => !row.contains("Hp:"),
        None => true,
    }
}

/// Whether the map cell at (row, col) can be entered by an orthogonal
/// move. Walls and never-drawn cells block; floor, corridors, doors,
/// stairs, items and monsters do not.
pub fn screen_cell_is_open(screen: &[String], screen_row: usize, col: usize) -> bool {
    match screen
        .get(screen_row)
        .and_then(|r| r.chars().nth(col))
    {
        Some(c) => !BLOCKING_TILES.contains(c),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(positions: HashMap<char, Vec<(usize, usize)>>, map: Vec<Vec<char>>) -> Frame {
        Frame::new(
            StatusBar::default(),
            vec![" ".repeat(80); 24],
            map,
            positions,
        )
    }

    fn empty_map() -> Vec<Vec<char>> {
        vec![vec![' '; MAP_COLS]; MAP_ROWS]
    }

    #[test]
    fn player_pos_from_index() {
        let mut positions = HashMap::new();
        positions.insert('@', vec![(4, 10)]);
        let frame = frame_with(positions, empty_map());
        assert_eq!(frame.player_pos(), Some((4, 10)));
    }

    #[test]
    fn stairs_pos_absent_when_not_visible() {
        let frame = frame_with(HashMap::new(), empty_map());
        assert_eq!(frame.stairs_pos(), None);
    }

    #[test]
    fn tile_below_player_reads_accumulated_map() {
        let mut positions = HashMap::new();
        positions.insert('@', vec![(4, 10)]);
        let mut map = empty_map();
        map[4][10] = '#';
        let frame = frame_with(positions, map);
        assert_eq!(frame.tile_below_player(), Some('#'));
    }

    #[test]
    fn tile_below_player_unknown_before_revisit() {
        let mut positions = HashMap::new();
        positions.insert('@', vec![(4, 10)]);
        let frame = frame_with(positions, empty_map());
        assert_eq!(frame.tile_below_player(), None);
    }

    #[test]
    fn game_over_when_status_row_lacks_hp() {
        let mut screen = vec![" ".repeat(80); 24];
        assert!(screen_is_game_over(&screen));
        screen[23] = "Level: 1  Gold: 0  Hp: 12(12)  Str: 16(16)  Arm: 4  Exp: 1/0".to_string();
        assert!(!screen_is_game_over(&screen));
    }

    #[test]
    fn walls_and_blank_cells_block_movement() {
        let mut screen = vec![" ".repeat(80); 24];
        screen[5] = format!("{}{}", "-|.#", " ".repeat(76));
        assert!(!screen_cell_is_open(&screen, 5, 0)); // -
        assert!(!screen_cell_is_open(&screen, 5, 1)); // |
        assert!(screen_cell_is_open(&screen, 5, 2)); // .
        assert!(screen_cell_is_open(&screen, 5, 3)); // #
        assert!(!screen_cell_is_open(&screen, 5, 4)); // blank
        assert!(!screen_cell_is_open(&screen, 99, 0)); // out of bounds
    }
}
