//! Raw screen -> structured [`Frame`] parsing.
//!
//! The parser is stateful across consecutive screens of one run: immobile
//! environment tiles accumulate into a persistent 22x80 map, so the tile
//! hidden under the player stays known after the player moves over it. The
//! map resets whenever the dungeon level changes, and [`FrameParser::reset`]
//! must be called before parsing screens from a different run.

use std::collections::HashMap;

use regex::Regex;

use crate::frame::{
    Condition, Frame, StatusBar, ENVIRONMENT_TILES, ITEM_TILES, MAP_COLS, MAP_ROWS, PLAYER_TILE,
};

/// Failure modes of status-line extraction.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The status row exists but is not fully drawn yet. Expected to happen
    /// occasionally mid-refresh; callers retry on the next poll tick.
    #[error("status bar not fully drawn")]
    StatusBarUnavailable,
}

/// Stateful screen parser for one run.
pub struct FrameParser {
    status_re: Regex,
    cmd_count_re: Regex,
    environment_map: Vec<Vec<char>>,
    environment_positions: HashMap<char, Vec<(usize, usize)>>,
    last_level: Option<u32>,
}

impl FrameParser {
    pub fn new() -> Self {
        // Fixed-format status row, e.g.:
        // Level: 3  Gold: 127  Hp: 11(20)  Str: 16(16)  Arm: 4  Exp: 2/14  Hungry  Cmd: 42
        let status_re = Regex::new(
            r"Level:\s*(?P<dungeon_level>\d+)\s*Gold:\s*(?P<gold>\d+)\s*Hp:\s*(?P<current_hp>\d+)\((?P<max_hp>\d+)\)\s*Str:\s*(?P<current_strength>\d+)\((?P<max_strength>\d+)\)\s*Arm:\s*(?P<armor>\d+)\s*Exp:\s*(?P<exp_level>\d+)/(?P<exp_points>\d+)\s*(?P<condition>Hungry|Weak|Faint)?\s*(?:Cmd:\s*(?P<command_count>\d+))?",
        )
        .expect("status bar regex is valid");
        let cmd_count_re =
            Regex::new(r"Cmd:\s*(?P<command_count>\d+)").expect("cmd count regex is valid");

        Self {
            status_re,
            cmd_count_re,
            environment_map: empty_environment_map(),
            environment_positions: HashMap::new(),
            last_level: None,
        }
    }

    /// Drop all accumulated state. Call before parsing screens that are not
    /// consecutive with the previous ones (i.e. on every restart).
    pub fn reset(&mut self) {
        self.environment_map = empty_environment_map();
        self.environment_positions.clear();
        self.last_level = None;
    }

    /// Parse the status row of a screen.
    pub fn parse_status(&self, screen: &[String]) -> StatusBar {
        let row = match screen.last() {
            Some(row) => row,
            None => return StatusBar::empty(self.carried_level()),
        };
        let caps = match self.status_re.captures(row) {
            Some(caps) => caps,
            None => return StatusBar::empty(self.carried_level()),
        };

        let field = |name: &str| -> u32 {
            caps.name(name)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let condition = caps.name("condition").and_then(|m| match m.as_str() {
            "Hungry" => Some(Condition::Hungry),
            "Weak" => Some(Condition::Weak),
            "Faint" => Some(Condition::Faint),
            _ => None,
        });
        let command_count = caps
            .name("command_count")
            .and_then(|m| m.as_str().parse().ok());

        StatusBar {
            dungeon_level: field("dungeon_level"),
            gold: field("gold"),
            current_hp: field("current_hp"),
            max_hp: field("max_hp"),
            current_strength: field("current_strength"),
            max_strength: field("max_strength"),
            armor: field("armor"),
            exp_level: field("exp_level"),
            exp_points: field("exp_points"),
            condition,
            command_count,
            is_empty: false,
        }
    }

    /// Build a [`Frame`] from the given screen, updating the accumulated
    /// environment state.
    pub fn parse_screen(&mut self, screen: &[String]) -> Frame {
        let status = self.parse_status(screen);

        if status.is_empty {
            // Tombstone, inventory or mid-refresh screen: no map scan, the
            // frame carries the previous level's environment unchanged.
            return Frame::new(
                status,
                screen.to_vec(),
                self.environment_map.clone(),
                self.environment_positions.clone(),
            );
        }

        // The environment cannot change unless the player reached a new
        // level.
        if self.last_level != Some(status.dungeon_level) {
            self.environment_map = empty_environment_map();
            self.environment_positions.clear();
        }
        self.last_level = Some(status.dungeon_level);

        let mut positions: HashMap<char, Vec<(usize, usize)>> = HashMap::new();
        for (map_row, row) in screen.iter().skip(1).take(MAP_ROWS).enumerate() {
            for (col, tile) in row.chars().take(MAP_COLS).enumerate() {
                if ENVIRONMENT_TILES.contains(tile) {
                    if self.environment_map[map_row][col] == ' ' {
                        self.environment_map[map_row][col] = tile;
                        self.environment_positions
                            .entry(tile)
                            .or_default()
                            .push((map_row, col));
                    }
                } else if tile == PLAYER_TILE
                    || ITEM_TILES.contains(tile)
                    || tile.is_ascii_uppercase()
                {
                    positions.entry(tile).or_default().push((map_row, col));
                }
            }
        }

        for (tile, found) in &self.environment_positions {
            positions.insert(*tile, found.clone());
        }

        Frame::new(
            status,
            screen.to_vec(),
            self.environment_map.clone(),
            positions,
        )
    }

    /// Extract the command counter from a custom-build status row.
    ///
    /// Errors when the row does not contain the counter -- either the build
    /// does not print one, or the bar is mid-refresh and not fully drawn.
    pub fn cmd_count(&self, screen: &[String]) -> Result<u32, ParseError> {
        let row = screen.last().ok_or(ParseError::StatusBarUnavailable)?;
        self.cmd_count_re
            .captures(row)
            .and_then(|caps| caps.name("command_count"))
            .and_then(|m| m.as_str().parse().ok())
            .ok_or(ParseError::StatusBarUnavailable)
    }

    fn carried_level(&self) -> u32 {
        self.last_level.unwrap_or(1)
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_environment_map() -> Vec<Vec<char>> {
    vec![vec![' '; MAP_COLS]; MAP_ROWS]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{rogue_screen, status_line};

    #[test]
    fn parses_full_status_bar() {
        let parser = FrameParser::new();
        let mut screen = vec![" ".repeat(80); 24];
        screen[23] =
            "Level: 3  Gold: 127  Hp: 11(20)  Str: 16(16)  Arm: 4  Exp: 2/14  Hungry  Cmd: 42"
                .to_string();

        let status = parser.parse_status(&screen);
        assert!(!status.is_empty);
        assert_eq!(status.dungeon_level, 3);
        assert_eq!(status.gold, 127);
        assert_eq!(status.current_hp, 11);
        assert_eq!(status.max_hp, 20);
        assert_eq!(status.armor, 4);
        assert_eq!(status.exp_level, 2);
        assert_eq!(status.exp_points, 14);
        assert_eq!(status.condition, Some(Condition::Hungry));
        assert_eq!(status.command_count, Some(42));
    }

    #[test]
    fn status_without_cmd_count_is_not_empty() {
        let parser = FrameParser::new();
        let mut screen = vec![" ".repeat(80); 24];
        screen[23] =
            "Level: 1  Gold: 0  Hp: 12(12)  Str: 16(16)  Arm: 4  Exp: 1/0".to_string();

        let status = parser.parse_status(&screen);
        assert!(!status.is_empty);
        assert_eq!(status.command_count, None);
    }

    #[test]
    fn empty_status_carries_last_level() {
        let mut parser = FrameParser::new();
        let screen = rogue_screen(&["@."], &status_line(5, None), "");
        parser.parse_screen(&screen);

        // tombstone screen: no status bar at all
        let tombstone = vec![" ".repeat(80); 24];
        let frame = parser.parse_screen(&tombstone);
        assert!(frame.status.is_empty);
        assert_eq!(frame.status.dungeon_level, 5);
    }

    #[test]
    fn indexes_tiles_by_position() {
        let mut parser = FrameParser::new();
        let screen = rogue_screen(&["---", "|@%", "---"], &status_line(1, None), "");
        let frame = parser.parse_screen(&screen);

        assert_eq!(frame.player_pos(), Some((1, 1)));
        assert_eq!(frame.stairs_pos(), Some((1, 2)));
        assert_eq!(frame.positions_of('-').len(), 6);
        assert_eq!(frame.positions_of('|').len(), 1);
    }

    #[test]
    fn environment_accumulates_under_the_player() {
        let mut parser = FrameParser::new();
        // corridor visible at (0, 1)
        let before = rogue_screen(&["@#"], &status_line(1, None), "");
        parser.parse_screen(&before);
        // player moved onto the corridor tile
        let after = rogue_screen(&[".@"], &status_line(1, None), "");
        let frame = parser.parse_screen(&after);

        assert_eq!(frame.player_pos(), Some((0, 1)));
        assert_eq!(frame.tile_below_player(), Some('#'));
    }

    #[test]
    fn environment_resets_on_new_level() {
        let mut parser = FrameParser::new();
        let level1 = rogue_screen(&["@#"], &status_line(1, None), "");
        parser.parse_screen(&level1);

        let level2 = rogue_screen(&["@."], &status_line(2, None), "");
        let frame = parser.parse_screen(&level2);
        // the level 1 corridor no longer exists in the accumulated state
        assert!(frame.positions_of('#').is_empty());
    }

    #[test]
    fn cmd_count_on_custom_build() {
        let parser = FrameParser::new();
        let screen = rogue_screen(&["@"], &status_line(1, Some(17)), "");
        assert_eq!(parser.cmd_count(&screen).unwrap(), 17);
    }

    #[test]
    fn cmd_count_unavailable_mid_refresh() {
        let parser = FrameParser::new();
        // partially drawn status row, counter not there yet
        let mut screen = vec![" ".repeat(80); 24];
        screen[23] = "Level: 1  Gold: 0  Hp: 1".to_string();
        assert!(matches!(
            parser.cmd_count(&screen),
            Err(ParseError::StatusBarUnavailable)
        ));
    }

    #[test]
    fn reset_clears_accumulated_environment() {
        let mut parser = FrameParser::new();
        let screen = rogue_screen(&["@#"], &status_line(1, None), "");
        parser.parse_screen(&screen);
        parser.reset();

        let frame = parser.parse_screen(&rogue_screen(&[".@"], &status_line(1, None), ""));
        // the corridor at the player's position was never seen after reset
        assert_eq!(frame.tile_below_player(), None);
        assert!(frame.positions_of('#').is_empty());
    }
}
