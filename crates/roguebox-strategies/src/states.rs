//! State generators.
//!
//! The representation handed back to callers is generator-defined; the
//! engine treats it as an opaque JSON value. Numeric grids serve learning
//! loops, the glyph map serves scripted and LLM-driven agents.

use roguebox_core::{Frame, StateGenerator};
use serde_json::{json, Value};

use roguebox_core::frame::{ENVIRONMENT_TILES, ITEM_TILES, MAP_COLS, MAP_ROWS, PLAYER_TILE};

/// Cell codes used by [`SingleLayerState`].
const CODE_EMPTY: u8 = 0;
const CODE_FLOOR: u8 = 1;
const CODE_WALL: u8 = 2;
const CODE_ITEM: u8 = 3;
const CODE_MONSTER: u8 = 4;
const CODE_PLAYER: u8 = 5;

/// Produces `null` for every step. The cheapest possible generator, for
/// callers that only consume the screen directly.
#[derive(Debug, Clone, Default)]
pub struct DummyState;

impl StateGenerator for DummyState {
    fn reset(&mut self) {}

    fn compute_state(&mut self, _history: &[Frame]) -> Value {
        Value::Null
    }
}

/// The 22 visible map rows as strings of glyphs.
#[derive(Debug, Clone, Default)]
pub struct FullMapState;

impl StateGenerator for FullMapState {
    fn reset(&mut self) {}

    fn compute_state(&mut self, history: &[Frame]) -> Value {
        let frame = match history.last() {
            Some(frame) => frame,
            None => return Value::Null,
        };
        let rows: Vec<&str> = frame
            .screen
            .iter()
            .skip(1)
            .take(MAP_ROWS)
            .map(String::as_str)
            .collect();
        json!(rows)
    }
}

/// One 22x80 numeric layer coding each cell's occupant class.
#[derive(Debug, Clone, Default)]
pub struct SingleLayerState;

impl SingleLayerState {
    fn cell_code(tile: char) -> u8 {
        if tile == PLAYER_TILE {
            CODE_PLAYER
        } else if tile == '-' || tile == '|' {
            CODE_WALL
        } else if ENVIRONMENT_TILES.contains(tile) {
            CODE_FLOOR
        } else if ITEM_TILES.contains(tile) {
            CODE_ITEM
        } else if tile.is_ascii_uppercase() {
            CODE_MONSTER
        } else {
            CODE_EMPTY
        }
    }
}

impl StateGenerator for SingleLayerState {
    fn reset(&mut self) {}

    fn compute_state(&mut self, history: &[Frame]) -> Value {
        let frame = match history.last() {
            Some(frame) => frame,
            None => return Value::Null,
        };
        let grid: Vec<Vec<u8>> = frame
            .screen
            .iter()
            .skip(1)
            .take(MAP_ROWS)
            .map(|row| {
                let mut cells: Vec<u8> =
                    row.chars().take(MAP_COLS).map(Self::cell_code).collect();
                cells.resize(MAP_COLS, CODE_EMPTY);
                cells
            })
            .collect();
        json!(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roguebox_core::mocks::{rogue_screen, status_line};
    use roguebox_core::FrameParser;

    fn single_frame(map_rows: &[&str]) -> Vec<Frame> {
        let mut parser = FrameParser::new();
        vec![parser.parse_screen(&rogue_screen(map_rows, &status_line(1, None), ""))]
    }

    #[test]
    fn dummy_state_is_null() {
        assert_eq!(DummyState.compute_state(&single_frame(&["@"])), Value::Null);
    }

    #[test]
    fn full_map_returns_22_rows() {
        let state = FullMapState.compute_state(&single_frame(&["#@%"]));
        let rows = state.as_array().unwrap();
        assert_eq!(rows.len(), 22);
        assert!(rows[0].as_str().unwrap().starts_with("#@%"));
    }

    #[test]
    fn single_layer_codes_cell_classes() {
        let state = SingleLayerState.compute_state(&single_frame(&["-@.K!"]));
        let grid = state.as_array().unwrap();
        let row: Vec<u8> = grid[0]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap() as u8)
            .collect();
        assert_eq!(row[0], CODE_WALL);
        assert_eq!(row[1], CODE_PLAYER);
        assert_eq!(row[2], CODE_FLOOR);
        assert_eq!(row[3], CODE_MONSTER);
        assert_eq!(row[4], CODE_ITEM);
        assert_eq!(row.len(), 80);
        assert_eq!(row[10], CODE_EMPTY);
    }

    #[test]
    fn generators_return_null_on_empty_history() {
        assert_eq!(FullMapState.compute_state(&[]), Value::Null);
        assert_eq!(SingleLayerState.compute_state(&[]), Value::Null);
    }
}
