//! Reward generators.
//!
//! All rewards are computed over the frame history because the useful
//! signals are deltas between consecutive frames: a dungeon-level change,
//! the player closing in on the stairs.

use roguebox_core::{Frame, RewardGenerator};

/// Reward granted for descending to a new dungeon level.
const DESCENT_REWARD: f64 = 100.0;
/// Shaping bonus for moving closer to visible stairs.
const APPROACH_REWARD: f64 = 1.0;
/// Living penalty applied when a step achieves nothing.
const IDLE_PENALTY: f64 = -1.0;

/// The dungeon levels of the last two frames, when both have a status bar.
fn level_delta(history: &[Frame]) -> Option<(u32, u32)> {
    if history.len() < 2 {
        return None;
    }
    let previous = &history[history.len() - 2];
    let current = &history[history.len() - 1];
    if previous.has_status() && current.has_status() {
        Some((previous.status.dungeon_level, current.status.dungeon_level))
    } else {
        None
    }
}

/// Always returns zero and never reaches a goal. Useful as a placeholder
/// when only the state stream matters.
#[derive(Debug, Clone, Default)]
pub struct DummyReward;

impl RewardGenerator for DummyReward {
    fn reset(&mut self) {}

    fn compute_reward(&mut self, _history: &[Frame]) -> f64 {
        0.0
    }

    fn goal_achieved(&self) -> bool {
        false
    }
}

/// Rewards descending the stairs and nothing else.
///
/// The goal condition is reaching `goal_level`.
#[derive(Debug, Clone)]
pub struct StairsOnlyReward {
    goal_level: u32,
    goal_reached: bool,
}

impl StairsOnlyReward {
    pub fn new(goal_level: u32) -> Self {
        Self {
            goal_level,
            goal_reached: false,
        }
    }
}

impl RewardGenerator for StairsOnlyReward {
    fn reset(&mut self) {
        self.goal_reached = false;
    }

    fn compute_reward(&mut self, history: &[Frame]) -> f64 {
        match level_delta(history) {
            Some((previous, current)) if current > previous => {
                if current >= self.goal_level {
                    self.goal_reached = true;
                }
                DESCENT_REWARD
            }
            _ => 0.0,
        }
    }

    fn goal_achieved(&self) -> bool {
        self.goal_reached
    }
}

/// Dense shaping variant of [`StairsOnlyReward`]: descending earns the
/// full bonus, moving closer to visible stairs earns a small bonus, and
/// everything else costs a living penalty.
#[derive(Debug, Clone)]
pub struct StairSeekerReward {
    goal_level: u32,
    goal_reached: bool,
}

impl StairSeekerReward {
    pub fn new(goal_level: u32) -> Self {
        Self {
            goal_level,
            goal_reached: false,
        }
    }

    fn stairs_distance(frame: &Frame) -> Option<usize> {
        let (pr, pc) = frame.player_pos()?;
        let (sr, sc) = frame.stairs_pos()?;
        Some(pr.abs_diff(sr) + pc.abs_diff(sc))
    }
}

impl RewardGenerator for StairSeekerReward {
    fn reset(&mut self) {
        self.goal_reached = false;
    }

    fn compute_reward(&mut self, history: &[Frame]) -> f64 {
        if let Some((previous, current)) = level_delta(history) {
            if current > previous {
                if current >= self.goal_level {
                    self.goal_reached = true;
                }
                return DESCENT_REWARD;
            }
        }

        if history.len() < 2 {
            return 0.0;
        }
        let previous = &history[history.len() - 2];
        let current = &history[history.len() - 1];
        match (
            Self::stairs_distance(previous),
            Self::stairs_distance(current),
        ) {
            (Some(before), Some(after)) if after < before => APPROACH_REWARD,
            _ => IDLE_PENALTY,
        }
    }

    fn goal_achieved(&self) -> bool {
        self.goal_reached
    }
}
