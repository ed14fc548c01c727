//! Episode evaluators: step budgets and run statistics.
//!
//! Evaluators are handed to the engine as `Box<dyn Evaluator>`, so they
//! use shared interior state (`Arc<Mutex<_>>`): the caller keeps a clone
//! and reads statistics while the engine drives the original.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use roguebox_core::{Evaluator, Frame};

/// Record of one finished episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeRecord {
    pub steps: u32,
    pub total_reward: f64,
    pub won: bool,
    pub died: bool,
    /// Deepest dungeon level observed during the episode.
    pub deepest_level: u32,
}

/// Aggregate statistics over the most recent episodes.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats {
    pub episodes: usize,
    pub win_rate: f64,
    pub avg_reward: f64,
    pub avg_steps: f64,
    pub deepest_level: u32,
}

#[derive(Debug, Default)]
struct EvaluatorInner {
    current_reward: f64,
    current_deepest: u32,
    episodes: Vec<EpisodeRecord>,
}

/// Step-budget evaluator with per-episode records.
///
/// Requests a stop once the step budget is exhausted and aggregates
/// win/reward/step statistics over the last `episodes_for_evaluation`
/// episodes.
#[derive(Clone)]
pub struct EpisodeEvaluator {
    max_step_count: u32,
    episodes_for_evaluation: usize,
    inner: Arc<Mutex<EvaluatorInner>>,
}

impl EpisodeEvaluator {
    pub fn new(max_step_count: u32, episodes_for_evaluation: usize) -> Self {
        Self {
            max_step_count,
            episodes_for_evaluation,
            inner: Arc::new(Mutex::new(EvaluatorInner::default())),
        }
    }

    /// Statistics over the last `episodes_for_evaluation` episodes.
    pub fn statistics(&self) -> EvaluationStats {
        let inner = self.inner.lock().expect("evaluator lock poisoned");
        let window: Vec<&EpisodeRecord> = inner
            .episodes
            .iter()
            .rev()
            .take(self.episodes_for_evaluation)
            .collect();
        let n = window.len();
        if n == 0 {
            return EvaluationStats {
                episodes: 0,
                win_rate: 0.0,
                avg_reward: 0.0,
                avg_steps: 0.0,
                deepest_level: 0,
            };
        }
        EvaluationStats {
            episodes: n,
            win_rate: window.iter().filter(|e| e.won).count() as f64 / n as f64,
            avg_reward: window.iter().map(|e| e.total_reward).sum::<f64>() / n as f64,
            avg_steps: window.iter().map(|e| f64::from(e.steps)).sum::<f64>() / n as f64,
            deepest_level: window.iter().map(|e| e.deepest_level).max().unwrap_or(0),
        }
    }

    /// All finished episode records, oldest first.
    pub fn episodes(&self) -> Vec<EpisodeRecord> {
        self.inner
            .lock()
            .expect("evaluator lock poisoned")
            .episodes
            .clone()
    }
}

impl Evaluator for EpisodeEvaluator {
    fn on_run_begin(&mut self) {
        let mut inner = self.inner.lock().expect("evaluator lock poisoned");
        inner.current_reward = 0.0;
        inner.current_deepest = 0;
    }

    fn on_step(
        &mut self,
        history: &[Frame],
        _command: char,
        reward: f64,
        step_count: u32,
    ) -> bool {
        let mut inner = self.inner.lock().expect("evaluator lock poisoned");
        inner.current_reward += reward;
        if let Some(frame) = history.last() {
            if frame.has_status() {
                inner.current_deepest = inner.current_deepest.max(frame.status.dungeon_level);
            }
        }
        step_count >= self.max_step_count
    }

    fn on_run_end(&mut self, history: &[Frame], won: bool, died: bool) {
        let mut inner = self.inner.lock().expect("evaluator lock poisoned");
        let record = EpisodeRecord {
            steps: history.len().saturating_sub(1) as u32,
            total_reward: inner.current_reward,
            won,
            died,
            deepest_level: inner.current_deepest,
        };
        inner.episodes.push(record);
    }
}

/// [`EpisodeEvaluator`] variant whose statistics window is keyed on depth:
/// episodes that descended further dominate the aggregate, which suits
/// agents whose only objective is reaching the amulet level.
#[derive(Clone)]
pub struct DeepestLevelEvaluator {
    base: EpisodeEvaluator,
}

impl DeepestLevelEvaluator {
    pub fn new(max_step_count: u32, episodes_for_evaluation: usize) -> Self {
        Self {
            base: EpisodeEvaluator::new(max_step_count, episodes_for_evaluation),
        }
    }

    /// Statistics over the deepest episodes rather than the most recent.
    pub fn statistics(&self) -> EvaluationStats {
        let episodes = self.base.episodes();
        let mut by_depth = episodes;
        by_depth.sort_by(|a, b| b.deepest_level.cmp(&a.deepest_level));
        by_depth.truncate(self.base.episodes_for_evaluation);

        let n = by_depth.len();
        if n == 0 {
            return EvaluationStats {
                episodes: 0,
                win_rate: 0.0,
                avg_reward: 0.0,
                avg_steps: 0.0,
                deepest_level: 0,
            };
        }
        EvaluationStats {
            episodes: n,
            win_rate: by_depth.iter().filter(|e| e.won).count() as f64 / n as f64,
            avg_reward: by_depth.iter().map(|e| e.total_reward).sum::<f64>() / n as f64,
            avg_steps: by_depth.iter().map(|e| f64::from(e.steps)).sum::<f64>() / n as f64,
            deepest_level: by_depth.iter().map(|e| e.deepest_level).max().unwrap_or(0),
        }
    }
}

impl Evaluator for DeepestLevelEvaluator {
    fn on_run_begin(&mut self) {
        self.base.on_run_begin();
    }

    fn on_step(&mut self, history: &[Frame], command: char, reward: f64, step_count: u32) -> bool {
        self.base.on_step(history, command, reward, step_count)
    }

    fn on_run_end(&mut self, history: &[Frame], won: bool, died: bool) {
        self.base.on_run_end(history, won, died);
    }
}
