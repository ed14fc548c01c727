//! Pluggable reward/state/evaluation strategies.
//!
//! The engine consumes these only through the narrow interfaces in
//! `roguebox_core::strategy`; the [`registry`] maps names to factories so
//! options files can select strategies as strings.

pub mod evaluators;
pub mod registry;
pub mod rewards;
pub mod states;

pub use evaluators::{DeepestLevelEvaluator, EpisodeEvaluator, EvaluationStats};
pub use registry::{build_collaborators, evaluator_by_name, reward_by_name, state_by_name};
pub use rewards::{DummyReward, StairSeekerReward, StairsOnlyReward};
pub use states::{DummyState, FullMapState, SingleLayerState};
