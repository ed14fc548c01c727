//! Name -> factory registries for string-configured strategy selection.
//!
//! Options files carry strategy names; unknown names are configuration
//! errors raised before any process is spawned.

use roguebox_core::{Evaluator, RewardGenerator, StateGenerator};
use roguebox_types::{RogueBoxOptions, RogueError};

use crate::evaluators::{DeepestLevelEvaluator, EpisodeEvaluator};
use crate::rewards::{DummyReward, StairSeekerReward, StairsOnlyReward};
use crate::states::{DummyState, FullMapState, SingleLayerState};

/// Construct a reward generator by registry name.
pub fn reward_by_name(
    name: &str,
    options: &RogueBoxOptions,
) -> Option<Box<dyn RewardGenerator>> {
    match name {
        "dummy" => Some(Box::new(DummyReward)),
        "stairs-only" => Some(Box::new(StairsOnlyReward::new(options.amulet_level))),
        "stair-seeker" => Some(Box::new(StairSeekerReward::new(options.amulet_level))),
        _ => None,
    }
}

/// Construct a state generator by registry name.
pub fn state_by_name(name: &str) -> Option<Box<dyn StateGenerator>> {
    match name {
        "dummy" => Some(Box::new(DummyState)),
        "full-map" => Some(Box::new(FullMapState)),
        "single-layer" => Some(Box::new(SingleLayerState)),
        _ => None,
    }
}

/// Construct an evaluator by registry name.
pub fn evaluator_by_name(name: &str, options: &RogueBoxOptions) -> Option<Box<dyn Evaluator>> {
    match name {
        "episode" => Some(Box::new(EpisodeEvaluator::new(
            options.max_step_count,
            options.episodes_for_evaluation,
        ))),
        "deepest-level" => Some(Box::new(DeepestLevelEvaluator::new(
            options.max_step_count,
            options.episodes_for_evaluation,
        ))),
        _ => None,
    }
}

/// Resolve all three collaborators named in the options.
///
/// Fails fast with a configuration error naming the first unknown
/// strategy.
#[allow(clippy::type_complexity)]
pub fn build_collaborators(
    options: &RogueBoxOptions,
) -> Result<
    (
        Box<dyn RewardGenerator>,
        Box<dyn StateGenerator>,
        Box<dyn Evaluator>,
    ),
    RogueError,
> {
    let reward = reward_by_name(&options.reward_generator, options).ok_or_else(|| {
        RogueError::Configuration(format!(
            "no reward generator named {:?}",
            options.reward_generator
        ))
    })?;
    let state = state_by_name(&options.state_generator).ok_or_else(|| {
        RogueError::Configuration(format!(
            "no state generator named {:?}",
            options.state_generator
        ))
    })?;
    let evaluator = evaluator_by_name(&options.evaluator, options).ok_or_else(|| {
        RogueError::Configuration(format!("no evaluator named {:?}", options.evaluator))
    })?;
    Ok((reward, state, evaluator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_resolve() {
        let options = RogueBoxOptions::default();
        assert!(build_collaborators(&options).is_ok());
    }

    #[test]
    fn every_registered_name_resolves() {
        let options = RogueBoxOptions::default();
        for name in ["dummy", "stairs-only", "stair-seeker"] {
            assert!(reward_by_name(name, &options).is_some(), "reward {name}");
        }
        for name in ["dummy", "full-map", "single-layer"] {
            assert!(state_by_name(name).is_some(), "state {name}");
        }
        for name in ["episode", "deepest-level"] {
            assert!(evaluator_by_name(name, &options).is_some(), "evaluator {name}");
        }
    }

    #[test]
    fn unknown_reward_name_is_a_configuration_error() {
        let options = RogueBoxOptions {
            reward_generator: "no-such-reward".to_string(),
            ..RogueBoxOptions::default()
        };
        let err = match build_collaborators(&options) {
            Ok(_) => panic!("expected configuration error"),
            Err(e) => e,
        };
        assert!(matches!(err, RogueError::Configuration(_)));
        assert!(err.to_string().contains("no-such-reward"));
    }
}
