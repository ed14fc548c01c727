//! A baseline agent that acts uniformly at random.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use roguebox_core::RogueBox;
use roguebox_types::RogueError;

use crate::agent::Agent;

/// Picks uniformly among the currently legal actions, falling back to the
/// full action alphabet when none are known (e.g. before the player is
/// visible).
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn choose(&mut self, pool: &[char]) -> char {
        pool[self.rng.gen_range(0..pool.len())]
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, rb: &mut RogueBox) -> Result<bool, RogueError> {
        let legal = rb.legal_actions();
        let action = if legal.is_empty() {
            self.choose(RogueBox::actions())
        } else {
            self.choose(&legal)
        };
        let step = rb.send_command(&action.to_string())?;
        Ok(step.won || step.lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chooses_from_the_given_pool() {
        let mut agent = RandomAgent::seeded(7);
        let pool = ['h', 'j'];
        for _ in 0..50 {
            assert!(pool.contains(&agent.choose(&pool)));
        }
    }

    #[test]
    fn seeded_agents_are_deterministic() {
        let mut a = RandomAgent::seeded(42);
        let mut b = RandomAgent::seeded(42);
        let pool: Vec<char> = RogueBox::actions().to_vec();
        for _ in 0..20 {
            assert_eq!(a.choose(&pool), b.choose(&pool));
        }
    }
}
