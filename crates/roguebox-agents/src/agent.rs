//! The agent capability interface and the episode loop.

use tracing::info;

use roguebox_core::RogueBox;
use roguebox_types::RogueError;

/// A policy that acts on the game through the orchestrator.
pub trait Agent: Send {
    /// Perform one action and report whether the episode is over
    /// (usually `step.won || step.lost`).
    fn act(&mut self, rb: &mut RogueBox) -> Result<bool, RogueError>;

    /// Called once after each episode, before the game restarts.
    fn on_episode_end(&mut self, _rb: &mut RogueBox) {}
}

/// Drive the agent for a number of episodes, restarting the game between
/// them, and stop the game when done.
pub fn run_episodes(
    agent: &mut dyn Agent,
    rb: &mut RogueBox,
    episodes: usize,
) -> Result<(), RogueError> {
    for episode in 0..episodes {
        if episode == 0 {
            rb.start()?;
        } else {
            rb.reset()?;
        }
        info!(episode, "episode started");

        loop {
            let terminal = agent.act(rb)?;
            if terminal || !rb.is_running() {
                break;
            }
        }
        info!(episode, steps = rb.step_count(), "episode finished");
        agent.on_episode_end(rb);
    }
    rb.stop();
    Ok(())
}
