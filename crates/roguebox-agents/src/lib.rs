//! Agents that drive a [`RogueBox`](roguebox_core::RogueBox).
//!
//! Agent behavior is modeled as composition over one capability interface
//! ([`Agent`]: `act` + `on_episode_end`) rather than delegation chains:
//! wrappers like [`RecordingAgent`] hold any inner agent and add behavior
//! around its `act`.
//!
//! [`DecisionWorker`] supports running the decision-making step on a
//! background thread while the orchestrator's surface stays non-blocking:
//! a capacity-1 handoff queue carries at most one pending decision, and
//! the main loop performs no-op steps while none is ready.

pub mod agent;
pub mod random;
pub mod recording;
pub mod worker;

pub use agent::{run_episodes, Agent};
pub use random::RandomAgent;
pub use recording::RecordingAgent;
pub use worker::DecisionWorker;
