//! A wrapper agent that records the screen after every action.
//!
//! Composes over any inner agent: recording failures are logged and never
//! interrupt the run.

use std::path::PathBuf;

use tracing::warn;

use roguebox_core::RogueBox;
use roguebox_types::RogueError;

use crate::agent::Agent;

/// Records each post-action screen to `<dir>/ep<NNN>st<NNN>.txt`.
pub struct RecordingAgent<A: Agent> {
    inner: A,
    record_dir: PathBuf,
    episode_index: u32,
    step_index: u32,
}

impl<A: Agent> RecordingAgent<A> {
    /// Wrap `inner`, recording screens into `record_dir` (created if
    /// missing).
    pub fn new(inner: A, record_dir: PathBuf) -> Result<Self, RogueError> {
        std::fs::create_dir_all(&record_dir).map_err(|e| {
            RogueError::Configuration(format!(
                "cannot create record dir {}: {e}",
                record_dir.display()
            ))
        })?;
        Ok(Self {
            inner,
            record_dir,
            episode_index: 0,
            step_index: 0,
        })
    }

    fn record_screen(&self, rb: &RogueBox) {
        let name = format!(
            "ep{:03}st{:03}.txt",
            self.episode_index, self.step_index
        );
        let path = self.record_dir.join(name);
        if let Err(e) = std::fs::write(&path, rb.screen_string()) {
            warn!("could not record screen to {}: {e}", path.display());
        }
    }
}

impl<A: Agent> Agent for RecordingAgent<A> {
    fn act(&mut self, rb: &mut RogueBox) -> Result<bool, RogueError> {
        let terminal = self.inner.act(rb)?;
        self.step_index += 1;
        self.record_screen(rb);
        Ok(terminal)
    }

    fn on_episode_end(&mut self, rb: &mut RogueBox) {
        self.inner.on_episode_end(rb);
        self.episode_index += 1;
        self.step_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roguebox_core::mocks::{
        rogue_screen, screen_bytes, status_line, FixedReward, NullState, ScriptedDriver,
        ScriptedEvaluator,
    };
    use roguebox_core::roguebox::Spawner;
    use roguebox_pty::ProcessDriver;
    use roguebox_types::RogueBoxOptions;

    struct OneMoveAgent;

    impl Agent for OneMoveAgent {
        fn act(&mut self, rb: &mut RogueBox) -> Result<bool, RogueError> {
            let step = rb.send_command("l")?;
            Ok(step.won || step.lost)
        }
    }

    #[test]
    fn writes_one_file_per_step() {
        let bootstrap = rogue_screen(&["@."], &status_line(1, None), "");
        let moved = rogue_screen(&[".@"], &status_line(1, None), "");
        let mut driver = ScriptedDriver::new();
        driver.push_pending(&screen_bytes(&bootstrap));
        driver.push_on_write(screen_bytes(&moved));
        driver.push_on_write(screen_bytes(&moved));

        let mut driver = Some(driver);
        let spawner: Spawner = Box::new(move |_| {
            Ok(Box::new(driver.take().expect("single start")) as Box<dyn ProcessDriver>)
        });
        let options = RogueBoxOptions {
            refresh_after_commands: false,
            ..RogueBoxOptions::default()
        };
        let mut rb = RogueBox::with_spawner(
            options,
            Box::new(FixedReward::default()),
            Box::new(NullState),
            Box::new(ScriptedEvaluator::default()),
            spawner,
        );
        rb.start().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut agent =
            RecordingAgent::new(OneMoveAgent, dir.path().to_path_buf()).unwrap();
        agent.act(&mut rb).unwrap();
        agent.act(&mut rb).unwrap();

        assert!(dir.path().join("ep000st001.txt").exists());
        assert!(dir.path().join("ep000st002.txt").exists());

        let recorded = std::fs::read_to_string(dir.path().join("ep000st001.txt")).unwrap();
        assert!(recorded.contains('@'));

        agent.on_episode_end(&mut rb);
        agent.act(&mut rb).unwrap();
        assert!(dir.path().join("ep001st001.txt").exists());
    }
}
