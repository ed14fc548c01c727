//! The public orchestrator: start/stop/reset, command dispatch, and the
//! per-step result.
//!
//! `RogueBox` owns the process driver, the screen buffer, the parser, the
//! synchronization engine and the frame history, and integrates the
//! external reward/state/evaluation collaborators into one synchronous
//! step API:
//!
//! ```no_run
//! use roguebox_core::{mocks, RogueBox};
//! use roguebox_types::RogueBoxOptions;
//!
//! let mut rb = RogueBox::new(
//!     RogueBoxOptions::default(),
//!     Box::new(mocks::FixedReward::default()),
//!     Box::new(mocks::NullState),
//!     Box::new(mocks::ScriptedEvaluator::default()),
//! )?;
//! rb.start()?;
//! loop {
//!     let step = rb.send_command("h")?;
//!     if step.won || step.lost {
//!         break;
//!     }
//! }
//! rb.stop();
//! # Ok::<(), roguebox_types::RogueError>(())
//! ```

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use roguebox_pty::{ProcessDriver, PtyProcess};
use roguebox_types::{RogueBoxOptions, RogueError};

use crate::frame::{screen_cell_is_open, screen_is_game_over, Frame};
use crate::parser::FrameParser;
use crate::screen::ScreenBuffer;
use crate::strategy::{Evaluator, RewardGenerator, StateGenerator};
use crate::sync::SyncEngine;

/// The default game executable name, resolved from PATH when no explicit
/// path is configured.
const DEFAULT_GAME_EXE: &str = "rogue";

/// The descend / ascend keys swapped by the milestone latch.
const DESCEND_KEY: char = '>';
const ASCEND_KEY: char = '<';

/// Keystrokes that quit the game cleanly (quit, confirm, acknowledge).
const QUIT_SEQUENCE: &[u8] = b"Qy\n";

/// Result of one completed step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Reward computed by the reward generator over the frame history.
    pub reward: f64,
    /// Opaque state representation from the state generator.
    pub state: serde_json::Value,
    /// The reward generator's goal condition was met.
    pub won: bool,
    /// The run ended without a win: evaluator stop, game-over screen, or
    /// synchronization timeout. Never true together with `won`.
    pub lost: bool,
}

impl StepResult {
    fn no_op(state: serde_json::Value) -> Self {
        Self {
            reward: 0.0,
            state,
            won: false,
            lost: false,
        }
    }
}

/// Factory producing a process driver for each run.
///
/// The default spawns the configured executable in a PTY; tests inject
/// scripted drivers instead.
pub type Spawner =
    Box<dyn FnMut(&RogueBoxOptions) -> Result<Box<dyn ProcessDriver>, RogueError> + Send>;

/// Drives one game process and exposes a synchronous step interface.
pub struct RogueBox {
    options: RogueBoxOptions,
    spawner: Spawner,
    driver: Option<Box<dyn ProcessDriver>>,
    screen: ScreenBuffer,
    parser: FrameParser,
    sync: SyncEngine,
    history: Vec<Frame>,
    step_count: u32,
    has_cmd_count: bool,
    reached_amulet_level: bool,
    last_state: serde_json::Value,
    reward_gen: Box<dyn RewardGenerator>,
    state_gen: Box<dyn StateGenerator>,
    evaluator: Box<dyn Evaluator>,
}

impl RogueBox {
    /// The command alphabet: orthogonal moves plus descend.
    pub fn actions() -> &'static [char] {
        &['h', 'j', 'k', 'l', DESCEND_KEY]
    }

    /// Build an orchestrator that spawns the configured executable in a
    /// PTY.
    ///
    /// Fails fast with a configuration error when the executable cannot
    /// be resolved -- before any process is spawned.
    pub fn new(
        options: RogueBoxOptions,
        reward_gen: Box<dyn RewardGenerator>,
        state_gen: Box<dyn StateGenerator>,
        evaluator: Box<dyn Evaluator>,
    ) -> Result<Self, RogueError> {
        let exe = resolve_game_exe(&options)?;
        let args = options.game_args.clone();
        let spawner: Spawner = Box::new(move |_opts| {
            // Empty strings confuse the game's argument parsing; filter
            // them out before spawning.
            let args: Vec<String> = args.iter().filter(|a| !a.is_empty()).cloned().collect();
            Ok(Box::new(PtyProcess::spawn(&exe, &args)?) as Box<dyn ProcessDriver>)
        });
        Ok(Self::with_spawner(
            options, reward_gen, state_gen, evaluator, spawner,
        ))
    }

    /// Build an orchestrator with a custom driver factory.
    ///
    /// The factory owns process creation entirely, so no executable check
    /// is performed here.
    pub fn with_spawner(
        options: RogueBoxOptions,
        reward_gen: Box<dyn RewardGenerator>,
        state_gen: Box<dyn StateGenerator>,
        evaluator: Box<dyn Evaluator>,
        spawner: Spawner,
    ) -> Self {
        let sync = SyncEngine::new(&options);
        Self {
            options,
            spawner,
            driver: None,
            screen: ScreenBuffer::new(),
            parser: FrameParser::new(),
            sync,
            history: Vec::new(),
            step_count: 0,
            has_cmd_count: false,
            reached_amulet_level: false,
            last_state: serde_json::Value::Null,
            reward_gen,
            state_gen,
            evaluator,
        }
    }

    /// Start a new run: reset all per-run state and collaborators, spawn
    /// the game, wait for the status bar to first appear, and seed the
    /// frame history with the bootstrap frame.
    ///
    /// With `move_rogue` configured, one throwaway move is performed so
    /// the tile below the player becomes known; its result is returned.
    pub fn start(&mut self) -> Result<Option<StepResult>, RogueError> {
        // The previous child must be dead and reaped before a new spawn:
        // a double-spawn with an orphaned predecessor is a correctness
        // violation, not a leak.
        self.stop();

        self.step_count = 0;
        self.history.clear();
        self.reached_amulet_level = false;
        self.last_state = serde_json::Value::Null;
        self.parser.reset();
        self.evaluator.on_run_begin();
        self.reward_gen.reset();
        self.state_gen.reset();

        let driver = (self.spawner)(&self.options)?;
        self.driver = Some(driver);
        self.screen = ScreenBuffer::new();

        self.await_status_bar();
        let frame = self.parser.parse_screen(&self.screen.rows());
        self.has_cmd_count = frame.status.command_count.is_some();
        debug!(
            has_cmd_count = self.has_cmd_count,
            "run started, bootstrap frame seeded"
        );
        self.history.push(frame);

        if self.options.move_rogue {
            return self.send_command("j").map(Some);
        }
        Ok(None)
    }

    /// Pump until the status bar first parses, bounded by the configured
    /// maximum wait. Proceeding with a blank screen is preferable to
    /// blocking forever on a game that never draws one.
    fn await_status_bar(&mut self) {
        let deadline = Instant::now() + self.options.max_wait();
        loop {
            if let Some(driver) = self.driver.as_mut() {
                if let Err(e) = self.screen.pump(driver.as_mut()) {
                    warn!("could not pump game output during bootstrap: {e}");
                }
            }
            if !self.parser.parse_status(&self.screen.rows()).is_empty {
                return;
            }
            if Instant::now() > deadline {
                warn!("status bar never appeared during bootstrap");
                return;
            }
            std::thread::sleep(self.options.poll_interval());
        }
    }

    /// Kill and restart the game process.
    pub fn reset(&mut self) -> Result<Option<StepResult>, RogueError> {
        self.stop();
        self.start()
    }

    /// Kill the game process if alive; a no-op otherwise. Calling this on
    /// an already-stopped run performs no process operations.
    pub fn stop(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            if driver.is_alive() {
                driver.kill();
            }
            info!("run stopped");
        }
    }

    /// Whether the game process is currently running.
    pub fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.is_alive())
    }

    /// Send a command and return the step result.
    ///
    /// An empty command is a no-op step returning the last known state; a
    /// multi-character command is treated as a sequence (see
    /// [`send_sequence`](Self::send_sequence)).
    pub fn send_command(&mut self, command: &str) -> Result<StepResult, RogueError> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(StepResult::no_op(self.last_state.clone()));
        }
        if command.chars().count() > 1 {
            return self.send_sequence(command);
        }
        let mut key = command.chars().next().unwrap_or(' ');

        // One-way milestone latch: once the amulet level has been seen,
        // descend turns into ascend for the rest of the run.
        if self.options.transform_descent_action
            && self.reached_amulet_level
            && key == DESCEND_KEY
        {
            key = ASCEND_KEY;
        }

        let driver = self.driver.as_mut().ok_or(RogueError::NotStarted)?;
        let counter_base = if self.has_cmd_count {
            self.history.last().and_then(|f| f.status.command_count)
        } else {
            None
        };

        let timed_out = match self.sync.send_and_settle(
            key,
            counter_base,
            driver.as_mut(),
            &mut self.screen,
            &self.parser,
        ) {
            Ok(()) => false,
            Err(RogueError::SyncTimeout { waited_ms }) => {
                warn!(waited_ms, "game entered an endless loop and was killed");
                self.stop();
                true
            }
            Err(other) => return Err(other),
        };

        self.step_count += 1;

        let rows = self.screen.rows();
        let frame = self.parser.parse_screen(&rows);
        self.history.push(frame);

        if self.options.transform_descent_action && !self.reached_amulet_level {
            if let Some(frame) = self.history.last() {
                if frame.has_status()
                    && frame.status.dungeon_level == self.options.amulet_level
                {
                    info!(level = frame.status.dungeon_level, "amulet level reached");
                    self.reached_amulet_level = true;
                }
            }
        }

        let reward = self.reward_gen.compute_reward(&self.history);
        let state = self.state_gen.compute_state(&self.history);
        self.last_state = state.clone();

        let died = screen_is_game_over(&rows);
        let won = self.reward_gen.goal_achieved();
        let stop = self
            .evaluator
            .on_step(&self.history, key, reward, self.step_count);
        let lost = (stop || died || timed_out) && !won;

        if won || lost {
            self.evaluator.on_run_end(&self.history, won, died);
        }

        Ok(StepResult {
            reward,
            state,
            won,
            lost,
        })
    }

    /// Stream several keystrokes as one logical action, e.g. `"qa"`
    /// (quaff item a) or a count prefix like `"10h"`.
    ///
    /// Each character goes through [`send_command`](Self::send_command) so
    /// all the usual bookkeeping is reused; only the last character's
    /// result is returned, though the evaluator still observes every
    /// intermediate step.
    pub fn send_sequence(&mut self, sequence: &str) -> Result<StepResult, RogueError> {
        let mut last = StepResult::no_op(self.last_state.clone());
        for ch in sequence.chars() {
            last = self.send_command(&ch.to_string())?;
        }
        Ok(last)
    }

    /// Send the keystrokes that quit the game cleanly.
    pub fn quit_the_game(&mut self) -> Result<(), RogueError> {
        let driver = self.driver.as_mut().ok_or(RogueError::NotStarted)?;
        driver.write(QUIT_SEQUENCE)
    }

    // -- side-effect-free queries -------------------------------------------

    /// The current screen as 24 rows of 80 characters.
    pub fn screen(&self) -> Vec<String> {
        self.screen.rows()
    }

    /// The current screen as one newline-joined string.
    pub fn screen_string(&self) -> String {
        self.screen.contents()
    }

    /// The full frame history of the current run.
    pub fn frame_history(&self) -> &[Frame] {
        &self.history
    }

    /// The most recent frame, if a run has been started.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.history.last()
    }

    /// Steps completed since the last (re)start.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// The state returned by the last step (or the initial state).
    pub fn current_state(&self) -> &serde_json::Value {
        &self.last_state
    }

    /// Whether the running build prints a command counter.
    pub fn has_cmd_count(&self) -> bool {
        self.has_cmd_count
    }

    /// Whether the game-over (tombstone) screen is showing.
    pub fn game_over(&self) -> bool {
        screen_is_game_over(&self.screen.rows())
    }

    /// The actions that are legal on the current screen: orthogonal moves
    /// into open cells, plus descend when standing on the stairs.
    pub fn legal_actions(&self) -> Vec<char> {
        let frame = match self.history.last() {
            Some(frame) => frame,
            None => return Vec::new(),
        };
        let (row, col) = match frame.player_pos() {
            Some(pos) => pos,
            None => return Vec::new(),
        };
        let rows = self.screen.rows();
        // player position is in map coordinates; the screen has the
        // message bar at row 0, so shift down by one.
        let screen_row = row + 1;

        let mut actions = Vec::new();
        if screen_row > 0 && screen_cell_is_open(&rows, screen_row - 1, col) {
            actions.push('k');
        }
        if screen_cell_is_open(&rows, screen_row + 1, col) {
            actions.push('j');
        }
        if col > 0 && screen_cell_is_open(&rows, screen_row, col - 1) {
            actions.push('h');
        }
        if screen_cell_is_open(&rows, screen_row, col + 1) {
            actions.push('l');
        }
        if frame.player_pos() == frame.stairs_pos() && frame.stairs_pos().is_some() {
            actions.push(DESCEND_KEY);
        }
        actions
    }

    /// Whether the player currently stands in a corridor.
    pub fn in_corridor(&self) -> bool {
        self.history
            .last()
            .and_then(|f| f.tile_below_player())
            .is_some_and(|t| t == '#')
    }

    /// Whether the player currently stands in a doorway.
    pub fn in_door(&self) -> bool {
        self.history
            .last()
            .and_then(|f| f.tile_below_player())
            .is_some_and(|t| t == '+')
    }
}

impl Drop for RogueBox {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolve the game executable: an explicit path is verified as-is, while
/// `None` searches PATH for the default executable name.
fn resolve_game_exe(options: &RogueBoxOptions) -> Result<PathBuf, RogueError> {
    if let Some(path) = &options.game_exe_path {
        roguebox_pty::verify_executable(path)?;
        return Ok(path.clone());
    }
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(DEFAULT_GAME_EXE);
        if roguebox_pty::verify_executable(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(RogueError::Configuration(format!(
        "game executable {DEFAULT_GAME_EXE:?} not found on PATH; set game_exe_path"
    )))
}
