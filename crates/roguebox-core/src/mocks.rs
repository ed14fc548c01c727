//! Scripted test doubles for driving the engine without a real game binary.
//!
//! Provides:
//! - [`ScriptedDriver`]: a [`ProcessDriver`] that serves pre-scripted
//!   screen bytes, one chunk per write, and records everything written
//! - [`DriverProbe`]: shared handle for inspecting a driver after it has
//!   been moved into the orchestrator
//! - screen builders ([`rogue_screen`], [`status_line`], [`screen_bytes`])
//!   that render plausible game screens as ANSI byte streams
//! - trivial reward/state/evaluator collaborators for orchestrator tests
//!
//! Probes use `Arc<Mutex<_>>` interior mutability so they stay readable
//! after the driver is boxed and handed to the engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use roguebox_pty::ProcessDriver;
use roguebox_types::RogueError;

use crate::frame::Frame;
use crate::strategy::{Evaluator, RewardGenerator, StateGenerator};

// ---------------------------------------------------------------------------
// Screen builders
// ---------------------------------------------------------------------------

fn pad_row(s: &str) -> String {
    let truncated: String = s.chars().take(80).collect();
    format!("{truncated:<80}")
}

/// Build a full 24x80 screen: message bar, up to 22 map rows, status bar.
pub fn rogue_screen(map_rows: &[&str], status: &str, message: &str) -> Vec<String> {
    let mut rows = Vec::with_capacity(24);
    rows.push(pad_row(message));
    for r in 0..22 {
        rows.push(pad_row(map_rows.get(r).copied().unwrap_or("")));
    }
    rows.push(pad_row(status));
    rows
}

/// A plausible status row, optionally with the custom-build `Cmd:` counter.
pub fn status_line(level: u32, cmd_count: Option<u32>) -> String {
    match cmd_count {
        Some(n) => format!(
            "Level: {level}  Gold: 0  Hp: 12(12)  Str: 16(16)  Arm: 4  Exp: 1/0  Cmd: {n}"
        ),
        None => format!("Level: {level}  Gold: 0  Hp: 12(12)  Str: 16(16)  Arm: 4  Exp: 1/0"),
    }
}

/// Render a screen as the ANSI byte stream a full-redraw program would
/// emit: clear, then cursor-position each row.
pub fn screen_bytes(rows: &[String]) -> Vec<u8> {
    let mut bytes = b"\x1b[2J".to_vec();
    for (i, row) in rows.iter().enumerate() {
        bytes.extend_from_slice(format!("\x1b[{};1H", i + 1).as_bytes());
        bytes.extend_from_slice(row.trim_end().as_bytes());
    }
    bytes
}

// ---------------------------------------------------------------------------
// ScriptedDriver
// ---------------------------------------------------------------------------

/// Shared inspection handle for a [`ScriptedDriver`].
#[derive(Clone, Default)]
pub struct DriverProbe {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    reads: Arc<AtomicUsize>,
    killed: Arc<AtomicBool>,
}

impl DriverProbe {
    /// Every write issued to the driver, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().expect("probe lock poisoned").clone()
    }

    /// All written bytes flattened into one buffer.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes().concat()
    }

    /// Number of `read_nonblocking` calls made so far.
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Whether `kill` was called.
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

/// A process driver that replays scripted output.
///
/// Bytes queued with [`push_pending`](Self::push_pending) are served
/// immediately (the bootstrap screen); chunks queued with
/// [`push_on_write`](Self::push_on_write) become readable one per write,
/// which models a game that redraws in response to each keystroke.
pub struct ScriptedDriver {
    probe: DriverProbe,
    pending: VecDeque<u8>,
    on_write: VecDeque<Vec<u8>>,
    alive: bool,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            probe: DriverProbe::default(),
            pending: VecDeque::new(),
            on_write: VecDeque::new(),
            alive: true,
        }
    }

    /// Handle for inspecting this driver after it is boxed away.
    pub fn probe(&self) -> DriverProbe {
        self.probe.clone()
    }

    /// Make bytes readable right away.
    pub fn push_pending(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    /// Queue a chunk that becomes readable after the next write.
    pub fn push_on_write(&mut self, bytes: Vec<u8>) {
        self.on_write.push_back(bytes);
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessDriver for ScriptedDriver {
    fn write(&mut self, data: &[u8]) -> Result<(), RogueError> {
        self.probe
            .writes
            .lock()
            .expect("probe lock poisoned")
            .push(data.to_vec());
        if let Some(chunk) = self.on_write.pop_front() {
            self.pending.extend(chunk);
        }
        Ok(())
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, RogueError> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        let mut n = 0;
        while n < buf.len() {
            match self.pending.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
        self.probe.killed.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// A reward generator returning a constant reward and goal flag.
#[derive(Debug, Clone, Default)]
pub struct FixedReward {
    pub reward: f64,
    pub goal: bool,
}

impl RewardGenerator for FixedReward {
    fn reset(&mut self) {}

    fn compute_reward(&mut self, _history: &[Frame]) -> f64 {
        self.reward
    }

    fn goal_achieved(&self) -> bool {
        self.goal
    }
}

/// A state generator that always produces `null`.
#[derive(Debug, Clone, Default)]
pub struct NullState;

impl StateGenerator for NullState {
    fn reset(&mut self) {}

    fn compute_state(&mut self, _history: &[Frame]) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// An evaluator that records its lifecycle calls and optionally requests a
/// stop at a fixed step count.
#[derive(Clone, Default)]
pub struct ScriptedEvaluator {
    pub stop_at_step: Option<u32>,
    events: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEvaluator {
    pub fn stopping_at(step: u32) -> Self {
        Self {
            stop_at_step: Some(step),
            events: Arc::default(),
        }
    }

    /// The recorded lifecycle events, in order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock poisoned").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock poisoned").push(event);
    }
}

impl Evaluator for ScriptedEvaluator {
    fn on_run_begin(&mut self) {
        self.record("begin".to_string());
    }

    fn on_step(
        &mut self,
        _history: &[Frame],
        command: char,
        _reward: f64,
        step_count: u32,
    ) -> bool {
        self.record(format!("step:{step_count}:{command}"));
        self.stop_at_step.is_some_and(|limit| step_count >= limit)
    }

    fn on_run_end(&mut self, _history: &[Frame], won: bool, died: bool) {
        self.record(format!("end:won={won},died={died}"));
    }
}
