//! The command send/settle protocol.
//!
//! The game is not cooperative: after a keystroke there is no reliable
//! "done reacting" signal in the general case. Two settling strategies are
//! supported, chosen once per run:
//!
//! - *Counter-based*, for custom game builds that print a monotonically
//!   increasing `Cmd:` counter in the status bar: poll until the counter
//!   reaches the expected value, bounded by a hard timeout.
//! - *Fixed-delay*, for stock builds: sleep one short interval, pump once,
//!   attempt one prompt-dismissal pass. Portable but imprecise.
//!
//! Blocking prompts (the `--More--` pager and the `Call it:` modal) would
//! otherwise stall the counter forever; each has a distinct dismissal
//! keystroke, and every dismissal counts as one extra unit of expected
//! work. Dismissal can be disabled by configuration, in which case the
//! prompt is left on screen for the caller to see.

use std::time::{Duration, Instant};

use tracing::warn;

use roguebox_pty::ProcessDriver;
use roguebox_types::{RogueBoxOptions, RogueError};

use crate::frame::screen_is_game_over;
use crate::parser::FrameParser;
use crate::screen::ScreenBuffer;

/// Keystroke that forces the game to redraw the whole screen (Ctrl-R).
pub const REFRESH_KEY: u8 = 0x12;

/// Settle wait used when no command counter is available.
const FIXED_COMMAND_DELAY: Duration = Duration::from_millis(10);

/// Substring of the `--More--` pager prompt in the message bar.
const PAGER_PROMPT_MARK: &str = "ore--";
/// Substring of the `Call it:` naming modal in the message bar.
const NAME_PROMPT_MARK: &str = "all it";

const PAGER_DISMISS_KEY: u8 = b' ';
const NAME_DISMISS_KEY: u8 = 0x1b;

/// Whether the message bar is showing a blocking prompt.
pub fn needs_dismissal(screen: &[String]) -> bool {
    dismissal_key(screen).is_some()
}

/// The keystroke that dismisses the currently shown prompt, if any.
fn dismissal_key(screen: &[String]) -> Option<u8> {
    let message_bar = screen.first()?;
    if message_bar.contains(PAGER_PROMPT_MARK) {
        Some(PAGER_DISMISS_KEY)
    } else if message_bar.contains(NAME_PROMPT_MARK) {
        Some(NAME_DISMISS_KEY)
    } else {
        None
    }
}

/// Per-command synchronization: write the keystroke, then wait until the
/// game has settled.
pub struct SyncEngine {
    poll_interval: Duration,
    max_wait: Duration,
    refresh_after_commands: bool,
    dismiss_prompts: bool,
}

impl SyncEngine {
    pub fn new(options: &RogueBoxOptions) -> Self {
        Self {
            poll_interval: options.poll_interval(),
            max_wait: options.max_wait(),
            refresh_after_commands: options.refresh_after_commands,
            dismiss_prompts: options.dismiss_prompts,
        }
    }

    /// Send one command and wait for the game to settle.
    ///
    /// `counter_base` is the counter value observed before this command on
    /// builds that support it; `None` selects the fixed-delay strategy.
    ///
    /// Returns [`RogueError::SyncTimeout`] when the counter never reaches
    /// its expected value within the maximum wait -- the caller is
    /// expected to kill the child and report the step as lost.
    pub fn send_and_settle(
        &self,
        command: char,
        counter_base: Option<u32>,
        driver: &mut dyn ProcessDriver,
        screen: &mut ScreenBuffer,
        parser: &FrameParser,
    ) -> Result<(), RogueError> {
        let mut units_sent = 1u32;
        let mut buf = [0u8; 4];
        let encoded = command.encode_utf8(&mut buf).as_bytes();
        if let Err(e) = driver.write(encoded) {
            warn!("could not write command keystroke: {e}");
        }
        if self.refresh_after_commands {
            // The game may skip redrawing some tiles after a command; a
            // refresh keystroke counts as one extra unit of expected work.
            self.write_keystroke(driver, REFRESH_KEY, "refresh");
            units_sent += 1;
        }

        match counter_base {
            Some(base) => self.settle_by_counter(base + units_sent, driver, screen, parser),
            None => {
                self.settle_fixed_delay(driver, screen);
                Ok(())
            }
        }
    }

    /// Poll until the command counter reaches `expected`.
    fn settle_by_counter(
        &self,
        mut expected: u32,
        driver: &mut dyn ProcessDriver,
        screen: &mut ScreenBuffer,
        parser: &FrameParser,
    ) -> Result<(), RogueError> {
        let start = Instant::now();
        let deadline = start + self.max_wait;
        loop {
            std::thread::sleep(self.poll_interval);
            self.pump(driver, screen);
            expected += self.dismiss_all(driver, screen, deadline);

            let rows = screen.rows();
            if screen_is_game_over(&rows) {
                // No more counter updates are coming; the orchestrator
                // reads the tombstone off the screen.
                return Ok(());
            }
            match parser.cmd_count(&rows) {
                Ok(count) if count >= expected => return Ok(()),
                // Mid-refresh status rows are expected; retry next tick.
                Ok(_) | Err(_) => {}
            }
            if Instant::now() > deadline {
                return Err(RogueError::SyncTimeout {
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
        }
    }

    /// No completion signal exists: one sleep, one pump, one dismissal
    /// pass. Never raises a timeout on its own.
    fn settle_fixed_delay(&self, driver: &mut dyn ProcessDriver, screen: &mut ScreenBuffer) {
        std::thread::sleep(FIXED_COMMAND_DELAY);
        self.pump(driver, screen);
        self.dismiss_all(driver, screen, Instant::now() + self.max_wait);
    }

    /// Dismiss blocking prompts until the message bar is clear, bounded by
    /// `deadline`. Returns the number of dismissal keys sent, each of
    /// which advances the command counter by one.
    ///
    /// With dismissal disabled by configuration, no key is sent: the loop
    /// only waits for the screen to move on, and on expiry the prompt is
    /// left for the caller to see.
    fn dismiss_all(
        &self,
        driver: &mut dyn ProcessDriver,
        screen: &mut ScreenBuffer,
        deadline: Instant,
    ) -> u32 {
        let mut keys_sent = 0;
        while let Some(key) = dismissal_key(&screen.rows()) {
            if self.dismiss_prompts {
                self.write_keystroke(driver, key, "dismissal");
                keys_sent += 1;
            }
            std::thread::sleep(self.poll_interval);
            self.pump(driver, screen);
            if Instant::now() > deadline {
                warn!("game appears stuck on a message prompt");
                break;
            }
        }
        keys_sent
    }

    fn pump(&self, driver: &mut dyn ProcessDriver, screen: &mut ScreenBuffer) {
        if let Err(e) = screen.pump(driver) {
            warn!("could not pump game output: {e}");
        }
    }

    /// Write one keystroke, degrading gracefully on a closed channel: the
    /// step proceeds without the write having taken effect.
    fn write_keystroke(&self, driver: &mut dyn ProcessDriver, key: u8, what: &str) {
        if let Err(e) = driver.write(&[key]) {
            warn!("could not write {what} keystroke: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{rogue_screen, screen_bytes, status_line, ScriptedDriver};

    fn options(poll_ms: u64, max_ms: u64) -> RogueBoxOptions {
        RogueBoxOptions {
            poll_interval_ms: poll_ms,
            max_wait_ms: max_ms,
            refresh_after_commands: false,
            ..RogueBoxOptions::default()
        }
    }

    #[test]
    fn pager_prompt_needs_dismissal() {
        let screen = rogue_screen(&["@"], &status_line(1, None), "--More--");
        assert!(needs_dismissal(&screen));

        let clear = rogue_screen(&["@"], &status_line(1, None), "");
        assert!(!needs_dismissal(&clear));
    }

    #[test]
    fn name_prompt_needs_dismissal() {
        let screen = rogue_screen(&["@"], &status_line(1, None), "Call it:");
        assert!(needs_dismissal(&screen));
    }

    #[test]
    fn counter_mode_settles_when_counter_advances() {
        let mut driver = ScriptedDriver::new();
        let settled = rogue_screen(&[".@"], &status_line(1, Some(6)), "");
        driver.push_on_write(screen_bytes(&settled));
        let probe = driver.probe();

        let mut screen = ScreenBuffer::new();
        screen.feed(&screen_bytes(&rogue_screen(&["@."], &status_line(1, Some(5)), "")));
        let parser = FrameParser::new();

        let engine = SyncEngine::new(&options(1, 1_000));
        engine
            .send_and_settle('l', Some(5), &mut driver, &mut screen, &parser)
            .expect("should settle");

        assert_eq!(probe.writes(), vec![b"l".to_vec()]);
        assert!(screen.rows()[23].contains("Cmd: 6"));
    }

    #[test]
    fn counter_mode_times_out_on_silent_game() {
        let mut driver = ScriptedDriver::new();
        let mut screen = ScreenBuffer::new();
        screen.feed(&screen_bytes(&rogue_screen(&["@"], &status_line(1, Some(5)), "")));
        let parser = FrameParser::new();

        let engine = SyncEngine::new(&options(1, 20));
        let err = engine
            .send_and_settle('h', Some(5), &mut driver, &mut screen, &parser)
            .unwrap_err();
        assert!(matches!(err, RogueError::SyncTimeout { .. }));
    }

    #[test]
    fn fixed_delay_performs_exactly_one_poll() {
        let mut driver = ScriptedDriver::new();
        let settled = rogue_screen(&[".@"], &status_line(1, None), "");
        driver.push_on_write(screen_bytes(&settled));
        let probe = driver.probe();

        let mut screen = ScreenBuffer::new();
        screen.feed(&screen_bytes(&rogue_screen(&["@."], &status_line(1, None), "")));
        let parser = FrameParser::new();

        // max wait 50ms, poll 10ms, no counter support
        let engine = SyncEngine::new(&options(10, 50));
        engine
            .send_and_settle('h', None, &mut driver, &mut screen, &parser)
            .expect("fixed delay never times out");

        assert_eq!(probe.read_calls(), 1);
    }

    #[test]
    fn dismissal_sends_key_and_counts_extra_work() {
        let mut driver = ScriptedDriver::new();
        // command write -> screen with a pager prompt and a stale counter;
        // dismissal write -> clear screen with the counter advanced by 2
        // (one for the command, one for the dismissal keystroke)
        let prompted = rogue_screen(&["@"], &status_line(1, Some(5)), "--More--");
        let cleared = rogue_screen(&[".@"], &status_line(1, Some(7)), "");
        driver.push_on_write(screen_bytes(&prompted));
        driver.push_on_write(screen_bytes(&cleared));
        let probe = driver.probe();

        let mut screen = ScreenBuffer::new();
        screen.feed(&screen_bytes(&rogue_screen(&["@"], &status_line(1, Some(5)), "")));
        let parser = FrameParser::new();

        let engine = SyncEngine::new(&options(1, 1_000));
        engine
            .send_and_settle('l', Some(5), &mut driver, &mut screen, &parser)
            .expect("should settle after dismissal");

        let writes = probe.writes();
        assert_eq!(writes[0], b"l".to_vec());
        assert!(writes.contains(&vec![PAGER_DISMISS_KEY]));
        assert!(!needs_dismissal(&screen.rows()));
    }

    #[test]
    fn dismissal_disabled_leaves_prompt_visible() {
        let mut driver = ScriptedDriver::new();
        let prompted = rogue_screen(&["@"], &status_line(1, None), "--More--");
        driver.push_on_write(screen_bytes(&prompted));
        let probe = driver.probe();

        let mut screen = ScreenBuffer::new();
        let parser = FrameParser::new();

        let mut opts = options(1, 20);
        opts.dismiss_prompts = false;
        let engine = SyncEngine::new(&opts);
        engine
            .send_and_settle('h', None, &mut driver, &mut screen, &parser)
            .expect("fixed delay never times out");

        // only the command keystroke was written, never a space
        assert_eq!(probe.writes(), vec![b"h".to_vec()]);
        assert!(needs_dismissal(&screen.rows()));
    }
}
