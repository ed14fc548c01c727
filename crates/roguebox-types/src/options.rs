//! Per-run configuration for the roguebox orchestrator.
//!
//! Options are supplied by the caller, read-only for the lifetime of a run,
//! and serde-derived so they can be loaded from a TOML file and merged with
//! CLI overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RogueError;

/// Config files larger than this are rejected rather than parsed.
const MAX_OPTIONS_FILE_SIZE: u64 = 64 * 1024;

/// Configuration for one [`RogueBox`] run.
///
/// All durations are expressed in milliseconds so the struct stays plain
/// serde data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RogueBoxOptions {
    /// Path to the game executable. `None` means "resolve `rogue` from
    /// PATH".
    pub game_exe_path: Option<PathBuf>,
    /// Arguments passed to the game at launch. Empty strings are filtered
    /// out before spawning.
    pub game_args: Vec<String>,
    /// Interval between consecutive polls while waiting for the game to
    /// settle.
    pub poll_interval_ms: u64,
    /// Upper bound on the total wait for one command. On expiry the child
    /// is killed and the step reported as lost.
    pub max_wait_ms: u64,
    /// Send a refresh keystroke (Ctrl-R) after every command so the game
    /// redraws tiles it skipped.
    pub refresh_after_commands: bool,
    /// Send the dismissal keystroke when a blocking prompt is detected.
    /// When false the prompt is left on screen for the caller to see.
    pub dismiss_prompts: bool,
    /// Once the amulet level has been observed, rewrite the descend command
    /// into its ascend counterpart for the rest of the run.
    pub transform_descent_action: bool,
    /// Dungeon level at which the descent transform latches.
    pub amulet_level: u32,
    /// Perform one throwaway move right after start so the tile below the
    /// player becomes known.
    pub move_rogue: bool,
    /// Step budget enforced by the default evaluator.
    pub max_step_count: u32,
    /// How many recent episodes the default evaluator averages over.
    pub episodes_for_evaluation: usize,
    /// Reward generator selected by registry name.
    pub reward_generator: String,
    /// State generator selected by registry name.
    pub state_generator: String,
    /// Evaluator selected by registry name.
    pub evaluator: String,
}

impl Default for RogueBoxOptions {
    fn default() -> Self {
        Self {
            game_exe_path: None,
            game_args: Vec::new(),
            poll_interval_ms: 1,
            max_wait_ms: 5_000,
            refresh_after_commands: true,
            dismiss_prompts: true,
            transform_descent_action: false,
            amulet_level: 26,
            move_rogue: false,
            max_step_count: 500,
            episodes_for_evaluation: 100,
            reward_generator: "stairs-only".to_string(),
            state_generator: "dummy".to_string(),
            evaluator: "episode".to_string(),
        }
    }
}

impl RogueBoxOptions {
    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RogueError> {
        let meta = std::fs::metadata(path)
            .map_err(|e| RogueError::Configuration(format!("{}: {e}", path.display())))?;
        if meta.len() > MAX_OPTIONS_FILE_SIZE {
            return Err(RogueError::Configuration(format!(
                "options file {} too large ({} bytes)",
                path.display(),
                meta.len()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| RogueError::Configuration(format!("{}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| RogueError::Configuration(format!("{}: {e}", path.display())))
    }

    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The maximum settle wait as a [`Duration`].
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let opts = RogueBoxOptions::default();
        assert_eq!(opts.poll_interval(), Duration::from_millis(1));
        assert_eq!(opts.max_wait(), Duration::from_secs(5));
        assert!(opts.refresh_after_commands);
        assert!(opts.dismiss_prompts);
        assert!(!opts.transform_descent_action);
        assert_eq!(opts.amulet_level, 26);
    }

    #[test]
    fn load_from_toml_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_wait_ms = 50\npoll_interval_ms = 10\nreward_generator = \"dummy\""
        )
        .unwrap();

        let opts = RogueBoxOptions::load(file.path()).unwrap();
        assert_eq!(opts.max_wait_ms, 50);
        assert_eq!(opts.poll_interval_ms, 10);
        assert_eq!(opts.reward_generator, "dummy");
        // untouched fields keep their defaults
        assert_eq!(opts.max_step_count, 500);
    }

    #[test]
    fn load_missing_file_is_configuration_error() {
        let err = RogueBoxOptions::load(Path::new("/nonexistent/options.toml")).unwrap_err();
        assert!(matches!(err, RogueError::Configuration(_)));
    }

    #[test]
    fn load_malformed_toml_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_wait_ms = \"not a number\"").unwrap();
        let err = RogueBoxOptions::load(file.path()).unwrap_err();
        assert!(matches!(err, RogueError::Configuration(_)));
    }
}
