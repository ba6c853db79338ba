/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the working
/// directory, or the user/system data directories.
/// Falls back to sensible defaults if the file is missing or incomplete.
/// The difficulty profiles themselves are fixed game data; config only
/// picks which one a session starts with.

use serde::Deserialize;
use std::path::PathBuf;

// ── Difficulty profiles ──

/// Tuning knobs of one difficulty profile, immutable once a session
/// starts. All values are in scheduler ticks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpeedProfile {
    /// Ticks a broken cell accumulates before advancing one decay stage.
    pub decay_speed: u8,
    /// High-jump side-window after the first and second rows.
    pub hijump_window_a: u8,
    /// High-jump side-window after the final row (the long one).
    pub hijump_window_b: u8,
    /// Control-repeat delay armed by successful moves.
    pub control_delay: u8,
    /// Ticks accumulated per one-row fall.
    pub fall_speed: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Difficulty {
    #[default]
    Normal,
    Slow,
}

impl Difficulty {
    pub fn profile(self) -> SpeedProfile {
        match self {
            Difficulty::Normal => SpeedProfile {
                decay_speed: 17,
                hijump_window_a: 6,
                hijump_window_b: 20,
                control_delay: 8,
                fall_speed: 4,
            },
            Difficulty::Slow => SpeedProfile {
                decay_speed: 25,
                hijump_window_a: 8,
                hijump_window_b: 26,
                control_delay: 8,
                fall_speed: 5,
            },
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Difficulty::Normal => Difficulty::Slow,
            Difficulty::Slow => Difficulty::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Normal => "NORMAL",
            Difficulty::Slow => "SLOW",
        }
    }

    fn from_name(s: &str) -> Option<Difficulty> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Difficulty::Normal),
            "slow" => Some(Difficulty::Slow),
            _ => None,
        }
    }
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Frame-clock period in milliseconds (the original ran at ~60 Hz).
    pub tick_ms: u64,
    /// Profile a fresh session starts with; the menu can toggle it.
    pub difficulty: Difficulty,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub trigger: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "default_difficulty")]
    difficulty: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_trigger")]
    trigger: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_tick_ms() -> u64 { 17 }  // ~59 Hz, one row of fall every 4 ticks on NORMAL
fn default_difficulty() -> String { "normal".into() }

fn default_trigger() -> Vec<String> { vec!["A".into(), "R1".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            tick_ms: default_tick_ms(),
            difficulty: default_difficulty(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            trigger: default_trigger(),
            pause: default_pause(),
            quit: default_quit(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// then user/system data dirs. Missing file or missing keys
    /// gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());

        let difficulty = match Difficulty::from_name(&toml_cfg.game.difficulty) {
            Some(d) => d,
            None => {
                eprintln!(
                    "Warning: unknown difficulty {:?} in config.toml, using normal.",
                    toml_cfg.game.difficulty
                );
                Difficulty::Normal
            }
        };

        GameConfig {
            tick_ms: toml_cfg.game.tick_ms.max(1),
            difficulty,
            gamepad: GamepadConfig {
                trigger: toml_cfg.gamepad.trigger,
                pause: toml_cfg.gamepad.pause,
                quit: toml_cfg.gamepad.quit,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a /usr/bin shim still finds data next to
        // the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/mineshaft)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mineshaft");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/mineshaft)
    let sys = PathBuf::from("/usr/share/mineshaft");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_match_the_tuning_tables() {
        let n = Difficulty::Normal.profile();
        assert_eq!((n.decay_speed, n.fall_speed), (17, 4));
        assert_eq!((n.hijump_window_a, n.hijump_window_b), (6, 20));
        let s = Difficulty::Slow.profile();
        assert_eq!((s.decay_speed, s.fall_speed), (25, 5));
        assert_eq!((s.hijump_window_a, s.hijump_window_b), (8, 26));
        // Control repeat is the same on both.
        assert_eq!(n.control_delay, s.control_delay);
    }

    #[test]
    fn difficulty_names_parse_case_insensitively() {
        assert_eq!(Difficulty::from_name("Normal"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_name("SLOW"), Some(Difficulty::Slow));
        assert_eq!(Difficulty::from_name("turbo"), None);
    }

    #[test]
    fn toggle_flips_between_the_two_profiles() {
        assert_eq!(Difficulty::Normal.toggled(), Difficulty::Slow);
        assert_eq!(Difficulty::Slow.toggled(), Difficulty::Normal);
    }
}
