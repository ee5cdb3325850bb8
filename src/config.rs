/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub subframes: u32,      // render ticks per simulation turn
    pub intro_ticks: u32,    // level-name splash before play starts
    pub dying_ticks: u32,    // splat pause before reloading
    pub cleared_ticks: u32,  // pause on level clear before the next level
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub save: Vec<String>,
    pub load: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_subframes")]
    subframes: u32,
    #[serde(default = "default_intro_ticks")]
    intro_ticks: u32,
    #[serde(default = "default_dying_ticks")]
    dying_ticks: u32,
    #[serde(default = "default_cleared_ticks")]
    cleared_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_save")]
    save: Vec<String>,
    #[serde(default = "default_load")]
    load: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_subframes() -> u32 { 4 }     // one simulation turn per 4 render ticks
fn default_intro_ticks() -> u32 { 30 }  // ~1s level-name splash
fn default_dying_ticks() -> u32 { 20 }
fn default_cleared_ticks() -> u32 { 25 }

fn default_save() -> Vec<String> { vec!["X".into()] }
fn default_load() -> Vec<String> { vec!["Y".into()] }
fn default_restart() -> Vec<String> { vec!["B".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            subframes: default_subframes(),
            intro_ticks: default_intro_ticks(),
            dying_ticks: default_dying_ticks(),
            cleared_ticks: default_cleared_ticks(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            save: default_save(),
            load: default_load(),
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        let t = TomlSpeed::default();
        SpeedConfig {
            tick_rate_ms: t.tick_rate_ms,
            subframes: t.subframes,
            intro_ticks: t.intro_ticks,
            dying_ticks: t.dying_ticks,
            cleared_ticks: t.cleared_ticks,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();

        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms,
                subframes: toml_cfg.speed.subframes.max(1),
                intro_ticks: toml_cfg.speed.intro_ticks,
                dying_ticks: toml_cfg.speed.dying_ticks,
                cleared_ticks: toml_cfg.speed.cleared_ticks,
            },
            gamepad: GamepadConfig {
                save: toml_cfg.gamepad.save,
                load: toml_cfg.gamepad.load,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a /usr/bin wrapper still finds data
        // relative to the real binary.
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

    // 3. XDG data home (~/.local/share/stonefall)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/stonefall");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/stonefall)
    let sys = PathBuf::from("/usr/share/stonefall");
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
