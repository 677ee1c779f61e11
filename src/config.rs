/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems are collected in `warnings` and logged once tracing is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::rules::PushRule;
use crate::domain::tile::Rotation;
use crate::sim::level::{Legend, LevelRules};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    /// 1-based.
    pub start_level: usize,
    pub rules: LevelRules,
    pub log: LogConfig,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub filter: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    legend: TomlLegend,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_level")]
    start_level: usize,
}

#[derive(Deserialize, Debug, Default)]
struct TomlRules {
    #[serde(default)]
    perpendicular_push: PushRule,
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum RotationName {
    Left,
    #[default]
    Right,
}

#[derive(Deserialize, Debug, Default)]
struct TomlLegend {
    #[serde(default)]
    r_rotation: RotationName,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_start_level() -> usize { 1 }
fn default_log_file() -> String { "discaptive.log".into() }
fn default_log_filter() -> String { "discaptive=info".into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, current working directory, XDG data
    /// home, system data directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        GameConfig::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Parse config text directly (no file search, paths left relative).
    #[cfg(test)]
    fn parse(text: &str) -> Self {
        let mut warnings = vec![];
        let cfg = parse_toml(text, Path::new("config.toml"), &mut warnings);
        GameConfig::from_toml(cfg, &[], warnings)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        // Resolve levels directory
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if Path::new(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let start_level = if cfg.general.start_level == 0 {
            warnings.push("general.start_level is 1-based; using 1".into());
            1
        } else {
            cfg.general.start_level
        };

        let r_rotation = match cfg.legend.r_rotation {
            RotationName::Left => Rotation::Left,
            RotationName::Right => Rotation::Right,
        };

        GameConfig {
            levels_dir,
            start_level,
            rules: LevelRules {
                push: cfg.rules.perpendicular_push,
                legend: Legend { r_rotation },
            },
            log: LogConfig {
                file: PathBuf::from(cfg.log.file),
                filter: cfg.log.filter,
            },
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
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

    // 3. XDG data home (~/.local/share/discaptive)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/discaptive");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/discaptive)
    let sys = PathBuf::from("/usr/share/discaptive");
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
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path, warnings),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{} parse error, using default settings: {e}", path.display()));
            TomlConfig::default()
        }
    }
}
