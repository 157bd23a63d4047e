// Configuration loading and parsing (config/draft.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::draft::pick::Position;
use crate::engine::DEFAULT_CHOICES_PER_PICK;
use crate::orchestrator::DEFAULT_MAX_PARTICIPANTS;

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "draft.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolConfig,
    pub rounds: RoundsConfig,
    pub timeouts: TimeoutConfig,
    /// Path of the JSON file holding every participant's roster.
    pub save_file: String,
    pub server_port: u16,
    pub command_prefix: String,
}

// ---------------------------------------------------------------------------
// draft.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draft.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DraftFile {
    pool: PoolConfig,
    rounds: RoundsSection,
    timeouts: TimeoutConfig,
    storage: StorageSection,
    server: ServerSection,
    #[serde(default)]
    commands: CommandsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct RoundsSection {
    positions: Vec<String>,
    free_picks: usize,
    #[serde(default = "default_choices_per_pick")]
    choices_per_pick: usize,
    #[serde(default = "default_max_participants")]
    max_participants: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct StorageSection {
    save_file: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct CommandsSection {
    prefix: String,
}

impl Default for CommandsSection {
    fn default() -> Self {
        CommandsSection {
            prefix: "!".into(),
        }
    }
}

fn default_choices_per_pick() -> usize {
    DEFAULT_CHOICES_PER_PICK
}

fn default_max_participants() -> usize {
    DEFAULT_MAX_PARTICIPANTS
}

/// Where the player pool comes from and which ratings are draftable.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub csv_path: String,
    /// Lowest draftable OVR (inclusive).
    pub min_ovr: u32,
    /// Highest draftable OVR (inclusive).
    pub max_ovr: u32,
}

/// Round structure of a session.
#[derive(Debug, Clone)]
pub struct RoundsConfig {
    /// One position round per entry; shuffled once per session.
    pub positions: Vec<Position>,
    pub free_picks: usize,
    pub choices_per_pick: usize,
    /// Largest player count a session accepts.
    pub max_participants: usize,
    /// Fixed RNG seed for reproducible sessions. `None` uses OS entropy.
    pub seed: Option<u64>,
}

/// Per-prompt wait bounds, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    pub player_count_secs: u64,
    pub join_secs: u64,
    pub pick_secs: u64,
}

impl TimeoutConfig {
    pub fn player_count(&self) -> Duration {
        Duration::from_secs(self.player_count_secs)
    }

    pub fn join(&self) -> Duration {
        Duration::from_secs(self.join_secs)
    }

    pub fn pick(&self) -> Duration {
        Duration::from_secs(self.pick_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draft.toml` relative to
/// `base_dir`. Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse config text. `path` is only used for error reporting.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: DraftFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut positions = Vec::with_capacity(file.rounds.positions.len());
    for code in &file.rounds.positions {
        let pos = Position::from_code(code).ok_or_else(|| ConfigError::ValidationError {
            field: "rounds.positions".into(),
            message: format!("unknown position code `{code}`"),
        })?;
        positions.push(pos);
    }

    let config = Config {
        pool: file.pool,
        rounds: RoundsConfig {
            positions,
            free_picks: file.rounds.free_picks,
            choices_per_pick: file.rounds.choices_per_pick,
            max_participants: file.rounds.max_participants,
            seed: file.rounds.seed,
        },
        timeouts: file.timeouts,
        save_file: file.storage.save_file,
        server_port: file.server.port,
        command_prefix: file.commands.prefix,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/draft.toml` to `config/draft.toml` unless the latter
/// already exists. Returns the new file's path when a copy was made.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} under config/ or defaults/ in {}",
                base_dir.display()
            ),
        });
    }

    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(copy_error)?;
    }
    // create_new keeps a file written in between untouched.
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(copy_error(e)),
    };
    let mut src = std::fs::File::open(&source).map_err(copy_error)?;
    std::io::copy(&mut src, &mut dest).map_err(copy_error)?;

    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding it from
/// `defaults/` on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.pool.min_ovr > config.pool.max_ovr {
        return Err(ConfigError::ValidationError {
            field: "pool.min_ovr".into(),
            message: format!(
                "must not exceed pool.max_ovr ({} > {})",
                config.pool.min_ovr, config.pool.max_ovr
            ),
        });
    }

    if config.rounds.positions.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "rounds.positions".into(),
            message: "must list at least one position".into(),
        });
    }

    // Choices are answered with a single digit.
    if !(1..=9).contains(&config.rounds.choices_per_pick) {
        return Err(ConfigError::ValidationError {
            field: "rounds.choices_per_pick".into(),
            message: format!(
                "must be between 1 and 9 inclusive, got {}",
                config.rounds.choices_per_pick
            ),
        });
    }

    if config.rounds.max_participants == 0 {
        return Err(ConfigError::ValidationError {
            field: "rounds.max_participants".into(),
            message: "must be > 0".into(),
        });
    }

    let t = &config.timeouts;
    let timeout_fields: &[(&str, u64)] = &[
        ("timeouts.player_count_secs", t.player_count_secs),
        ("timeouts.join_secs", t.join_secs),
        ("timeouts.pick_secs", t.pick_secs),
    ];
    for (name, val) in timeout_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.command_prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "commands.prefix".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
