//! Configuration loading
//!
//! The media player is configured by a single TOML bootstrap file read once at
//! startup. It cannot change while running; restart to pick up edits.
//!
//! # Config File Location Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`EXHIBIT_MP_CONFIG`)
//! 3. User config: `~/.config/exhibit-mp/config.toml`
//! 4. System config: `/etc/exhibit-mp/config.toml`
//!
//! # Example
//!
//! ```toml
//! media_root = "/home/pi/Downloads"
//! controller_tty = "/dev/ttyACM0"
//! background = "idle"
//!
//! [[clips]]
//! name = "idle"
//! file = "idle.mp4"
//! policy = "loop"
//!
//! [[clips]]
//! name = "decide1"
//! file = "decide1.mp4"
//! policy = "play_once"
//! ```
//!
//! For a shared-timeline video, set `timeline = "exhibit.mp4"` and give each
//! clip `start_ms`/`end_ms` instead of `file`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::ClipCatalog;
use crate::clip::{Clip, ClipBounds, ClipId, ReplayPolicy};
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "EXHIBIT_MP_CONFIG";

const CONFIG_DIR_NAME: &str = "exhibit-mp";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Folder that relative clip files and the timeline are resolved against
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Shared timeline file. When set, clips are intervals of this file.
    #[serde(default)]
    pub timeline: Option<PathBuf>,

    /// Serial line to the exhibit controller
    #[serde(default = "default_controller_tty")]
    pub controller_tty: PathBuf,

    /// Background loop clip, by name or id (default: clip 0)
    #[serde(default)]
    pub background: Option<String>,

    /// Scheduler tick interval
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Added to the engine's reported position before comparing against a
    /// clip's end offset. Compensates for editor vs. engine clock skew.
    #[serde(default)]
    pub calibration_offset_ms: i64,

    /// How long to wait for the engine to confirm a clip started
    #[serde(default = "default_start_timeout_ms")]
    pub start_timeout_ms: u64,

    /// Extra start attempts before a playback start failure is fatal
    #[serde(default = "default_start_retries")]
    pub start_retries: u32,

    /// Start in fullscreen mode
    #[serde(default = "default_fullscreen")]
    pub fullscreen: bool,

    /// Playback engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The clip catalog, in id order
    #[serde(default)]
    pub clips: Vec<ClipConfig>,
}

/// Which playback engine drives the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// External VLC process driven over its `rc` interface
    #[default]
    Vlc,
    /// In-process clock, no video output
    Simulated,
}

/// Playback engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    /// VLC executable
    #[serde(default = "default_vlc_command")]
    pub vlc_command: String,

    /// Extra arguments passed to VLC
    #[serde(default)]
    pub vlc_args: Vec<String>,

    /// How long to wait for a reply on the VLC control interface
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Clip length assumed by the simulated engine when a clip has none
    #[serde(default = "default_simulated_clip_ms")]
    pub simulated_clip_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            vlc_command: default_vlc_command(),
            vlc_args: Vec::new(),
            reply_timeout_ms: default_reply_timeout_ms(),
            simulated_clip_ms: default_simulated_clip_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// One `[[clips]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct ClipConfig {
    pub name: String,

    /// File relative to `media_root` (per-file catalogs)
    #[serde(default)]
    pub file: Option<PathBuf>,

    pub policy: ReplayPolicy,

    /// Interval within the shared timeline
    #[serde(default)]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub end_ms: Option<u64>,

    /// Nominal length for engines that cannot read it from media
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

fn default_media_root() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_controller_tty() -> PathBuf {
    PathBuf::from("/dev/ttyACM0")
}

fn default_tick_ms() -> u64 {
    100
}

fn default_start_timeout_ms() -> u64 {
    5_000
}

fn default_start_retries() -> u32 {
    2
}

fn default_fullscreen() -> bool {
    true
}

fn default_vlc_command() -> String {
    "cvlc".to_string()
}

fn default_reply_timeout_ms() -> u64 {
    500
}

fn default_simulated_clip_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&toml_str)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse config from TOML text and validate scalar settings
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(toml_str)?;
        if config.tick_ms == 0 {
            return Err(Error::Config("tick_ms must be greater than zero".to_string()));
        }
        if config.clips.is_empty() {
            return Err(Error::Config("no [[clips]] defined".to_string()));
        }
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    /// Absolute path of the shared timeline, if clips share one
    pub fn timeline_path(&self) -> Option<PathBuf> {
        self.timeline.as_ref().map(|t| self.resolve_media(t))
    }

    fn resolve_media(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.media_root.join(path)
        }
    }

    /// Build the clip catalog described by this config
    pub fn build_catalog(&self) -> Result<ClipCatalog> {
        let timeline = self.timeline_path();

        let clips = self
            .clips
            .iter()
            .enumerate()
            .map(|(index, def)| self.build_clip(index, def, timeline.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let background = match self.background.as_deref() {
            None => ClipId(0),
            Some(key) => {
                let by_name = clips.iter().find(|c| c.name == key).map(|c| c.id);
                by_name
                    .or_else(|| key.parse::<ClipId>().ok())
                    .ok_or_else(|| Error::Config(format!("unknown background clip '{}'", key)))?
            }
        };

        let catalog = ClipCatalog::new(clips, background)?;
        debug!(
            "Built catalog of {} clips, background {}",
            catalog.count(),
            catalog.default_background()
        );
        Ok(catalog)
    }

    fn build_clip(&self, index: usize, def: &ClipConfig, timeline: Option<&Path>) -> Result<Clip> {
        let (media, bounds) = match timeline {
            Some(timeline) => {
                let (start_ms, end_ms) = match (def.start_ms, def.end_ms) {
                    (Some(start), Some(end)) => (start, end),
                    _ => {
                        return Err(Error::Config(format!(
                            "clip '{}' needs start_ms and end_ms when a timeline is set",
                            def.name
                        )))
                    }
                };
                (timeline.to_path_buf(), Some(ClipBounds { start_ms, end_ms }))
            }
            None => {
                let file = def.file.as_ref().ok_or_else(|| {
                    Error::Config(format!("clip '{}' needs a file", def.name))
                })?;
                (self.resolve_media(file), None)
            }
        };

        Ok(Clip {
            id: ClipId(index),
            name: def.name.clone(),
            media,
            policy: def.policy,
            bounds,
            duration_ms: def.duration_ms,
        })
    }
}

/// Locate the config file
///
/// Returns the first candidate in priority order. CLI and environment paths
/// are returned even if missing so the load error names them.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: user config, then system config
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    let system_config = PathBuf::from("/etc")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    if system_config.exists() {
        return Ok(system_config);
    }

    Err(Error::Config(format!(
        "no config file found; pass --config or set {}",
        CONFIG_ENV_VAR
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[clips]]
        name = "idle"
        file = "idle.mp4"
        policy = "loop"
    "#;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.calibration_offset_ms, 0);
        assert_eq!(config.start_retries, 2);
        assert_eq!(config.controller_tty, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(config.engine.kind, EngineKind::Vlc);
        assert_eq!(config.engine.vlc_command, "cvlc");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert!(config.fullscreen);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let toml = format!("tick_ms = 0\n{}", MINIMAL);
        assert!(matches!(TomlConfig::from_toml_str(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let toml = r#"
            [[clips]]
            name = "idle"
            file = "idle.mp4"
            policy = "sometimes"
        "#;
        assert!(matches!(TomlConfig::from_toml_str(toml), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_policy_spellings() {
        let toml = r#"
            [[clips]]
            name = "idle"
            file = "idle.mp4"
            policy = "Loop"

            [[clips]]
            name = "decide1"
            file = "decide1.mp4"
            policy = "PlayOnce"

            [[clips]]
            name = "place1"
            file = "place1.mp4"
            policy = "through"
        "#;
        let config = TomlConfig::from_toml_str(toml).unwrap();
        let policies: Vec<_> = config.clips.iter().map(|c| c.policy).collect();
        assert_eq!(
            policies,
            vec![ReplayPolicy::Loop, ReplayPolicy::PlayOnce, ReplayPolicy::PlayThrough]
        );
    }
}
