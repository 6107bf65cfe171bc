//! Error types for exhibit-mp
//!
//! Only startup resource failures and playback start failures surface as
//! errors. Invalid requests and controller write failures are logged where
//! they are detected and never propagate.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit code for a normal shutdown
pub const EXIT_OK: i32 = 0;

/// Main error type for exhibit-mp
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] exhibit_common::Error),

    /// Playback engine could not be constructed
    #[error("Engine init failed: {0}")]
    EngineInit(String),

    /// A clip's media cannot be opened by the engine
    #[error("Cannot open media for clip '{name}' at {path:?}")]
    ClipMedia { name: String, path: PathBuf },

    /// Engine refused to start a clip, or never confirmed it started
    #[error("Playback start failed: {0}")]
    PlaybackStart(String),

    /// Worker thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Controller serial line could not be opened
    #[error("Failed to open controller tty {path:?}: {source}")]
    ControllerOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Engine control channel failed mid-run
    #[error("Engine I/O error: {0}")]
    EngineIo(#[from] std::io::Error),

    /// Command registry misconfigured
    #[error("Duplicate command verb '{0}'")]
    DuplicateVerb(String),
}

impl Error {
    /// Distinct process exit code per failure category
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::EngineInit(_) => -1,
            Error::ClipMedia { .. } => -2,
            Error::PlaybackStart(_) | Error::EngineIo(_) => -3,
            Error::ThreadSpawn { .. } => -4,
            Error::ControllerOpen { .. } => -5,
            Error::Config(_) | Error::DuplicateVerb(_) => -6,
        }
    }
}

/// Convenience Result type using exhibit-mp Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_distinct_per_category() {
        let io = || std::io::Error::new(std::io::ErrorKind::Other, "x");
        let errors = vec![
            Error::EngineInit("x".to_string()),
            Error::ClipMedia { name: "idle".to_string(), path: PathBuf::from("/x") },
            Error::PlaybackStart("x".to_string()),
            Error::ThreadSpawn { name: "scheduler", source: io() },
            Error::ControllerOpen { path: PathBuf::from("/dev/ttyACM0"), source: io() },
            Error::Config(exhibit_common::Error::Config("x".to_string())),
        ];

        let codes: HashSet<i32> = errors.iter().map(Error::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c < 0));
        assert!(!codes.contains(&EXIT_OK));
    }
}
