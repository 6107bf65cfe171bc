//! Common error types for the exhibit media player

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for exhibit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the exhibit crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read
    #[error("Cannot read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for our schema
    #[error("Cannot parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Clip catalog is inconsistent
    #[error("Invalid clip catalog: {0}")]
    Catalog(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
