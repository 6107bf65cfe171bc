//! # Exhibit Common Library
//!
//! Shared code for the exhibit media player:
//! - Clip definitions and the immutable clip catalog
//! - Configuration loading (TOML bootstrap file)
//! - Controller line protocol
//! - Common error type

pub mod catalog;
pub mod clip;
pub mod config;
pub mod error;
pub mod protocol;

pub use catalog::ClipCatalog;
pub use clip::{Clip, ClipId, ReplayPolicy};
pub use error::{Error, Result};
