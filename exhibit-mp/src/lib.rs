//! # Exhibit Media Player Library (exhibit-mp)
//!
//! Shows one of a fixed catalog of video clips on a single screen, switching
//! clips on request from an operator console and an exhibit controller.
//!
//! **Architecture:** two input contexts (console, controller) hand requests
//! to a single scheduler thread through single-slot mailboxes. The scheduler
//! owns the playback engine and decides, per clip replay policy, when a
//! request takes effect.

pub mod commands;
pub mod console;
pub mod controller;
pub mod engine;
pub mod error;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
