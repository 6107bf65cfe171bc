//! Test helper modules for exhibit-mp integration tests
//!
//! - ManualEngine: scripted playback engine driven by the test
//! - catalogs: small clip catalogs and scheduler fixtures

#![allow(dead_code)]

pub mod catalogs;
pub mod manual_engine;

pub use catalogs::{exhibit_catalog, fast_config, fixture, timeline_catalog, unstarted, Fixture};
pub use manual_engine::{EngineHandle, ManualEngine};
