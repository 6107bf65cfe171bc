//! Playback engine adapters
//!
//! The scheduler never decodes or renders anything itself. It drives an
//! external engine through [`PlaybackClock`]: start a clip at its start
//! offset, ask where the playhead is, ask whether output is being produced.
//! Only the scheduler thread ever touches the engine.
//!
//! - `vlc.rs`: external VLC process controlled over its `rc` interface
//! - `simulated.rs`: in-process clock with no output, for dry runs

mod simulated;
mod vlc;

pub use simulated::SimulatedEngine;
pub use vlc::VlcRemote;

use exhibit_common::config::{EngineKind, TomlConfig};
use exhibit_common::{Clip, ClipCatalog};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Synchronous control surface of a playback engine
pub trait PlaybackClock: Send {
    /// Begin producing output for `clip` from its start offset
    fn start(&mut self, clip: &Clip) -> Result<()>;

    /// Stop producing output
    fn pause(&mut self) -> Result<()>;

    /// Playhead position on the media timeline, if known
    fn position_ms(&mut self) -> Option<u64>;

    /// Whether the engine is currently producing output
    fn is_playing(&mut self) -> bool;

    /// Switch display mode; returns the resulting mode
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<bool>;

    fn is_fullscreen(&self) -> bool;

    /// Stop output and release the engine
    fn shutdown(&mut self);
}

impl<T: PlaybackClock + ?Sized> PlaybackClock for Box<T> {
    fn start(&mut self, clip: &Clip) -> Result<()> {
        (**self).start(clip)
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn position_ms(&mut self) -> Option<u64> {
        (**self).position_ms()
    }

    fn is_playing(&mut self) -> bool {
        (**self).is_playing()
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<bool> {
        (**self).set_fullscreen(fullscreen)
    }

    fn is_fullscreen(&self) -> bool {
        (**self).is_fullscreen()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// Check that every clip's media can be opened
pub fn verify_media(catalog: &ClipCatalog) -> Result<()> {
    for clip in catalog.iter() {
        if let Err(e) = std::fs::File::open(&clip.media) {
            debug!("Open {:?} failed: {}", clip.media, e);
            return Err(Error::ClipMedia {
                name: clip.name.clone(),
                path: clip.media.clone(),
            });
        }
    }
    Ok(())
}

/// Construct the engine selected by configuration
pub fn create_engine(config: &TomlConfig, catalog: &ClipCatalog) -> Result<Box<dyn PlaybackClock>> {
    match config.engine.kind {
        EngineKind::Vlc => {
            verify_media(catalog)?;
            let engine = VlcRemote::spawn(&config.engine, config.fullscreen)?;
            info!("VLC engine ready ({})", config.engine.vlc_command);
            Ok(Box::new(engine))
        }
        EngineKind::Simulated => {
            info!("Simulated engine ready (no video output)");
            Ok(Box::new(SimulatedEngine::new(
                config.engine.simulated_clip_ms,
                config.fullscreen,
            )))
        }
    }
}
