//! Simulated engine
//!
//! Advances a wall-clock playhead from the clip's start offset and stops
//! producing output at the clip's end. Used for dry runs on machines without
//! a display or VLC.

use std::time::Instant;

use exhibit_common::Clip;
use tracing::debug;

use super::PlaybackClock;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Run {
    start_ms: u64,
    end_ms: u64,
    started: Instant,
}

impl Run {
    fn position_ms(&self) -> u64 {
        let elapsed = self.started.elapsed().as_millis() as u64;
        (self.start_ms + elapsed).min(self.end_ms)
    }
}

pub struct SimulatedEngine {
    /// Clip length used when a clip has no known end
    default_clip_ms: u64,
    run: Option<Run>,
    /// Position frozen by the last pause
    paused_at: Option<u64>,
    fullscreen: bool,
}

impl SimulatedEngine {
    pub fn new(default_clip_ms: u64, fullscreen: bool) -> Self {
        Self {
            default_clip_ms,
            run: None,
            paused_at: None,
            fullscreen,
        }
    }
}

impl PlaybackClock for SimulatedEngine {
    fn start(&mut self, clip: &Clip) -> Result<()> {
        let start_ms = clip.start_ms();
        let end_ms = clip
            .end_ms()
            .unwrap_or(start_ms + self.default_clip_ms);
        debug!("[sim] start {} at {} ms (ends {} ms)", clip, start_ms, end_ms);
        self.paused_at = None;
        self.run = Some(Run {
            start_ms,
            end_ms,
            started: Instant::now(),
        });
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(run) = self.run.take() {
            self.paused_at = Some(run.position_ms());
        }
        Ok(())
    }

    fn position_ms(&mut self) -> Option<u64> {
        self.run.as_ref().map(Run::position_ms).or(self.paused_at)
    }

    fn is_playing(&mut self) -> bool {
        self.run
            .as_ref()
            .map(|run| run.position_ms() < run.end_ms)
            .unwrap_or(false)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<bool> {
        self.fullscreen = fullscreen;
        Ok(self.fullscreen)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn shutdown(&mut self) {
        self.run = None;
        self.paused_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibit_common::clip::ClipBounds;
    use exhibit_common::{ClipId, ReplayPolicy};
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    fn clip(bounds: Option<ClipBounds>, duration_ms: Option<u64>) -> Clip {
        Clip {
            id: ClipId(1),
            name: "decide1".to_string(),
            media: PathBuf::from("/media/decide1.mp4"),
            policy: ReplayPolicy::PlayOnce,
            bounds,
            duration_ms,
        }
    }

    #[test]
    fn test_starts_at_clip_offset() {
        let mut engine = SimulatedEngine::new(10_000, true);
        assert!(!engine.is_playing());
        assert_eq!(engine.position_ms(), None);

        engine
            .start(&clip(Some(ClipBounds { start_ms: 30_000, end_ms: 40_000 }), None))
            .unwrap();
        assert!(engine.is_playing());
        let pos = engine.position_ms().unwrap();
        assert!((30_000..40_000).contains(&pos));
    }

    #[test]
    fn test_stops_at_end() {
        let mut engine = SimulatedEngine::new(10_000, true);
        engine.start(&clip(None, Some(20))).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert!(!engine.is_playing());
        assert_eq!(engine.position_ms(), Some(20));
    }

    #[test]
    fn test_pause_stops_output() {
        let mut engine = SimulatedEngine::new(10_000, true);
        engine.start(&clip(None, None)).unwrap();
        engine.pause().unwrap();
        assert!(!engine.is_playing());
        assert!(engine.position_ms().is_some());
    }

    #[test]
    fn test_fullscreen() {
        let mut engine = SimulatedEngine::new(10_000, true);
        assert!(engine.is_fullscreen());
        assert!(!engine.set_fullscreen(false).unwrap());
        assert!(!engine.is_fullscreen());
    }
}
