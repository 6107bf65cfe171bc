//! Scripted playback engine
//!
//! Starting a clip makes the engine "play" it from its start offset until
//! the test says otherwise. The test keeps an [`EngineHandle`] to end clips,
//! move the playhead and inspect what the scheduler asked for.

use std::sync::{Arc, Mutex, MutexGuard};

use exhibit_common::{Clip, ClipId};
use exhibit_mp::engine::PlaybackClock;
use exhibit_mp::Result;

#[derive(Debug, Default)]
struct Inner {
    playing: bool,
    position_ms: Option<u64>,
    fullscreen: bool,
    /// (clip, start offset) per start call, in order
    starts: Vec<(ClipId, u64)>,
    pauses: usize,
    /// Number of upcoming start calls that fail outright
    failing_starts: usize,
    /// Start calls succeed but output never begins
    silent: bool,
    shut_down: bool,
}

pub struct ManualEngine {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<Inner>>,
}

impl ManualEngine {
    pub fn new() -> (Self, EngineHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            fullscreen: true,
            ..Default::default()
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            EngineHandle { inner },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl PlaybackClock for ManualEngine {
    fn start(&mut self, clip: &Clip) -> Result<()> {
        let mut inner = self.lock();
        inner.starts.push((clip.id, clip.start_ms()));
        if inner.failing_starts > 0 {
            inner.failing_starts -= 1;
            return Err(std::io::Error::other("engine refused clip").into());
        }
        inner.playing = !inner.silent;
        inner.position_ms = Some(clip.start_ms());
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut inner = self.lock();
        inner.pauses += 1;
        inner.playing = false;
        Ok(())
    }

    fn position_ms(&mut self) -> Option<u64> {
        self.lock().position_ms
    }

    fn is_playing(&mut self) -> bool {
        self.lock().playing
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<bool> {
        self.lock().fullscreen = fullscreen;
        Ok(fullscreen)
    }

    fn is_fullscreen(&self) -> bool {
        self.lock().fullscreen
    }

    fn shutdown(&mut self) {
        let mut inner = self.lock();
        inner.playing = false;
        inner.shut_down = true;
    }
}

impl EngineHandle {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// The clip on screen reaches its natural end
    pub fn finish(&self) {
        self.lock().playing = false;
    }

    pub fn set_position(&self, position_ms: u64) {
        self.lock().position_ms = Some(position_ms);
    }

    pub fn fail_next_starts(&self, count: usize) {
        self.lock().failing_starts = count;
    }

    pub fn set_silent(&self, silent: bool) {
        self.lock().silent = silent;
    }

    pub fn starts(&self) -> Vec<(ClipId, u64)> {
        self.lock().starts.clone()
    }

    pub fn started_clips(&self) -> Vec<ClipId> {
        self.lock().starts.iter().map(|(id, _)| *id).collect()
    }

    pub fn last_start(&self) -> Option<(ClipId, u64)> {
        self.lock().starts.last().copied()
    }

    pub fn pauses(&self) -> usize {
        self.lock().pauses
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn is_fullscreen(&self) -> bool {
        self.lock().fullscreen
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }
}
