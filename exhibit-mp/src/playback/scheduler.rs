//! Clip scheduler
//!
//! Single-threaded control loop that owns what is on screen. Once per tick:
//!
//! 1. Apply a pending display mode request.
//! 2. Apply a pending background loop reassignment. Takes effect at once
//!    while the background is on screen, otherwise when the foreground clip
//!    finishes.
//! 3. Accept a foreground request unless one is already queued. A clip that
//!    is not play-through is interrupted; a play-through clip keeps playing
//!    and the request waits.
//! 4. Detect the end of the current clip (interrupted, engine idle, or
//!    playhead past the clip's end offset) and decide what plays next.
//!
//! The scheduler is the only reader of the request mailboxes and the only
//! user of the engine.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use exhibit_common::config::TomlConfig;
use exhibit_common::{Clip, ClipCatalog, ClipId};
use tracing::{debug, error, info, warn};

use super::notifier::Notifier;
use crate::engine::PlaybackClock;
use crate::error::{Error, Result};
use crate::state::{NowShowing, SharedState};

/// Scheduler timing settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick: Duration,
    /// Added to the engine position before the end-offset comparison
    pub calibration_offset_ms: i64,
    /// Bound on waiting for the engine to confirm output
    pub start_timeout: Duration,
    /// Extra attempts after a failed start
    pub start_retries: u32,
}

impl SchedulerConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            tick: config.tick_interval(),
            calibration_offset_ms: config.calibration_offset_ms,
            start_timeout: config.start_timeout(),
            start_retries: config.start_retries,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            calibration_offset_ms: 0,
            start_timeout: Duration::from_secs(5),
            start_retries: 2,
        }
    }
}

/// What kind of clip is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Showing {
    /// The background loop
    Background,
    /// An explicitly requested clip
    Foreground,
}

pub struct Scheduler<E: PlaybackClock> {
    catalog: Arc<ClipCatalog>,
    state: Arc<SharedState>,
    engine: E,
    notifier: Notifier,
    config: SchedulerConfig,

    current: ClipId,
    background: ClipId,
    showing: Showing,
    /// Accepted foreground request not yet on screen
    queued: Option<ClipId>,
    /// Current clip was cut short by a foreground request
    interrupted: bool,
}

impl<E: PlaybackClock> Scheduler<E> {
    pub fn new(
        catalog: Arc<ClipCatalog>,
        state: Arc<SharedState>,
        engine: E,
        notifier: Notifier,
        config: SchedulerConfig,
    ) -> Self {
        let background = catalog.default_background();
        state.set_background_loop(background);
        Self {
            catalog,
            state,
            engine,
            notifier,
            config,
            current: background,
            background,
            showing: Showing::Background,
            queued: None,
            interrupted: false,
        }
    }

    pub fn current(&self) -> ClipId {
        self.current
    }

    pub fn background(&self) -> ClipId {
        self.background
    }

    pub fn showing(&self) -> Showing {
        self.showing
    }

    pub fn queued(&self) -> Option<ClipId> {
        self.queued
    }

    /// Put the background loop on screen and attach the engine
    pub fn start(&mut self) -> Result<()> {
        info!(
            "Starting with background loop {}",
            self.catalog[self.background]
        );
        self.switch_to(self.background, Showing::Background)?;
        self.state.set_engine_attached(true);
        Ok(())
    }

    /// Run until the keep-running flag clears or playback fails
    ///
    /// On a playback failure the display leaves fullscreen, the engine is
    /// released and the keep-running flag is cleared before the error is
    /// returned.
    pub fn run(mut self) -> Result<()> {
        let result = self.start().and_then(|()| self.run_loop());

        if let Err(e) = &result {
            error!("Scheduler stopping: {}", e);
            if self.engine.is_fullscreen() {
                if let Err(e) = self.engine.set_fullscreen(false) {
                    warn!("Could not leave fullscreen: {}", e);
                }
            }
            self.state.request_stop();
        }

        self.state.set_engine_attached(false);
        self.state.set_now_showing(None);
        self.engine.shutdown();
        info!("Playback engine released");
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        info!("Scheduler loop started");
        while self.state.is_running() {
            self.tick()?;
            thread::sleep(self.config.tick);
        }
        info!("Scheduler loop stopped");
        Ok(())
    }

    /// One scheduler iteration
    pub fn tick(&mut self) -> Result<()> {
        self.apply_display_request();
        self.apply_background_request()?;
        self.accept_foreground_request();
        self.check_boundary()
    }

    fn apply_display_request(&mut self) {
        if let Some(request) = self.state.display.drain() {
            let fullscreen = request.resolve(self.engine.is_fullscreen());
            self.notifier.set_display_mode(&mut self.engine, fullscreen);
        }
    }

    fn apply_background_request(&mut self) -> Result<()> {
        let Some(id) = self.state.background.drain() else {
            return Ok(());
        };

        if !self.catalog.is_valid_loop(id) {
            warn!("Ignoring background request for clip {}: not a loop clip", id);
            return Ok(());
        }
        if id == self.background {
            debug!("Clip {} is already the background loop", id);
            return Ok(());
        }

        self.background = id;
        self.state.set_background_loop(id);
        match self.showing {
            Showing::Background => {
                info!("Switching background loop to {}", self.catalog[id]);
                self.pause_engine();
                self.switch_to(id, Showing::Background)?;
            }
            Showing::Foreground => {
                info!(
                    "Background loop set to {}; takes effect after {}",
                    self.catalog[id], self.catalog[self.current]
                );
            }
        }
        Ok(())
    }

    fn accept_foreground_request(&mut self) {
        if self.queued.is_some() {
            return;
        }
        let Some(id) = self.state.foreground.drain() else {
            return;
        };

        let Some(requested) = self.catalog.lookup(id) else {
            warn!(
                "Ignoring request for clip {}: catalog has clips 0 to {}",
                id,
                self.catalog.count() - 1
            );
            return;
        };

        self.queued = Some(id);
        let on_screen = &self.catalog[self.current];
        if on_screen.policy.is_interruptible() {
            info!("Interrupting {} for {}", on_screen, requested);
            self.interrupted = true;
            self.pause_engine();
        } else {
            info!("Queued {} until {} plays through", requested, on_screen);
        }
    }

    fn check_boundary(&mut self) -> Result<()> {
        let ended = self.interrupted || !self.engine.is_playing() || self.crossed_end();
        if !ended {
            return Ok(());
        }

        let catalog = Arc::clone(&self.catalog);
        let finished = &catalog[self.current];
        let interrupted = std::mem::take(&mut self.interrupted);

        if finished.is_loop() && !interrupted {
            debug!("Looping {}", finished);
            return self.start_current();
        }

        if self.showing == Showing::Foreground {
            self.notifier.notify_completion(finished);
        }

        match self.queued.take() {
            Some(next) => self.switch_to(next, Showing::Foreground),
            None => {
                debug!("Returning to background loop");
                self.switch_to(self.background, Showing::Background)
            }
        }
    }

    /// Playhead has reached the end offset of a shared-timeline clip
    fn crossed_end(&mut self) -> bool {
        let Some(bounds) = self.catalog[self.current].bounds else {
            return false;
        };
        match self.engine.position_ms() {
            Some(position) => {
                position as i64 + self.config.calibration_offset_ms >= bounds.end_ms as i64
            }
            None => false,
        }
    }

    fn pause_engine(&mut self) {
        if let Err(e) = self.engine.pause() {
            warn!("Engine pause failed: {}", e);
        }
    }

    fn switch_to(&mut self, id: ClipId, showing: Showing) -> Result<()> {
        self.current = id;
        self.showing = showing;
        self.start_current()
    }

    /// Start the current clip and wait for output, retrying a bounded
    /// number of times
    fn start_current(&mut self) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        let clip = &catalog[self.current];
        let attempts = self.config.start_retries + 1;

        for attempt in 1..=attempts {
            match self.engine.start(clip).and_then(|()| self.await_output(clip)) {
                Ok(()) => {
                    info!("Now showing {} from {} ms", clip, clip.start_ms());
                    self.publish(clip);
                    return Ok(());
                }
                Err(e) => warn!(
                    "Start of {} failed (attempt {}/{}): {}",
                    clip, attempt, attempts, e
                ),
            }
        }

        Err(Error::PlaybackStart(format!(
            "{} did not start after {} attempts",
            clip, attempts
        )))
    }

    /// Poll the engine until it reports output
    fn await_output(&mut self, clip: &Clip) -> Result<()> {
        let deadline = Instant::now() + self.config.start_timeout;
        while !self.engine.is_playing() {
            if !self.state.is_running() {
                debug!("Shutdown pending; not waiting for {}", clip);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::PlaybackStart(format!(
                    "no output from {} within {:?}",
                    clip, self.config.start_timeout
                )));
            }
            thread::sleep(self.config.tick);
        }
        Ok(())
    }

    fn publish(&self, clip: &Clip) {
        self.state.set_now_showing(Some(NowShowing {
            clip: clip.id,
            name: clip.name.clone(),
            foreground: self.showing == Showing::Foreground,
            started_at: Utc::now(),
        }));
    }
}
