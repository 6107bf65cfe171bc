//! Shared state
//!
//! The only state touched by more than one context: the request mailboxes
//! written by the console and controller handlers, the keep-running flag,
//! and a read-only snapshot of what the scheduler has on screen. Everything
//! else the scheduler owns outright.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::info;

use exhibit_common::ClipId;

use crate::playback::mailbox::Mailbox;

/// Requested display mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRequest {
    Toggle,
    Fullscreen,
    Windowed,
}

impl DisplayRequest {
    /// Resolve against the current mode
    pub fn resolve(self, currently_fullscreen: bool) -> bool {
        match self {
            DisplayRequest::Toggle => !currently_fullscreen,
            DisplayRequest::Fullscreen => true,
            DisplayRequest::Windowed => false,
        }
    }
}

/// Snapshot of the clip on screen, published by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowShowing {
    pub clip: ClipId,
    pub name: String,
    /// False while the background loop is on screen
    pub foreground: bool,
    pub started_at: DateTime<Utc>,
}

/// Shared state accessible by all contexts
pub struct SharedState {
    /// Foreground clip requests
    pub foreground: Mailbox<ClipId>,

    /// Background loop reassignments
    pub background: Mailbox<ClipId>,

    /// Display mode changes
    pub display: Mailbox<DisplayRequest>,

    running: AtomicBool,

    /// Set once the scheduler has the engine producing output
    engine_attached: AtomicBool,

    now_showing: RwLock<Option<NowShowing>>,

    /// Background loop the scheduler currently returns to
    background_loop: RwLock<Option<ClipId>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            foreground: Mailbox::new(),
            background: Mailbox::new(),
            display: Mailbox::new(),
            running: AtomicBool::new(true),
            engine_attached: AtomicBool::new(false),
            now_showing: RwLock::new(None),
            background_loop: RwLock::new(None),
        }
    }

    pub fn request_clip(&self, id: ClipId) {
        self.foreground.submit(id);
    }

    pub fn request_background(&self, id: ClipId) {
        self.background.submit(id);
    }

    pub fn request_display(&self, request: DisplayRequest) {
        self.display.submit(request);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the scheduler to exit at its next tick boundary
    pub fn request_stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Shutdown requested");
        }
    }

    pub fn is_engine_attached(&self) -> bool {
        self.engine_attached.load(Ordering::Acquire)
    }

    pub fn set_engine_attached(&self, attached: bool) {
        self.engine_attached.store(attached, Ordering::Release);
    }

    pub fn now_showing(&self) -> Option<NowShowing> {
        self.now_showing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_now_showing(&self, showing: Option<NowShowing>) {
        *self.now_showing.write().unwrap_or_else(PoisonError::into_inner) = showing;
    }

    /// `None` until a scheduler has been created
    pub fn background_loop(&self) -> Option<ClipId> {
        *self
            .background_loop
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_background_loop(&self, id: ClipId) {
        *self
            .background_loop
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(id);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
