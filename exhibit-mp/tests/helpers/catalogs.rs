//! Clip catalogs and scheduler fixtures

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use exhibit_common::clip::ClipBounds;
use exhibit_common::{Clip, ClipCatalog, ClipId, ReplayPolicy};
use exhibit_mp::controller::ControllerLink;
use exhibit_mp::playback::{Notifier, Scheduler, SchedulerConfig};
use exhibit_mp::SharedState;
use tokio::sync::mpsc::UnboundedReceiver;

use super::manual_engine::{EngineHandle, ManualEngine};

fn clip(name: &str, policy: ReplayPolicy, bounds: Option<ClipBounds>) -> Clip {
    Clip {
        id: ClipId(0),
        name: name.to_string(),
        media: PathBuf::from(format!("/media/{}.mp4", name)),
        policy,
        bounds,
        duration_ms: None,
    }
}

/// idle (0, loop, background), decide (1, play once), place (2, play
/// through), ambient (3, loop)
pub fn exhibit_catalog() -> ClipCatalog {
    ClipCatalog::new(
        vec![
            clip("idle", ReplayPolicy::Loop, None),
            clip("decide", ReplayPolicy::PlayOnce, None),
            clip("place", ReplayPolicy::PlayThrough, None),
            clip("ambient", ReplayPolicy::Loop, None),
        ],
        ClipId(0),
    )
    .unwrap()
}

/// Same clips laid out on one shared timeline
pub fn timeline_catalog() -> ClipCatalog {
    let bounds = |start_ms, end_ms| Some(ClipBounds { start_ms, end_ms });
    let mut clips = vec![
        clip("idle", ReplayPolicy::Loop, bounds(0, 10_000)),
        clip("decide", ReplayPolicy::PlayOnce, bounds(10_000, 25_000)),
        clip("place", ReplayPolicy::PlayThrough, bounds(25_000, 40_000)),
    ];
    for clip in &mut clips {
        clip.media = PathBuf::from("/media/timeline.mp4");
    }
    ClipCatalog::new(clips, ClipId(0)).unwrap()
}

/// Fast ticks and a short start bound so failures surface quickly
pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        tick: Duration::from_millis(1),
        calibration_offset_ms: 0,
        start_timeout: Duration::from_millis(20),
        start_retries: 1,
    }
}

pub struct Fixture {
    pub scheduler: Scheduler<ManualEngine>,
    pub state: Arc<SharedState>,
    pub player: EngineHandle,
    pub controller: UnboundedReceiver<String>,
}

impl Fixture {
    /// Lines sent to the controller since the last call
    pub fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.controller.try_recv() {
            lines.push(line);
        }
        lines
    }
}

/// Scheduler over `catalog`, not yet started
pub fn unstarted(catalog: ClipCatalog, config: SchedulerConfig) -> Fixture {
    let state = Arc::new(SharedState::new());
    let (engine, player) = ManualEngine::new();
    let (link, controller) = ControllerLink::channel();
    let scheduler = Scheduler::new(
        Arc::new(catalog),
        Arc::clone(&state),
        engine,
        Notifier::new(link),
        config,
    );
    Fixture {
        scheduler,
        state,
        player,
        controller,
    }
}

/// Scheduler over `catalog` with the background loop already on screen
pub fn fixture(catalog: ClipCatalog, config: SchedulerConfig) -> Fixture {
    let mut fixture = unstarted(catalog, config);
    fixture.scheduler.start().unwrap();
    fixture
}
