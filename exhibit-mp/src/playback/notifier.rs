//! Lifecycle notifier
//!
//! Tells the controller about clip lifecycle events and answers its control
//! requests. Every send is fire-and-forget: a dead link is logged by
//! [`ControllerLink`] and never fails the caller.

use exhibit_common::protocol::ControllerEvent;
use exhibit_common::Clip;
use tracing::{error, info};

use crate::controller::ControllerLink;
use crate::engine::PlaybackClock;

#[derive(Debug, Clone)]
pub struct Notifier {
    link: ControllerLink,
}

impl Notifier {
    pub fn new(link: ControllerLink) -> Self {
        Self { link }
    }

    /// A foreground clip finished
    pub fn notify_completion(&self, clip: &Clip) {
        info!("Clip {} finished", clip);
        self.link.send_event(&ControllerEvent::Done {
            id: clip.id,
            name: clip.name.clone(),
        });
    }

    /// Protocol version handshake
    pub fn notify_version(&self) {
        self.link.send_event(&ControllerEvent::version());
    }

    /// Apply a display mode and report the result
    ///
    /// Returns the mode the engine ended up in, or `None` if it refused.
    pub fn set_display_mode(
        &self,
        engine: &mut dyn PlaybackClock,
        fullscreen: bool,
    ) -> Option<bool> {
        match engine.set_fullscreen(fullscreen) {
            Ok(mode) => {
                info!("Display mode now {}", if mode { "fullscreen" } else { "windowed" });
                self.link
                    .send_event(&ControllerEvent::Display { fullscreen: mode });
                Some(mode)
            }
            Err(e) => {
                error!("Display mode change failed: {}", e);
                None
            }
        }
    }

    /// Forward a raw line from the console
    pub fn forward(&self, line: &str) -> bool {
        self.link.send_line(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulatedEngine;
    use exhibit_common::{ClipId, ReplayPolicy};
    use std::path::PathBuf;

    #[test]
    fn test_completion_line() {
        let (link, mut rx) = ControllerLink::channel();
        let notifier = Notifier::new(link);
        let clip = Clip {
            id: ClipId(2),
            name: "place1".to_string(),
            media: PathBuf::from("/media/place1.mp4"),
            policy: ReplayPolicy::PlayThrough,
            bounds: None,
            duration_ms: None,
        };

        notifier.notify_completion(&clip);
        assert_eq!(rx.try_recv().unwrap(), "!done 2 place1\n");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_version_line() {
        let (link, mut rx) = ControllerLink::channel();
        Notifier::new(link).notify_version();
        assert_eq!(rx.try_recv().unwrap(), "!mediaplayer 1000\n");
    }

    #[test]
    fn test_display_mode_reported() {
        let (link, mut rx) = ControllerLink::channel();
        let notifier = Notifier::new(link);
        let mut engine = SimulatedEngine::new(1_000, true);

        assert_eq!(notifier.set_display_mode(&mut engine, false), Some(false));
        assert!(!engine.is_fullscreen());
        assert_eq!(rx.try_recv().unwrap(), "!display windowed\n");
    }

    #[test]
    fn test_dead_link_is_not_fatal() {
        let (link, rx) = ControllerLink::channel();
        drop(rx);
        let notifier = Notifier::new(link);
        notifier.notify_version();
        assert!(!notifier.forward("ping"));
    }
}
