//! Clip definitions
//!
//! A clip is one playable unit shown by the exhibit. Clips are either whole
//! files played from their beginning to their natural end, or intervals of a
//! single shared timeline file described by start/end offsets.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Stable clip identifier: the clip's position in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub usize);

impl ClipId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClipId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<usize>().map(ClipId)
    }
}

/// How a clip behaves once it is on screen
///
/// Config files accept the same spellings as [`FromStr`], so `PlayOnce`,
/// `play_once` and `once` are all the same policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ReplayPolicy {
    /// Play once, then revert to the background loop. May be interrupted.
    PlayOnce,
    /// Play once, then revert. No new clip takes over until it finishes.
    PlayThrough,
    /// Repeat until interrupted.
    Loop,
}

impl ReplayPolicy {
    /// Whether a foreground request may cut this clip short
    pub fn is_interruptible(self) -> bool {
        !matches!(self, ReplayPolicy::PlayThrough)
    }
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReplayPolicy::PlayOnce => "play_once",
            ReplayPolicy::PlayThrough => "play_through",
            ReplayPolicy::Loop => "loop",
        };
        f.pad(s)
    }
}

impl FromStr for ReplayPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play_once" | "playonce" | "once" => Ok(ReplayPolicy::PlayOnce),
            "play_through" | "playthrough" | "through" => Ok(ReplayPolicy::PlayThrough),
            "loop" => Ok(ReplayPolicy::Loop),
            other => Err(Error::InvalidInput(format!("unknown replay policy '{}'", other))),
        }
    }
}

impl TryFrom<String> for ReplayPolicy {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Offsets of a clip inside a shared timeline, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipBounds {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ClipBounds {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// One catalog entry. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    /// Media locator (absolute once the catalog is built)
    pub media: PathBuf,
    pub policy: ReplayPolicy,
    /// Interval within the shared timeline; `None` for per-file clips
    pub bounds: Option<ClipBounds>,
    /// Nominal length, used by engines that cannot read it from the media
    pub duration_ms: Option<u64>,
}

impl Clip {
    /// Offset at which the engine must start this clip
    pub fn start_ms(&self) -> u64 {
        self.bounds.map(|b| b.start_ms).unwrap_or(0)
    }

    /// End offset, when known
    pub fn end_ms(&self) -> Option<u64> {
        self.bounds
            .map(|b| b.end_ms)
            .or_else(|| self.duration_ms.map(|d| self.start_ms() + d))
    }

    pub fn is_loop(&self) -> bool {
        self.policy == ReplayPolicy::Loop
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("loop".parse::<ReplayPolicy>().unwrap(), ReplayPolicy::Loop);
        assert_eq!("playOnce".parse::<ReplayPolicy>().unwrap(), ReplayPolicy::PlayOnce);
        assert_eq!("play_through".parse::<ReplayPolicy>().unwrap(), ReplayPolicy::PlayThrough);
        assert!("forever".parse::<ReplayPolicy>().is_err());
    }

    #[test]
    fn test_only_play_through_is_uninterruptible() {
        assert!(ReplayPolicy::PlayOnce.is_interruptible());
        assert!(ReplayPolicy::Loop.is_interruptible());
        assert!(!ReplayPolicy::PlayThrough.is_interruptible());
    }

    #[test]
    fn test_offsets() {
        let mut clip = Clip {
            id: ClipId(1),
            name: "decide1".to_string(),
            media: PathBuf::from("/media/exhibit.mp4"),
            policy: ReplayPolicy::PlayOnce,
            bounds: Some(ClipBounds { start_ms: 12_000, end_ms: 20_500 }),
            duration_ms: None,
        };
        assert_eq!(clip.start_ms(), 12_000);
        assert_eq!(clip.end_ms(), Some(20_500));

        clip.bounds = None;
        assert_eq!(clip.start_ms(), 0);
        assert_eq!(clip.end_ms(), None);

        clip.duration_ms = Some(4_000);
        assert_eq!(clip.end_ms(), Some(4_000));
    }
}
