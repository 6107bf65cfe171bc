//! Exhibit controller line protocol
//!
//! Both the console and the controller speak newline-terminated text. A line
//! whose first character is [`DIRECTIVE_PREFIX`] is a directive; anything else
//! from the controller is informational and only echoed.

use std::fmt;

use crate::clip::ClipId;

/// Marks a directive line
pub const DIRECTIVE_PREFIX: char = '!';

/// Version of the command set spoken with the controller
pub const PROTOCOL_VERSION: u32 = 1000;

/// Maximum number of words considered in a command line
pub const MAX_WORDS: usize = 3;

/// Maximum accepted input line length (bytes)
pub const MAX_LINE_LENGTH: usize = 512;

/// Lines sent from the media player to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Handshake: which command set we speak
    Version { version: u32 },
    /// A foreground clip finished
    Done { id: ClipId, name: String },
    /// Display mode after a toggle
    Display { fullscreen: bool },
}

impl ControllerEvent {
    pub fn version() -> Self {
        ControllerEvent::Version {
            version: PROTOCOL_VERSION,
        }
    }

    /// Wire form, newline-terminated
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::Version { version } => {
                write!(f, "{}mediaplayer {}", DIRECTIVE_PREFIX, version)
            }
            ControllerEvent::Done { id, name } => {
                write!(f, "{}done {} {}", DIRECTIVE_PREFIX, id, name)
            }
            ControllerEvent::Display { fullscreen } => {
                let mode = if *fullscreen { "fullscreen" } else { "windowed" };
                write!(f, "{}display {}", DIRECTIVE_PREFIX, mode)
            }
        }
    }
}

/// The directive body of a line, without the prefix, if it is a directive
pub fn directive_body(line: &str) -> Option<&str> {
    line.strip_prefix(DIRECTIVE_PREFIX)
}

/// Split a command line into at most [`MAX_WORDS`] whitespace-separated words
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().take(MAX_WORDS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_lines() {
        assert_eq!(ControllerEvent::version().to_line(), "!mediaplayer 1000\n");
        assert_eq!(
            ControllerEvent::Done { id: ClipId(2), name: "place1".to_string() }.to_line(),
            "!done 2 place1\n"
        );
        assert_eq!(
            ControllerEvent::Display { fullscreen: false }.to_string(),
            "!display windowed"
        );
    }

    #[test]
    fn test_directive_body() {
        assert_eq!(directive_body("!play 2"), Some("play 2"));
        assert_eq!(directive_body("sensor 3 tripped"), None);
        assert_eq!(directive_body(" !play"), None);
    }

    #[test]
    fn test_tokenize_caps_word_count() {
        assert_eq!(tokenize("  play   decide1 "), vec!["play", "decide1"]);
        assert_eq!(tokenize("a b c d e"), vec!["a", "b", "c"]);
        assert!(tokenize("   \n").is_empty());
    }
}
