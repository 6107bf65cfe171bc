//! Command registries
//!
//! A command line is up to three whitespace-separated words; the first is
//! the verb. Each input source has its own verb table, checked for duplicate
//! verbs when it is built. Handlers only ever touch shared state through
//! the request mailboxes, so they never block on the scheduler.
//!
//! A handler returns an optional reply for the operator.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use exhibit_common::protocol;
use exhibit_common::{ClipCatalog, ClipId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::playback::Notifier;
use crate::state::{DisplayRequest, SharedState};

/// Everything a handler may touch
pub struct CommandContext {
    pub catalog: Arc<ClipCatalog>,
    pub state: Arc<SharedState>,
    pub notifier: Notifier,
}

/// One parsed command line
pub struct Invocation<'a> {
    pub ctx: &'a CommandContext,
    pub registry: &'a CommandRegistry,
    pub words: &'a [&'a str],
}

pub type Handler = fn(&Invocation<'_>) -> Option<String>;

#[derive(Clone, Copy)]
struct Command {
    usage: &'static str,
    handler: Handler,
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Command>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a verb; a verb may only be registered once
    pub fn with(
        mut self,
        verb: &'static str,
        usage: &'static str,
        handler: Handler,
    ) -> Result<Self> {
        if self.commands.insert(verb, Command { usage, handler }).is_some() {
            return Err(Error::DuplicateVerb(verb.to_string()));
        }
        Ok(self)
    }

    /// Verbs accepted from the operator console
    pub fn console() -> Result<Self> {
        Self::new()
            .with("help", "help                 Type this help text", on_help)?
            .with("h", "h                    Same as help", on_help)?
            .with("play", "play <clip>          Play clip by name or number", on_play)?
            .with("loop", "loop <clip>          Make a loop clip the background", on_loop)?
            .with("fullscreen", "fullscreen [on|off]  Toggle or set fullscreen", on_fullscreen)?
            .with("list", "list                 List the clip catalog", on_list)?
            .with("status", "status               Show what is on screen", on_status)?
            .with("stop", "stop                 Shut down the media player", on_stop)
    }

    /// Directives accepted from the exhibit controller (prefix stripped)
    pub fn controller() -> Result<Self> {
        Self::new()
            .with("play", "!play <clip>", on_play)?
            .with("loop", "!loop <clip>", on_loop)?
            .with("stop", "!stop", on_stop)?
            .with("version", "!version", on_version)?
            .with("fullscreen", "!fullscreen [on|off]", on_fullscreen)
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.commands.contains_key(verb)
    }

    /// Usage lines sorted by verb
    pub fn usage(&self) -> Vec<&'static str> {
        let mut verbs: Vec<_> = self.commands.iter().collect();
        verbs.sort_by_key(|(verb, _)| **verb);
        verbs.into_iter().map(|(_, cmd)| cmd.usage).collect()
    }

    /// Tokenize `line` and run the matching handler
    pub fn dispatch(&self, ctx: &CommandContext, line: &str) -> Option<String> {
        let words = protocol::tokenize(line);
        let verb = *words.first()?;
        match self.commands.get(verb) {
            Some(command) => {
                debug!("Command: {}", words.join(" "));
                (command.handler)(&Invocation {
                    ctx,
                    registry: self,
                    words: &words,
                })
            }
            None => Some(format!(
                "Unknown command '{}'. Type \"help\" for a list of commands.",
                verb
            )),
        }
    }
}

fn on_help(inv: &Invocation<'_>) -> Option<String> {
    let mut text = String::new();
    for usage in inv.registry.usage() {
        let _ = writeln!(text, "{}", usage);
    }
    let _ = writeln!(
        text,
        "<clip> is a clip name or a number 0 to {}",
        inv.ctx.catalog.count() - 1
    );
    let _ = write!(
        text,
        "Lines starting with '{}' are sent to the controller",
        protocol::DIRECTIVE_PREFIX
    );
    Some(text)
}

fn resolve_clip(inv: &Invocation<'_>) -> std::result::Result<ClipId, String> {
    let ctx = inv.ctx;
    let Some(key) = inv.words.get(1) else {
        return Err("Clip not specified.".to_string());
    };
    ctx.catalog.find(key).ok_or_else(|| {
        warn!("Unknown clip '{}'", key);
        format!(
            "Unknown clip '{}'; use a name or a number 0 to {}",
            key,
            ctx.catalog.count() - 1
        )
    })
}

fn on_play(inv: &Invocation<'_>) -> Option<String> {
    match resolve_clip(inv) {
        Ok(id) => {
            inv.ctx.state.request_clip(id);
            None
        }
        Err(reply) => Some(reply),
    }
}

fn on_loop(inv: &Invocation<'_>) -> Option<String> {
    match resolve_clip(inv) {
        Ok(id) => {
            inv.ctx.state.request_background(id);
            None
        }
        Err(reply) => Some(reply),
    }
}

fn on_stop(inv: &Invocation<'_>) -> Option<String> {
    inv.ctx.state.request_stop();
    Some("Stopping".to_string())
}

fn on_version(inv: &Invocation<'_>) -> Option<String> {
    inv.ctx.notifier.notify_version();
    None
}

fn on_fullscreen(inv: &Invocation<'_>) -> Option<String> {
    let ctx = inv.ctx;
    let request = match inv.words.get(1).copied() {
        None => DisplayRequest::Toggle,
        Some("on") => DisplayRequest::Fullscreen,
        Some("off") => DisplayRequest::Windowed,
        Some(other) => return Some(format!("Expected 'on' or 'off', got '{}'", other)),
    };
    if !ctx.state.is_engine_attached() {
        warn!("Display mode request before the engine is attached; ignored");
        return Some("No playback engine attached yet; display mode unchanged.".to_string());
    }
    ctx.state.request_display(request);
    None
}

fn on_list(inv: &Invocation<'_>) -> Option<String> {
    let ctx = inv.ctx;
    let background = ctx
        .state
        .background_loop()
        .unwrap_or_else(|| ctx.catalog.default_background());
    let lines: Vec<String> = ctx
        .catalog
        .iter()
        .map(|clip| {
            let marker = if clip.id == background { "*" } else { " " };
            format!(
                "{}{:>3}  {:<12} {:<13} {}",
                marker,
                clip.id.index(),
                clip.name,
                clip.policy,
                clip.media.display()
            )
        })
        .collect();
    Some(lines.join("\n"))
}

fn on_status(inv: &Invocation<'_>) -> Option<String> {
    match inv.ctx.state.now_showing() {
        Some(showing) => Some(format!(
            "Showing {} ({}) as {} since {}",
            showing.name,
            showing.clip,
            if showing.foreground { "foreground" } else { "background" },
            showing.started_at.format("%H:%M:%S")
        )),
        None => Some("Nothing on screen".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_inv: &Invocation<'_>) -> Option<String> {
        None
    }

    #[test]
    fn test_duplicate_verbs_rejected() {
        let result = CommandRegistry::new()
            .with("play", "", noop)
            .and_then(|r| r.with("play", "", noop));
        assert!(matches!(result, Err(Error::DuplicateVerb(v)) if v == "play"));
    }

    #[test]
    fn test_builtin_registries_are_valid() {
        let console = CommandRegistry::console().unwrap();
        assert!(console.contains("h"));
        assert!(console.contains("play"));
        assert!(!console.contains("version"));
        assert_eq!(console.usage().len(), 8);

        let controller = CommandRegistry::controller().unwrap();
        assert!(controller.contains("version"));
        assert!(!controller.contains("help"));
    }
}
