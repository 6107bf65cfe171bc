//! Operator console
//!
//! Reads command lines from stdin. A line starting with the directive prefix
//! is passed through to the controller with the prefix removed; anything
//! else runs through the console command registry.

use std::io::Write;
use std::sync::Arc;

use exhibit_common::protocol;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::commands::{CommandContext, CommandRegistry};

/// What became of one console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// Forwarded to the controller
    Forwarded,
    /// Could not be forwarded: the controller link is closed
    ForwardFailed,
    /// Ran locally, with an optional reply
    Local(Option<String>),
}

/// Handle one console line
pub fn handle_line(line: &str, registry: &CommandRegistry, ctx: &CommandContext) -> ConsoleOutcome {
    if line.len() > protocol::MAX_LINE_LENGTH {
        warn!("Ignoring oversized console line ({} bytes)", line.len());
        return ConsoleOutcome::Local(Some("Line too long.".to_string()));
    }
    match protocol::directive_body(line) {
        Some(body) => {
            if ctx.notifier.forward(body) {
                ConsoleOutcome::Forwarded
            } else {
                ConsoleOutcome::ForwardFailed
            }
        }
        None => ConsoleOutcome::Local(registry.dispatch(ctx, line)),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Serve the console until stdin closes or the player stops
pub async fn run_console<R>(reader: R, registry: Arc<CommandRegistry>, ctx: Arc<CommandContext>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    prompt();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                match handle_line(&line, &registry, &ctx) {
                    ConsoleOutcome::Local(Some(reply)) => println!("{}", reply),
                    ConsoleOutcome::ForwardFailed => {
                        println!("Couldn't send command to controller.")
                    }
                    ConsoleOutcome::Local(None) | ConsoleOutcome::Forwarded => {}
                }
                if !ctx.state.is_running() {
                    break;
                }
                prompt();
            }
            Ok(None) => {
                info!("Console input closed");
                break;
            }
            Err(e) => {
                error!("Console read failed: {}", e);
                break;
            }
        }
    }
}
