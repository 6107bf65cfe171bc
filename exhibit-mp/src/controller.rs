//! Exhibit controller link
//!
//! The controller is a microcontroller on a serial tty. Outbound lines are
//! queued on an unbounded channel and written by a dedicated task, so
//! neither the scheduler thread nor the input handlers ever block on the
//! tty. Inbound lines are echoed to the console; directive lines are
//! dispatched through the controller command registry.

use std::path::Path;
use std::sync::Arc;

use exhibit_common::protocol::{self, ControllerEvent};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::commands::{CommandContext, CommandRegistry};
use crate::error::{Error, Result};

/// Cloneable handle for sending lines to the controller
#[derive(Debug, Clone)]
pub struct ControllerLink {
    tx: mpsc::UnboundedSender<String>,
}

impl ControllerLink {
    /// Create a link and the receiver its writer task drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a line for the controller. Returns false if the writer is gone.
    pub fn send_line(&self, line: &str) -> bool {
        let mut line = line.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        match self.tx.send(line) {
            Ok(()) => true,
            Err(mpsc::error::SendError(line)) => {
                warn!("Controller link closed; dropped {:?}", line.trim_end());
                false
            }
        }
    }

    pub fn send_event(&self, event: &ControllerEvent) -> bool {
        self.send_line(&event.to_line())
    }
}

/// Open the controller tty for reading and writing
pub async fn open(path: &Path) -> Result<(ReadHalf<File>, WriteHalf<File>)> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map_err(|source| Error::ControllerOpen {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Opened controller tty {:?}", path);
    Ok(tokio::io::split(file))
}

/// Drain queued lines into `writer`
///
/// Write failures are logged and the line is dropped; the task keeps going.
pub async fn run_writer<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        debug!("[controller] > {}", line.trim_end());
        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = result {
            error!("Couldn't send {:?} to controller: {}", line.trim_end(), e);
        }
    }
    debug!("Controller writer stopped");
}

/// Read controller lines until the line closes
pub async fn run_reader<R>(reader: R, registry: Arc<CommandRegistry>, ctx: Arc<CommandContext>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reply) = handle_line(&line, &registry, &ctx) {
                    println!("{}", reply);
                }
            }
            Ok(None) => {
                warn!("Controller closed the line");
                break;
            }
            Err(e) => {
                error!("Controller read failed: {}", e);
                break;
            }
        }
    }
}

/// Echo one controller line and run it if it is a directive
pub fn handle_line(line: &str, registry: &CommandRegistry, ctx: &CommandContext) -> Option<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() > protocol::MAX_LINE_LENGTH {
        warn!("Ignoring oversized controller line ({} bytes)", line.len());
        return None;
    }
    println!("[controller] {}", line);
    let body = protocol::directive_body(line)?;
    registry.dispatch(ctx, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_line_appends_newline() {
        let (link, mut rx) = ControllerLink::channel();
        assert!(link.send_line("hello"));
        assert!(link.send_line("already\n"));
        assert_eq!(rx.try_recv().unwrap(), "hello\n");
        assert_eq!(rx.try_recv().unwrap(), "already\n");
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (link, rx) = ControllerLink::channel();
        drop(rx);
        assert!(!link.send_event(&ControllerEvent::version()));
    }

    #[tokio::test]
    async fn test_writer_drains_in_order() {
        let (link, rx) = ControllerLink::channel();
        link.send_event(&ControllerEvent::version());
        link.send_line("led 3 on");
        drop(link);

        let mut out = Vec::new();
        run_writer(rx, &mut out).await;
        assert_eq!(String::from_utf8(out).unwrap(), "!mediaplayer 1000\nled 3 on\n");
    }
}
