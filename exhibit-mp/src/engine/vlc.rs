//! VLC engine adapter
//!
//! Runs VLC as a child process with the `rc` (remote control) interface on
//! its stdin/stdout. Commands are single lines (`add`, `seek`, `play`,
//! `stop`, `get_time`, `is_playing`, `f on|off`, `quit`). Replies arrive on
//! stdout mixed with status chatter and prompts, so queries read lines until
//! one parses as the expected value or the reply timeout expires.
//!
//! `seek` and `get_time` work in whole seconds. VLC opens media
//! asynchronously, so a seek sent too early can be dropped; after every seek
//! the adapter reports output only once `get_time` lands inside the clip.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use exhibit_common::config::EngineConfig;
use exhibit_common::Clip;
use tracing::{debug, trace, warn};

use super::PlaybackClock;
use crate::error::{Error, Result};

/// Where the last seek should have put the playhead
#[derive(Debug, Clone, Copy)]
struct SeekTarget {
    secs: u64,
    end_ms: Option<u64>,
}

impl SeekTarget {
    fn contains(&self, secs: u64) -> bool {
        secs >= self.secs && self.end_ms.map_or(true, |end| secs * 1000 < end)
    }
}

pub struct VlcRemote {
    child: Option<Child>,
    stdin: Box<dyn Write + Send>,
    replies: Receiver<String>,
    reply_timeout: Duration,
    /// Media currently loaded in the playlist
    loaded: Option<PathBuf>,
    /// Last definite answer to `is_playing`
    last_playing: bool,
    /// Output is paused with the media still loaded
    paused: bool,
    /// Seek not yet confirmed by `get_time`
    pending_seek: Option<SeekTarget>,
    /// Answers still owed to queries that timed out
    late_replies: usize,
    fullscreen: bool,
}

impl VlcRemote {
    /// Launch VLC and wire up its control interface
    pub fn spawn(config: &EngineConfig, fullscreen: bool) -> Result<Self> {
        let mut command = Command::new(&config.vlc_command);
        command
            .args(["-I", "rc", "--rc-fake-tty", "--no-video-title-show", "--quiet"])
            .args(&config.vlc_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if fullscreen {
            command.arg("--fullscreen");
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::EngineInit(format!("cannot run {}: {}", config.vlc_command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineInit("VLC stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineInit("VLC stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("vlc-rc-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                debug!("VLC control output closed");
            })
            .map_err(|source| Error::ThreadSpawn {
                name: "vlc-rc-reader",
                source,
            })?;

        let mut remote = Self::from_parts(
            Box::new(stdin),
            rx,
            Duration::from_millis(config.reply_timeout_ms),
            fullscreen,
        );
        remote.child = Some(child);
        Ok(remote)
    }

    /// Build an adapter over an existing control channel
    pub fn from_parts(
        stdin: Box<dyn Write + Send>,
        replies: Receiver<String>,
        reply_timeout: Duration,
        fullscreen: bool,
    ) -> Self {
        Self {
            child: None,
            stdin,
            replies,
            reply_timeout,
            loaded: None,
            last_playing: false,
            paused: false,
            pending_seek: None,
            late_replies: 0,
            fullscreen,
        }
    }

    fn send(&mut self, command: &str) -> Result<()> {
        trace!("[vlc] > {}", command);
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Send a query and wait for a line that parses as `T`
    ///
    /// VLC answers queries in order, so after a timeout the next numeric
    /// line belongs to the timed-out query and is skipped.
    fn query<T: FromStr>(&mut self, command: &str) -> Option<T> {
        // Discard chatter left over from earlier commands
        while let Ok(line) = self.replies.try_recv() {
            self.skip_late_reply(&line);
        }

        if let Err(e) = self.send(command) {
            warn!("VLC query '{}' failed: {}", command, e);
            return None;
        }

        let deadline = Instant::now() + self.reply_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok(line) => {
                    trace!("[vlc] < {}", line);
                    if self.skip_late_reply(&line) {
                        continue;
                    }
                    if let Some(value) = parse_reply(&line) {
                        return Some(value);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!("VLC query '{}' timed out", command);
                    self.late_replies += 1;
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Consume `line` if it answers a query that already timed out
    fn skip_late_reply(&mut self, line: &str) -> bool {
        if self.late_replies > 0 && parse_reply::<i64>(line).is_some() {
            self.late_replies -= 1;
            debug!("Skipping late VLC reply {:?}", line);
            return true;
        }
        false
    }

    fn seek(&mut self, secs: u64) -> Result<()> {
        self.send(&format!("seek {}", secs))
    }

    /// True once the playhead is inside the seek target; re-seeks otherwise
    fn confirm_seek(&mut self, target: SeekTarget) -> bool {
        match self.query::<u64>("get_time") {
            Some(secs) if target.contains(secs) => {
                self.pending_seek = None;
                true
            }
            Some(secs) => {
                debug!("Seek to {} s not applied (at {} s); seeking again", target.secs, secs);
                if let Err(e) = self.seek(target.secs) {
                    warn!("VLC seek failed: {}", e);
                }
                false
            }
            None => false,
        }
    }

    fn child_exited(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => {
                warn!("VLC exited: {}", status);
                true
            }
            _ => false,
        }
    }

    fn load(&mut self, media: &Path) -> Result<()> {
        self.send("clear")?;
        // `add` enqueues and starts playing
        self.send(&format!("add {}", media.display()))?;
        self.loaded = Some(media.to_path_buf());
        Ok(())
    }
}

/// Strip prompts and parse a reply line
fn parse_reply<T: FromStr>(line: &str) -> Option<T> {
    line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
        .trim()
        .parse()
        .ok()
}

impl PlaybackClock for VlcRemote {
    fn start(&mut self, clip: &Clip) -> Result<()> {
        if self.child_exited() {
            return Err(Error::PlaybackStart("VLC is not running".to_string()));
        }

        let start_secs = clip.start_ms() / 1000;
        let fresh = self.loaded.as_deref() != Some(clip.media.as_path());
        if fresh {
            self.load(&clip.media)?;
            // A freshly added file already starts at zero
            if start_secs > 0 {
                self.seek(start_secs)?;
            }
        } else {
            // Seek while paused, then resume on the new position
            self.seek(start_secs)?;
            self.send("play")?;
        }

        self.pending_seek = (!fresh || start_secs > 0).then_some(SeekTarget {
            secs: start_secs,
            end_ms: clip.end_ms(),
        });
        self.paused = false;
        self.last_playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        // `stop` would unload the media; `pause` toggles, so send it once
        if !self.paused {
            self.send("pause")?;
            self.paused = true;
        }
        self.last_playing = false;
        Ok(())
    }

    fn position_ms(&mut self) -> Option<u64> {
        self.query::<u64>("get_time").map(|secs| secs * 1000)
    }

    fn is_playing(&mut self) -> bool {
        if self.child_exited() {
            self.last_playing = false;
            return false;
        }
        // A missed reply keeps the last answer rather than faking an end
        if let Some(flag) = self.query::<u8>("is_playing") {
            self.last_playing = flag != 0;
        }
        let pending = self.pending_seek;
        match pending {
            Some(target) if self.last_playing => self.confirm_seek(target),
            _ => self.last_playing,
        }
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<bool> {
        self.send(if fullscreen { "f on" } else { "f off" })?;
        self.fullscreen = fullscreen;
        Ok(self.fullscreen)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn shutdown(&mut self) {
        let _ = self.send("stop");
        let _ = self.send("quit");
        if let Some(mut child) = self.child.take() {
            let deadline = Instant::now() + Duration::from_secs(2);
            while Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    return;
                }
                thread::sleep(Duration::from_millis(50));
            }
            warn!("VLC did not quit; killing it");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for VlcRemote {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.shutdown();
        }
    }
}
