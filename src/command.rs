//! Command parsing and the per-session response state machine
//!
//! The dispatcher interprets the client's command frame and writes the
//! matching sequence of frames to the data connection:
//!
//! | command        | frames sent                         |
//! |----------------|-------------------------------------|
//! | `-l...`        | `dir`, `<name>\n` per entry, `~done` |
//! | `%none`        | `unk`                               |
//! | anything else  | `fil` if the name is served, else `nof` |

use crate::error::Result;
use crate::frame::FramedChannel;
use crate::fs_enum::{self, list_entries};
use crate::logger::Logger;
use crate::protocol::{command, frame_payload, status};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    /// Requested file name, exactly as the client wrote it
    Get(Vec<u8>),
    Unknown,
}

impl Command {
    /// Parse the literal bytes of a command frame (zero padding is ignored).
    pub fn parse(frame: &[u8]) -> Command {
        let text = frame_payload(frame);
        if text.starts_with(command::LIST_PREFIX) {
            Command::List
        } else if text == command::NONE_SENTINEL {
            Command::Unknown
        } else {
            Command::Get(text.to_vec())
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List => write!(f, "LIST"),
            Command::Get(name) => write!(f, "GET {}", String::from_utf8_lossy(name)),
            Command::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Result of a completed dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed { entries: usize },
    /// `fil` was sent; the body is streamed by the caller
    FileFound(PathBuf),
    NotFound,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCommand,
    Dispatching(Command),
    Responding,
    Done,
}

pub struct Dispatcher<'a> {
    root: &'a Path,
    logger: &'a dyn Logger,
    state: SessionState,
}

impl<'a> Dispatcher<'a> {
    pub fn new(root: &'a Path, logger: &'a dyn Logger) -> Self {
        Self {
            root,
            logger,
            state: SessionState::AwaitingCommand,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drive one command from `AwaitingCommand` to `Done`.
    ///
    /// Any send failure ends the session with that error; nothing is retried.
    /// The state is `Done` afterwards on both paths.
    pub fn run<S: Read + Write>(
        &mut self,
        channel: &mut FramedChannel<S>,
        frame: &[u8],
    ) -> Result<Outcome> {
        let result = self.step_all(channel, frame);
        self.state = SessionState::Done;
        result
    }

    fn step_all<S: Read + Write>(
        &mut self,
        channel: &mut FramedChannel<S>,
        frame: &[u8],
    ) -> Result<Outcome> {
        let cmd = Command::parse(frame);
        self.logger.command(&cmd);
        self.state = SessionState::Dispatching(cmd.clone());

        let outcome = match cmd {
            Command::List => {
                self.state = SessionState::Responding;
                let entries = send_listing(channel, self.root, self.logger)?;
                Outcome::Listed { entries }
            }
            Command::Get(name) => {
                let found = self.locate(&name)?;
                self.state = SessionState::Responding;
                match found {
                    Some(path) => {
                        send_status(channel, status::FILE, self.logger)?;
                        Outcome::FileFound(path)
                    }
                    None => {
                        send_status(channel, status::NOT_FOUND, self.logger)?;
                        Outcome::NotFound
                    }
                }
            }
            Command::Unknown => {
                self.state = SessionState::Responding;
                send_status(channel, status::UNKNOWN, self.logger)?;
                Outcome::Unknown
            }
        };
        Ok(outcome)
    }

    // Membership decides found/not-found. A member is demoted to not-found
    // when it resolves outside root or is not a regular file.
    fn locate(&self, name: &[u8]) -> Result<Option<PathBuf>> {
        if !fs_enum::contains(self.root, name)? {
            return Ok(None);
        }
        let path = match fs_enum::resolve_under_root(self.root, name) {
            Ok(path) => path,
            Err(e) => {
                self.logger.error("resolve", &e.to_string());
                return Ok(None);
            }
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => {
                self.logger
                    .error("resolve", &format!("{} is not a regular file", path.display()));
                Ok(None)
            }
            Err(e) => {
                self.logger
                    .error("resolve", &format!("{}: {}", path.display(), e));
                Ok(None)
            }
        }
    }
}

fn send_status<S: Read + Write>(
    channel: &mut FramedChannel<S>,
    code: &[u8],
    logger: &dyn Logger,
) -> Result<()> {
    channel.send_frame(code)?;
    logger.status(&String::from_utf8_lossy(code));
    Ok(())
}

/// `dir`, one `<name>\n` frame per entry in enumeration order, then `~done`.
fn send_listing<S: Read + Write>(
    channel: &mut FramedChannel<S>,
    root: &Path,
    logger: &dyn Logger,
) -> Result<usize> {
    // Open before announcing, so an unreadable directory sends nothing
    let entries = list_entries(root)?;
    send_status(channel, status::DIR, logger)?;
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        let mut line = entry.as_bytes().into_owned();
        line.push(b'\n');
        channel.send_frame(&line)?;
        count += 1;
    }
    send_status(channel, status::DONE, logger)?;
    Ok(count)
}
