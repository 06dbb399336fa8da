//! Error kinds for a file-transfer session
//!
//! Every error is terminal for the session that produced it. The server
//! surfaces it to the caller instead of exiting so that a looping caller can
//! log it and keep serving.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("accept: {0}")]
    Accept(#[source] io::Error),

    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        source: io::Error,
    },

    #[error("{op}: connection closed by peer")]
    ConnectionClosed { op: &'static str },

    #[error("connect data channel {addr}: {source}")]
    DataConnect { addr: SocketAddr, source: io::Error },

    #[error("directory {}: {source}", path.display())]
    DirectoryUnavailable { path: PathBuf, source: io::Error },

    #[error("write: payload of {len} bytes exceeds frame size {max}")]
    OversizedPayload { len: usize, max: usize },

    #[error("invalid port {0:?}: must be in range 4000-65000")]
    InvalidPort(String),

    #[error("read: invalid data port {0:?}")]
    InvalidDataPort(String),

    #[error("{op}: timed out")]
    Timeout { op: &'static str },

    #[error("read: unexpected response {0:?}")]
    UnexpectedResponse(String),

    #[error("config {}: {msg}", path.display())]
    Config { path: PathBuf, msg: String },

    #[error("invalid server settings: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Classify an I/O failure of operation `op`, splitting out timeouts.
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout { op },
            _ => Error::Io { op, source },
        }
    }
}
