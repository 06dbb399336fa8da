//! ftserve - a two-socket text file transfer protocol
//!
//! A client opens a control connection, sends a command frame and a data-port
//! frame, and the server connects back on that port to answer with a
//! directory listing, a file, or an error status.

pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod fs_enum;
pub mod logger;
pub mod net;
pub mod protocol;
pub mod transfer;

pub use error::{Error, Result};
