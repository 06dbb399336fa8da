//! Shared CLI definitions for the ftserver and ftclient binaries

use clap::Parser;
use std::path::PathBuf;

/// Serve one directory over the control/data file-transfer protocol
#[derive(Clone, Debug, Parser)]
#[command(name = "ftserver", version)]
pub struct ServerOpts {
    /// Control port to listen on (4000-65000)
    #[arg(value_parser = crate::config::validate_port)]
    pub port: u16,

    /// Directory to serve (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Give up on accept, reads, writes and connects after this many milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Keep accepting clients one after another instead of exiting after one
    #[arg(long)]
    pub keep_serving: bool,

    /// TOML file with root, frame_size, timeout_ms, keep_serving, log_file, bind
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append timestamped session events to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Do not log session events
    #[arg(short, long, conflicts_with = "log_file")]
    pub quiet: bool,
}

/// Request a listing or a file from an ftserver
#[derive(Clone, Debug, Parser)]
#[command(name = "ftclient", version)]
pub struct ClientOpts {
    /// Server host name or address
    pub server: String,

    /// Server control port
    pub server_port: u16,

    /// Local port the server connects back to
    pub data_port: u16,

    /// List the served directory
    #[arg(short = 'l', long = "list", conflicts_with = "get")]
    pub list: bool,

    /// Fetch one file by name
    #[arg(short = 'g', long = "get", value_name = "FILE")]
    pub get: Option<String>,

    /// Overwrite an existing local file
    #[arg(long)]
    pub force: bool,

    /// Give up on connect and reads after this many milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}
