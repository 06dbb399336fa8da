//! ftserver - serve one directory over the control/data file-transfer protocol
//!
//! Serves a single client session and exits, unless --keep-serving is given.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use ftserve::cli::ServerOpts;
use ftserve::config::{load_file_config, FileConfig, ServerConfig};
use ftserve::logger::{ConsoleLogger, Logger, NoopLogger, TextLogger};
use ftserve::net::Server;

fn main() -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let opts = ServerOpts::parse();

    let file = match opts.config {
        Some(ref path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let mut config = ServerConfig::new(opts.port)?;
    config.apply_file(&file);
    if let Some(ref root) = opts.root {
        config.root = root.clone();
    }
    if let Some(ms) = opts.timeout_ms {
        config.timeout = Some(Duration::from_millis(ms));
    }
    if opts.keep_serving {
        config.keep_serving = true;
    }

    if !config.root.is_dir() {
        anyhow::bail!("Error: Root path is not a directory: {}", config.root.display());
    }

    let log_file = opts.log_file.clone().or(file.log_file);
    let logger: Arc<dyn Logger> = if opts.quiet {
        Arc::new(NoopLogger)
    } else if let Some(ref p) = log_file {
        Arc::new(TextLogger::new(p)?)
    } else {
        Arc::new(ConsoleLogger)
    };

    let server = Server::bind(config)?;
    println!("Server open and listening on port {}.", opts.port);
    server
        .serve(logger.as_ref())
        .context("session failed")?;
    Ok(())
}
