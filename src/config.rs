//! Server configuration: validated port, served root, frame size and the
//! optional bounded timeout, plus an optional TOML file layer.

use crate::error::{Error, Result};
use crate::protocol::{FRAME_SIZE, MIN_FRAME_SIZE, PORT_MAX, PORT_MIN};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_ip: IpAddr,
    pub port: u16,
    /// Directory whose entries are listed and served
    pub root: PathBuf,
    pub frame_size: usize,
    /// `None` blocks indefinitely on accept, read, write and connect
    pub timeout: Option<Duration>,
    /// Serve clients one after another instead of exiting after the first
    pub keep_serving: bool,
}

impl ServerConfig {
    pub fn new(port: u16) -> Result<Self> {
        check_port_range(port)?;
        Ok(Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port,
            root: PathBuf::from("."),
            frame_size: FRAME_SIZE,
            timeout: None,
            keep_serving: false,
        })
    }

    pub fn validate(&self) -> Result<()> {
        check_port_range(self.port)?;
        if self.frame_size < MIN_FRAME_SIZE {
            return Err(Error::InvalidConfig(format!(
                "frame size {} is below the minimum of {}",
                self.frame_size, MIN_FRAME_SIZE
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlay the values a config file sets. Command-line flags are applied after.
    pub fn apply_file(&mut self, file: &FileConfig) {
        if let Some(ip) = file.bind {
            self.bind_ip = ip;
        }
        if let Some(ref root) = file.root {
            self.root = root.clone();
        }
        if let Some(size) = file.frame_size {
            self.frame_size = size;
        }
        if let Some(ms) = file.timeout_ms {
            self.timeout = Some(Duration::from_millis(ms));
        }
        if let Some(keep) = file.keep_serving {
            self.keep_serving = keep;
        }
    }
}

fn check_port_range(port: u16) -> Result<()> {
    if !(PORT_MIN..=PORT_MAX).contains(&port) {
        return Err(Error::InvalidPort(port.to_string()));
    }
    Ok(())
}

/// Parse and range-check a control port given as text.
pub fn validate_port(raw: &str) -> Result<u16> {
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPort(raw.to_string()))?;
    if !(PORT_MIN..=PORT_MAX).contains(&port) {
        return Err(Error::InvalidPort(raw.to_string()));
    }
    Ok(port)
}

/// Settings read from `--config <file>`; every field is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub bind: Option<IpAddr>,
    pub root: Option<PathBuf>,
    pub frame_size: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub keep_serving: Option<bool>,
    pub log_file: Option<PathBuf>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        msg: e.to_string(),
    })?;
    toml::from_str(&data).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        msg: e.to_string(),
    })
}
