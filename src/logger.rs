use crate::command::{Command, Outcome};
use crate::error::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

pub trait Logger: Send + Sync {
    fn listening(&self, _addr: SocketAddr, _root: &Path) {}
    fn accepted(&self, _peer: SocketAddr) {}
    fn command(&self, _command: &Command) {}
    fn data_connected(&self, _addr: SocketAddr) {}
    fn status(&self, _code: &str) {}
    fn session_done(&self, _peer: SocketAddr, _outcome: &Outcome, _seconds: f64) {}
    fn error(&self, _context: &str, _msg: &str) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Listed { entries } => format!("listed entries={entries}"),
        Outcome::FileFound(path) => format!("sent file={}", path.display()),
        Outcome::NotFound => "not found".to_string(),
        Outcome::Unknown => "unknown command".to_string(),
    }
}

/// Plain progress lines on stderr
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn listening(&self, addr: SocketAddr, root: &Path) {
        eprintln!("ftserver listening on {} root={}", addr, root.display());
    }
    fn accepted(&self, peer: SocketAddr) {
        eprintln!("control connection from {}", peer);
    }
    fn command(&self, command: &Command) {
        eprintln!("command: {}", command);
    }
    fn data_connected(&self, addr: SocketAddr) {
        eprintln!("data connection to {}", addr);
    }
    fn session_done(&self, peer: SocketAddr, outcome: &Outcome, seconds: f64) {
        eprintln!("session {} done: {} ({seconds:.3}s)", peer, describe(outcome));
    }
    fn error(&self, context: &str, msg: &str) {
        eprintln!("error during {}: {}", context, msg);
    }
}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| crate::error::Error::Config {
                path: path.to_path_buf(),
                msg: format!("open log file: {}", e),
            })?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn listening(&self, addr: SocketAddr, root: &Path) {
        self.line(&format!("LISTEN addr={} root={}", addr, root.display()));
    }
    fn accepted(&self, peer: SocketAddr) {
        self.line(&format!("ACCEPT peer={}", peer));
    }
    fn command(&self, command: &Command) {
        self.line(&format!("COMMAND {}", command));
    }
    fn data_connected(&self, addr: SocketAddr) {
        self.line(&format!("DATA addr={}", addr));
    }
    fn status(&self, code: &str) {
        self.line(&format!("STATUS {}", code));
    }
    fn session_done(&self, peer: SocketAddr, outcome: &Outcome, seconds: f64) {
        self.line(&format!(
            "DONE peer={} result={} seconds={seconds:.3}",
            peer,
            describe(outcome)
        ));
    }
    fn error(&self, context: &str, msg: &str) {
        self.line(&format!("ERROR ctx={} msg={}", context, msg));
    }
}
