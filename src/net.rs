//! Control listener and per-client session orchestration
//!
//! One session: accept the control connection, read the command frame and the
//! data-port frame, connect back to the client's address on that port, run the
//! dispatcher over the data connection, then close both connections.

use crate::command::{Command, Dispatcher, Outcome};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::frame::FramedChannel;
use crate::logger::Logger;
use crate::protocol::frame_payload;
use crate::transfer::stream_file;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

// Poll interval for accept when a timeout is configured
const ACCEPT_POLL: Duration = Duration::from_millis(10);
// Pause after a failed accept in the serving loop (e.g. out of descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// What the client sent on the control connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub command_frame: Vec<u8>,
    pub data_port: u16,
}

#[derive(Debug)]
pub struct SessionReport {
    pub peer: SocketAddr,
    pub command: Command,
    pub outcome: Outcome,
}

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    /// Validate the config, then bind and listen on the control port.
    ///
    /// An invalid port fails with [`Error::InvalidPort`] before any socket
    /// is opened.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let addr = SocketAddr::new(config.bind_ip, config.port);
        let listener = TcpListener::bind(addr).map_err(|source| Error::Bind { addr, source })?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Error::io("local address", e))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve exactly one client session.
    ///
    /// Both connections are closed when this returns, on success and on error.
    pub fn serve_one(&self, logger: &dyn Logger) -> Result<SessionReport> {
        let result = accept_until(&self.listener, self.config.timeout).and_then(|(control, peer)| {
            logger.accepted(peer);
            self.run_session(control, peer, logger)
        });
        if let Err(ref e) = result {
            logger.error("session", &e.to_string());
        }
        result
    }

    /// Serve one session, or sessions back to back when `keep_serving` is set.
    ///
    /// In the looping mode a failed session is logged and the next client is
    /// accepted; only the single-session mode returns the session's error.
    pub fn serve(&self, logger: &dyn Logger) -> Result<()> {
        if let Ok(addr) = self.local_addr() {
            logger.listening(addr, &self.config.root);
        }
        if !self.config.keep_serving {
            return self.serve_one(logger).map(|_| ());
        }
        loop {
            // Errors are already logged by serve_one
            if let Err(Error::Accept(_)) = self.serve_one(logger) {
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }

    fn run_session(
        &self,
        control: TcpStream,
        peer: SocketAddr,
        logger: &dyn Logger,
    ) -> Result<SessionReport> {
        let started = Instant::now();
        let timeout = self.config.timeout;
        set_timeouts(&control, timeout)?;
        let mut control = FramedChannel::new(control, self.config.frame_size);

        let handshake = read_handshake(&mut control)?;
        let data_addr = SocketAddr::new(peer.ip(), handshake.data_port);
        let data = connect_data(data_addr, timeout)?;
        logger.data_connected(data_addr);
        let mut data = FramedChannel::new(data, self.config.frame_size);

        let mut dispatcher = Dispatcher::new(&self.config.root, logger);
        let result = dispatcher
            .run(&mut data, &handshake.command_frame)
            .and_then(|outcome| {
                if let Outcome::FileFound(ref path) = outcome {
                    stream_file(&mut data, path)?;
                }
                Ok(outcome)
            });

        let _ = data.get_ref().shutdown(Shutdown::Both);
        let _ = control.get_ref().shutdown(Shutdown::Both);

        let outcome = result?;
        logger.session_done(peer, &outcome, started.elapsed().as_secs_f64());
        Ok(SessionReport {
            peer,
            command: Command::parse(&handshake.command_frame),
            outcome,
        })
    }
}

/// Command frame, then a frame holding the data port as ASCII decimal.
pub fn read_handshake(control: &mut FramedChannel<TcpStream>) -> Result<Handshake> {
    let command_frame = control.receive_full_frame()?;
    let port_frame = control.receive_full_frame()?;
    let data_port = parse_data_port(&port_frame)?;
    Ok(Handshake {
        command_frame,
        data_port,
    })
}

pub fn parse_data_port(frame: &[u8]) -> Result<u16> {
    let text = String::from_utf8_lossy(frame_payload(frame)).into_owned();
    match text.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(Error::InvalidDataPort(text)),
    }
}

fn set_timeouts(stream: &TcpStream, timeout: Option<Duration>) -> Result<()> {
    stream
        .set_read_timeout(timeout)
        .and_then(|_| stream.set_write_timeout(timeout))
        .map_err(|e| Error::io("configure socket", e))
}

fn connect_data(addr: SocketAddr, timeout: Option<Duration>) -> Result<TcpStream> {
    let stream = match timeout {
        Some(t) => TcpStream::connect_timeout(&addr, t),
        None => TcpStream::connect(addr),
    }
    .map_err(|source| Error::DataConnect { addr, source })?;
    set_timeouts(&stream, timeout)?;
    Ok(stream)
}

/// Accept one connection, blocking forever when `timeout` is `None`.
pub(crate) fn accept_until(
    listener: &TcpListener,
    timeout: Option<Duration>,
) -> Result<(TcpStream, SocketAddr)> {
    let Some(timeout) = timeout else {
        return listener.accept().map_err(Error::Accept);
    };

    listener.set_nonblocking(true).map_err(Error::Accept)?;
    let deadline = Instant::now() + timeout;
    let accepted = loop {
        match listener.accept() {
            Ok(pair) => break Ok(pair),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    break Err(Error::Timeout { op: "accept" });
                }
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => break Err(Error::Accept(e)),
        }
    };
    let _ = listener.set_nonblocking(false);
    let (stream, peer) = accepted?;
    // Accepted sockets may inherit non-blocking mode on some platforms
    stream.set_nonblocking(false).map_err(Error::Accept)?;
    Ok((stream, peer))
}
