//! Client half of the control/data handshake
//!
//! The client listens on its data port *before* sending anything, so the
//! server's connect-back always finds a listener.

use crate::error::{Error, Result};
use crate::frame::FramedChannel;
use crate::net::accept_until;
use crate::protocol::{command, frame_payload, status, FRAME_SIZE};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Get(String),
    /// No command given; sent as the `%none` sentinel
    Nothing,
}

impl Request {
    fn payload(&self) -> Vec<u8> {
        match self {
            Request::List => command::LIST_PREFIX.to_vec(),
            Request::Get(name) => name.as_bytes().to_vec(),
            Request::Nothing => command::NONE_SENTINEL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Entry names with the trailing newline removed
    Listing(Vec<String>),
    File(Vec<u8>),
    NotFound,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub server: SocketAddr,
    /// Local port to receive the data connection on; 0 picks a free port
    pub data_port: u16,
    pub frame_size: usize,
    pub timeout: Option<Duration>,
}

impl Client {
    pub fn new(server: SocketAddr, data_port: u16) -> Self {
        Self {
            server,
            data_port,
            frame_size: FRAME_SIZE,
            timeout: None,
        }
    }

    pub fn request(&self, request: &Request) -> Result<Response> {
        let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.data_port);
        let listener = TcpListener::bind(bind).map_err(|source| Error::Bind { addr: bind, source })?;
        let data_port = listener
            .local_addr()
            .map_err(|e| Error::io("local address", e))?
            .port();

        let control = match self.timeout {
            Some(t) => TcpStream::connect_timeout(&self.server, t),
            None => TcpStream::connect(self.server),
        }
        .map_err(|e| Error::io("connect", e))?;
        let mut control = FramedChannel::new(control, self.frame_size);
        control.send_frame(&request.payload())?;
        control.send_frame(data_port.to_string().as_bytes())?;

        let (data, _) = accept_until(&listener, self.timeout)?;
        data.set_read_timeout(self.timeout)
            .map_err(|e| Error::io("configure socket", e))?;
        let mut data = FramedChannel::new(data, self.frame_size);
        let response = read_response(&mut data);

        let _ = data.get_ref().shutdown(Shutdown::Both);
        let _ = control.get_ref().shutdown(Shutdown::Both);
        response
    }
}

fn read_response(data: &mut FramedChannel<TcpStream>) -> Result<Response> {
    let first = data.receive_full_frame()?;
    match frame_payload(&first) {
        s if s == status::DIR => {
            let mut names = Vec::new();
            for line in read_until_done(data)? {
                let line = line.strip_suffix(b"\n").unwrap_or(&line);
                names.push(String::from_utf8_lossy(line).into_owned());
            }
            Ok(Response::Listing(names))
        }
        s if s == status::FILE => Ok(Response::File(read_until_done(data)?.concat())),
        s if s == status::NOT_FOUND => Ok(Response::NotFound),
        s if s == status::UNKNOWN => Ok(Response::Unknown),
        other => Err(Error::UnexpectedResponse(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

/// Collect frame payloads up to (not including) the `~done` terminator.
fn read_until_done(data: &mut FramedChannel<TcpStream>) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    loop {
        let frame = data.receive_full_frame()?;
        let payload = frame_payload(&frame);
        if payload == status::DONE {
            return Ok(out);
        }
        out.push(payload.to_vec());
    }
}
