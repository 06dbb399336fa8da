//! Shared protocol constants for the control/data file-transfer exchange

/// Default capacity of every frame on the wire. Shorter payloads are zero-filled.
pub const FRAME_SIZE: usize = 500;

// Smallest frame able to carry every status/terminator and a five-digit port
pub const MIN_FRAME_SIZE: usize = 8;

// Valid range for the server's control port (inclusive)
pub const PORT_MIN: u16 = 4000;
pub const PORT_MAX: u16 = 65000;

// Command frame contents (client -> server, control connection)
pub mod command {
    /// Prefix selecting a directory listing
    pub const LIST_PREFIX: &[u8] = b"-l";
    /// Sentinel the client sends when no command was given
    pub const NONE_SENTINEL: &[u8] = b"%none";
}

// Status frames (server -> client, data connection)
pub mod status {
    pub const DIR: &[u8] = b"dir";
    pub const FILE: &[u8] = b"fil";
    pub const NOT_FOUND: &[u8] = b"nof";
    pub const UNKNOWN: &[u8] = b"unk";
    /// Terminates a listing or a streamed file body
    pub const DONE: &[u8] = b"~done";
}

/// Strip the zero padding from a received frame.
///
/// The payload ends at the first NUL byte; a frame with no NUL is all payload.
pub fn frame_payload(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == 0) {
        Some(end) => &buf[..end],
        None => buf,
    }
}
