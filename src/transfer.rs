//! File body streaming that follows a `fil` status.
//!
//! The body goes out as consecutive frames of at most `frame_size` bytes and
//! ends with a `~done` frame. Frames are zero-padded, so this is only exact for
//! text files without NUL bytes.

use crate::error::{Error, Result};
use crate::frame::FramedChannel;
use crate::protocol::status;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Stream the file at `path` and return the number of body bytes sent.
pub fn stream_file<S: Read + Write>(channel: &mut FramedChannel<S>, path: &Path) -> Result<u64> {
    let mut file = File::open(path).map_err(|e| Error::io("open file", e))?;
    let mut buf = vec![0u8; channel.frame_size()];
    let mut total = 0u64;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io("read file", e)),
        };
        channel.send_frame(&buf[..n])?;
        total += n as u64;
    }
    channel.send_frame(status::DONE)?;
    Ok(total)
}
