//! Fixed-size framed message channel
//!
//! Every message on the wire occupies exactly `frame_size` bytes. The sender
//! zero-fills short payloads; the receiver never assumes a terminator beyond
//! what the sender wrote (see [`crate::protocol::frame_payload`]).

use crate::error::{Error, Result};
use std::io::{self, Read, Write};

pub struct FramedChannel<S> {
    stream: S,
    frame_size: usize,
}

impl<S> FramedChannel<S> {
    pub fn new(stream: S, frame_size: usize) -> Self {
        Self { stream, frame_size }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> FramedChannel<S> {
    /// Write one frame of exactly `frame_size` bytes.
    ///
    /// Payloads longer than the frame are rejected with
    /// [`Error::OversizedPayload`] before anything is written.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.frame_size {
            return Err(Error::OversizedPayload {
                len: payload.len(),
                max: self.frame_size,
            });
        }
        let mut buf = vec![0u8; self.frame_size];
        buf[..payload.len()].copy_from_slice(payload);
        // write_all fails with WriteZero instead of tolerating a short write
        self.stream
            .write_all(&buf)
            .and_then(|_| self.stream.flush())
            .map_err(|e| Error::io("write", e))
    }

    /// Single read of up to `frame_size` bytes.
    ///
    /// Returns only the bytes actually read, which may be fewer than a full
    /// frame. A zero-length read is reported as [`Error::ConnectionClosed`].
    pub fn receive_frame(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.frame_size];
        let n = loop {
            match self.stream.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io("read", e)),
            }
        };
        if n == 0 {
            return Err(Error::ConnectionClosed { op: "read" });
        }
        buf.truncate(n);
        Ok(buf)
    }

    /// Read until a whole frame has arrived, looping over short reads.
    ///
    /// The peer closing before the frame is complete is
    /// [`Error::ConnectionClosed`], whether or not any bytes arrived.
    pub fn receive_full_frame(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.frame_size];
        let mut filled = 0;
        while filled < self.frame_size {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::ConnectionClosed { op: "read" }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io("read", e)),
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{frame_payload, FRAME_SIZE};
    use std::io::Cursor;

    /// Accepts at most `limit` bytes, then reports a zero-length write.
    struct ShortWriter {
        written: Vec<u8>,
        limit: usize,
    }

    impl Read for ShortWriter {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Hands out its data a few bytes per read call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_pads_short_payload() {
        let mut ch = FramedChannel::new(Cursor::new(Vec::new()), FRAME_SIZE);
        ch.send_frame(b"dir").unwrap();
        let out = ch.into_inner().into_inner();
        assert_eq!(out.len(), FRAME_SIZE);
        assert_eq!(&out[..3], b"dir");
        assert!(out[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_send_exact_frame_size_payload() {
        let payload = vec![b'x'; FRAME_SIZE];
        let mut ch = FramedChannel::new(Cursor::new(Vec::new()), FRAME_SIZE);
        ch.send_frame(&payload).unwrap();
        assert_eq!(ch.into_inner().into_inner(), payload);
    }

    #[test]
    fn test_send_oversized_payload_rejected() {
        let payload = vec![b'x'; FRAME_SIZE + 1];
        let mut ch = FramedChannel::new(Cursor::new(Vec::new()), FRAME_SIZE);
        match ch.send_frame(&payload) {
            Err(Error::OversizedPayload { len, max }) => {
                assert_eq!(len, FRAME_SIZE + 1);
                assert_eq!(max, FRAME_SIZE);
            }
            other => panic!("expected OversizedPayload, got {:?}", other),
        }
        // Nothing was written, not even a truncated frame
        assert!(ch.into_inner().into_inner().is_empty());
    }

    #[test]
    fn test_frame_size_is_per_channel() {
        let mut ch = FramedChannel::new(Cursor::new(Vec::new()), 16);
        assert!(ch.send_frame(b"sixteen-bytes!!!").is_ok());
        assert!(matches!(
            ch.send_frame(b"seventeen-bytes!!"),
            Err(Error::OversizedPayload { max: 16, .. })
        ));
        assert_eq!(ch.into_inner().into_inner().len(), 16);
    }

    #[test]
    fn test_short_write_is_an_error() {
        let w = ShortWriter {
            written: Vec::new(),
            limit: 100,
        };
        let mut ch = FramedChannel::new(w, FRAME_SIZE);
        match ch.send_frame(b"~done") {
            Err(Error::Io { op, source }) => {
                assert_eq!(op, "write");
                assert_eq!(source.kind(), io::ErrorKind::WriteZero);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_receive_returns_bytes_read() {
        let mut ch = FramedChannel::new(Cursor::new(b"-l".to_vec()), FRAME_SIZE);
        assert_eq!(ch.receive_frame().unwrap(), b"-l");
    }

    #[test]
    fn test_receive_on_closed_peer() {
        let mut ch = FramedChannel::new(Cursor::new(Vec::new()), FRAME_SIZE);
        assert!(matches!(
            ch.receive_frame(),
            Err(Error::ConnectionClosed { op: "read" })
        ));
    }

    #[test]
    fn test_receive_caps_at_frame_size() {
        let data = vec![b'a'; FRAME_SIZE * 2];
        let mut ch = FramedChannel::new(Cursor::new(data), FRAME_SIZE);
        assert_eq!(ch.receive_frame().unwrap().len(), FRAME_SIZE);
        assert_eq!(ch.receive_frame().unwrap().len(), FRAME_SIZE);
        assert!(ch.receive_frame().is_err());
    }

    #[test]
    fn test_receive_full_frame_joins_short_reads() {
        let mut sender = FramedChannel::new(Cursor::new(Vec::new()), FRAME_SIZE);
        sender.send_frame(b"6001").unwrap();
        let data = sender.into_inner().into_inner();
        let mut ch = FramedChannel::new(
            Trickle {
                data,
                pos: 0,
                step: 7,
            },
            FRAME_SIZE,
        );
        let frame = ch.receive_full_frame().unwrap();
        assert_eq!(frame.len(), FRAME_SIZE);
        assert_eq!(frame_payload(&frame), b"6001");
    }

    #[test]
    fn test_receive_full_frame_truncated_by_close() {
        let mut ch = FramedChannel::new(Cursor::new(b"partial".to_vec()), FRAME_SIZE);
        assert!(matches!(
            ch.receive_full_frame(),
            Err(Error::ConnectionClosed { .. })
        ));
    }
}
