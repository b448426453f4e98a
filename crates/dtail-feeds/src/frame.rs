//! Docker multiplexed log stream framing.
//!
//! Containers started without a TTY deliver logs as a sequence of frames, each
//! prefixed with an 8-byte header:
//!
//! ```text
//! [stream: u8, 0, 0, 0, len: u32 big-endian] payload[len]
//! ```
//!
//! where `stream` is 0 (stdin), 1 (stdout) or 2 (stderr). [`FrameDecoder`]
//! strips the headers so downstream line splitting sees plain log bytes.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

pub const HEADER_LEN: usize = 8;

/// Which standard stream a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(StreamKind::Stdin),
            1 => Some(StreamKind::Stdout),
            2 => Some(StreamKind::Stderr),
            _ => None,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: StreamKind,
    pub payload: Bytes,
}

/// [`Decoder`] for the multiplexed stream format.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let kind = StreamKind::from_byte(src[0]).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown stream type {} in log frame header", src[0]),
            )
        })?;
        let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }
        src.advance(HEADER_LEN);
        let payload = src.split_to(len).freeze();
        Ok(Some(Frame { kind, payload }))
    }
}
