//! Length-prefixed message framing.
//!
//! Every message on the wire is preceded by its length encoded as a base-128 varint
//! (at most 5 bytes, least significant group first, high bit set on every byte except
//! the last). This is the same layout protobuf uses for delimited messages:
//!
//! ```text
//! +----------------+---------------------+
//! | length: varint | payload: length B   |
//! +----------------+---------------------+
//! ```
use std::io::{self, ErrorKind, Read, Write};

use log::trace;
use thiserror::Error;

/// Largest payload accepted by default, 1 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Hard upper bound on any configured frame size, 16 MiB. Message decoding is limited
/// to the same number of bytes.
pub const FRAME_SIZE_CEILING: usize = 16 * 1024 * 1024;

const MAX_VARINT32_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame IO error: {0}")]
    Io(#[from] io::Error),
    #[error("frame of {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("malformed varint length prefix")]
    MalformedLength,
    #[error("stream ended in the middle of a frame")]
    Truncated,
}

/// Splits an inbound byte stream into discrete messages.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    max_frame_size: usize,
}

impl FrameDecoder {
    /// `max_frame_size` is clamped to [`FRAME_SIZE_CEILING`].
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.min(FRAME_SIZE_CEILING),
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Reads the next frame payload. Returns `None` when the stream ends cleanly
    /// on a frame boundary.
    pub fn read_frame<R: Read>(&self, reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
        let len = match read_varint32(reader)? {
            Some(len) => len as usize,
            None => return Ok(None),
        };
        if len > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let mut payload = vec![0; len];
        reader.read_exact(&mut payload).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => FrameError::Truncated,
            _ => FrameError::Io(e),
        })?;
        trace!("read frame of {len} bytes");
        Ok(Some(payload))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Prefixes outbound messages with their varint length.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    max_frame_size: usize,
}

impl FrameEncoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.min(FRAME_SIZE_CEILING),
        }
    }

    pub fn write_frame<W: Write>(&self, writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size: payload.len(),
                max: self.max_frame_size,
            });
        }

        let mut prefix = Vec::with_capacity(MAX_VARINT32_LEN);
        encode_varint32(payload.len() as u32, &mut prefix);
        writer.write_all(&prefix)?;
        writer.write_all(payload)?;
        trace!("wrote frame of {} bytes", payload.len());
        Ok(())
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

pub fn encode_varint32(mut value: u32, dst: &mut Vec<u8>) {
    while value >= 0x80 {
        dst.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    dst.push(value as u8);
}

fn read_varint32<R: Read>(reader: &mut R) -> Result<Option<u32>, FrameError> {
    let mut value: u64 = 0;

    for i in 0..MAX_VARINT32_LEN {
        let byte = match read_byte(reader)? {
            Some(b) => b,
            None if i == 0 => return Ok(None),
            None => return Err(FrameError::Truncated),
        };

        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u32::try_from(value)
                .map(Some)
                .map_err(|_| FrameError::MalformedLength);
        }
    }

    Err(FrameError::MalformedLength)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, FrameError> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn varint_prefix_widths() {
        let inputs = vec![
            (0u32, vec![0x00]),
            (1, vec![0x01]),
            (127, vec![0x7f]),
            (128, vec![0x80, 0x01]),
            (300, vec![0xac, 0x02]),
            (u32::MAX, vec![0xff, 0xff, 0xff, 0xff, 0x0f]),
        ];

        for (value, expected) in inputs {
            let mut out = Vec::new();
            encode_varint32(value, &mut out);
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn frames_survive_prefix_boundary() {
        let encoder = FrameEncoder::default();
        let decoder = FrameDecoder::default();
        let short = vec![7u8; 127];
        let long = vec![9u8; 128];

        let mut wire: Vec<u8> = Vec::new();
        encoder.write_frame(&mut wire, &short).unwrap();
        encoder.write_frame(&mut wire, &long).unwrap();
        assert_eq!(wire.len(), 1 + 127 + 2 + 128);

        let mut reader = Cursor::new(wire);
        assert_eq!(decoder.read_frame(&mut reader).unwrap(), Some(short));
        assert_eq!(decoder.read_frame(&mut reader).unwrap(), Some(long));
        assert_eq!(decoder.read_frame(&mut reader).unwrap(), None);
    }

    #[test]
    fn empty_stream_has_no_frame() {
        let mut reader = Cursor::new(Vec::<u8>::new());

        assert!(FrameDecoder::default().read_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn truncated_payload() {
        let mut reader = Cursor::new(vec![0x05, b'a', b'b']);
        let err = FrameDecoder::default().read_frame(&mut reader).unwrap_err();

        assert!(matches!(err, FrameError::Truncated));
    }

    #[test]
    fn truncated_prefix() {
        let mut reader = Cursor::new(vec![0x80]);
        let err = FrameDecoder::default().read_frame(&mut reader).unwrap_err();

        assert!(matches!(err, FrameError::Truncated));
    }

    #[test]
    fn overlong_prefix() {
        let mut reader = Cursor::new(vec![0xff; 6]);
        let err = FrameDecoder::default().read_frame(&mut reader).unwrap_err();

        assert!(matches!(err, FrameError::MalformedLength));
    }

    #[test]
    fn oversized_frame_rejected() {
        let decoder = FrameDecoder::new(16);
        let mut wire: Vec<u8> = Vec::new();
        FrameEncoder::default()
            .write_frame(&mut wire, &[0u8; 17])
            .unwrap();

        let err = decoder.read_frame(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { size: 17, max: 16 }));

        let err = FrameEncoder::new(16)
            .write_frame(&mut Vec::<u8>::new(), &[0u8; 17])
            .unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { size: 17, max: 16 }));
    }

    #[test]
    fn frame_size_is_capped() {
        let decoder = FrameDecoder::new(usize::MAX);
        assert_eq!(decoder.max_frame_size(), FRAME_SIZE_CEILING);

        let mut wire: Vec<u8> = Vec::new();
        encode_varint32(FRAME_SIZE_CEILING as u32 + 1, &mut wire);
        let err = decoder.read_frame(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
    }
}
