use std::io::{self, Read, Write};

use log::debug;
use thiserror::Error;

use super::{
    FrameDecoder, FrameEncoder, FrameError,
    codec::{CodecError, Decoder, Encoder},
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
}

/// Framed message exchange over a pair of byte streams.
pub struct ProtocolTransport<R: Read, W: Write> {
    reader: R,
    writer: W,
    frame_decoder: FrameDecoder,
    frame_encoder: FrameEncoder,
}

impl<R: Read, W: Write> ProtocolTransport<R, W> {
    pub fn new(reader: R, writer: W, frame_decoder: FrameDecoder, frame_encoder: FrameEncoder) -> Self {
        Self {
            reader,
            writer,
            frame_decoder,
            frame_encoder,
        }
    }

    /// Encodes `message`, frames it and pushes it onto the wire.
    pub fn send<M, E: Encoder<M>>(&mut self, encoder: &mut E, message: &M) -> Result<(), TransportError> {
        let payload = encoder.encode(message)?;
        self.frame_encoder.write_frame(&mut self.writer, &payload)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Next decoded message, or `None` if the peer closed the stream between frames.
    pub fn receive<D: Decoder>(&mut self, decoder: &mut D) -> Result<Option<D::Item>, TransportError> {
        match self.frame_decoder.read_frame(&mut self.reader)? {
            Some(frame) => Ok(Some(decoder.decode(&frame)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Blocks until the peer closes its side, discarding anything still in flight.
    pub fn wait_closed(&mut self) -> Result<(), TransportError> {
        let discarded = io::copy(&mut self.reader, &mut io::sink())?;
        if discarded > 0 {
            debug!("discarded {discarded} trailing bytes before close");
        }
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}
