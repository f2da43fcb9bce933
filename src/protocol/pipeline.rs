//! Connection processing pipeline.
//!
//! A client connection is set up by registering three stages: a [`FrameDecoder`] that
//! splits the inbound stream, a [`ResponseDecoder`] that turns frames into responses and
//! a [`RequestEncoder`] for the outbound side. Inbound stages depend on each other, so the
//! response decoder can only be registered after the frame decoder.
use std::fmt;

use log::debug;
use thiserror::Error;

use super::{FrameDecoder, FrameEncoder, RequestEncoder, ResponseDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FrameDecoder,
    ResponseDecoder,
    RequestEncoder,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FrameDecoder => "frameDecoder",
            Stage::ResponseDecoder => "queryResDecoder",
            Stage::RequestEncoder => "queryReqEncoder",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("stage '{stage}' must be registered after '{requires}'")]
    OutOfOrder { stage: Stage, requires: Stage },
    #[error("stage '{0}' was registered twice")]
    Duplicate(Stage),
    #[error("pipeline is missing stage '{0}'")]
    Missing(Stage),
}

/// Collects pipeline stages during connection setup.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    frame_decoder: Option<FrameDecoder>,
    response_decoder: Option<ResponseDecoder>,
    request_encoder: Option<RequestEncoder>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_decoder(&mut self, decoder: FrameDecoder) -> Result<&mut Self, PipelineError> {
        if self.frame_decoder.is_some() {
            return Err(PipelineError::Duplicate(Stage::FrameDecoder));
        }
        debug!("registered stage '{}'", Stage::FrameDecoder);
        self.frame_decoder = Some(decoder);
        Ok(self)
    }

    pub fn response_decoder(
        &mut self,
        decoder: ResponseDecoder,
    ) -> Result<&mut Self, PipelineError> {
        if self.frame_decoder.is_none() {
            return Err(PipelineError::OutOfOrder {
                stage: Stage::ResponseDecoder,
                requires: Stage::FrameDecoder,
            });
        }
        if self.response_decoder.is_some() {
            return Err(PipelineError::Duplicate(Stage::ResponseDecoder));
        }
        debug!("registered stage '{}'", Stage::ResponseDecoder);
        self.response_decoder = Some(decoder);
        Ok(self)
    }

    pub fn request_encoder(&mut self, encoder: RequestEncoder) -> Result<&mut Self, PipelineError> {
        if self.request_encoder.is_some() {
            return Err(PipelineError::Duplicate(Stage::RequestEncoder));
        }
        debug!("registered stage '{}'", Stage::RequestEncoder);
        self.request_encoder = Some(encoder);
        Ok(self)
    }

    /// Finishes setup; every stage must be present. The outbound framer mirrors
    /// the frame decoder's size limit.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let frame_decoder = self
            .frame_decoder
            .ok_or(PipelineError::Missing(Stage::FrameDecoder))?;
        let response_decoder = self
            .response_decoder
            .ok_or(PipelineError::Missing(Stage::ResponseDecoder))?;
        let request_encoder = self
            .request_encoder
            .ok_or(PipelineError::Missing(Stage::RequestEncoder))?;

        Ok(Pipeline {
            frame_encoder: FrameEncoder::new(frame_decoder.max_frame_size()),
            frame_decoder,
            response_decoder,
            request_encoder,
        })
    }
}

/// Installed client-side stages for one connection.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) frame_decoder: FrameDecoder,
    pub(crate) response_decoder: ResponseDecoder,
    pub(crate) request_encoder: RequestEncoder,
    pub(crate) frame_encoder: FrameEncoder,
}

impl Pipeline {
    /// Pipeline with every stage at its default settings, registered in order.
    pub fn standard(max_frame_size: usize) -> Result<Self, PipelineError> {
        let mut builder = PipelineBuilder::new();
        builder
            .frame_decoder(FrameDecoder::new(max_frame_size))?
            .response_decoder(ResponseDecoder::default())?
            .request_encoder(RequestEncoder::default())?;
        builder.build()
    }
}
