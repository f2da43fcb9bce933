//! Message codecs turning framed payloads into typed messages and back.
use bincode::{
    config::{BigEndian, Configuration, Fixint, Limit},
    decode_from_slice, encode_to_vec,
};
use thiserror::Error;

use super::{QueryRequest, QueryResponse, frame::FRAME_SIZE_CEILING};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Serialize(#[from] bincode::error::EncodeError),
    #[error("failed to decode message: {0}")]
    Deserialize(#[from] bincode::error::DecodeError),
}

/// Turns one framed payload into a typed message.
pub trait Decoder {
    type Item;

    fn decode(&mut self, frame: &[u8]) -> Result<Self::Item, CodecError>;
}

/// Turns a typed message into one payload, ready to be framed.
pub trait Encoder<Item> {
    fn encode(&mut self, item: &Item) -> Result<Vec<u8>, CodecError>;
}

/// Wire settings. The byte limit bounds what a decoded message may claim, so a length
/// read off the wire can never allocate more than the largest frame allowed.
fn wire_config() -> Configuration<BigEndian, Fixint, Limit<FRAME_SIZE_CEILING>> {
    bincode::config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
        .with_limit::<FRAME_SIZE_CEILING>()
}

macro_rules! bincode_codec {
    ($decoder:ident, $encoder:ident, $item:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $decoder;

        impl Decoder for $decoder {
            type Item = $item;

            fn decode(&mut self, frame: &[u8]) -> Result<$item, CodecError> {
                let (item, _) = decode_from_slice(frame, wire_config())?;
                Ok(item)
            }
        }

        #[derive(Debug, Clone, Copy, Default)]
        pub struct $encoder;

        impl Encoder<$item> for $encoder {
            fn encode(&mut self, item: &$item) -> Result<Vec<u8>, CodecError> {
                Ok(encode_to_vec(item, wire_config())?)
            }
        }
    };
}

bincode_codec!(RequestDecoder, RequestEncoder, QueryRequest);
bincode_codec!(ResponseDecoder, ResponseEncoder, QueryResponse);
