//! Client-server communication protocol.
//!
//! This module defines how search queries travel between a [`QueryClient`](crate::client::QueryClient)
//! and a server: the message types, the framing of those messages on a byte stream and the
//! codecs in between.
//!
//! # Key Components
//!
//! - [`QueryRequest`] / [`QueryResponse`]: typed messages exchanged per query.
//! - [`FrameDecoder`] / [`FrameEncoder`]: varint length-prefixed framing.
//! - [`Pipeline`]: the stages a client connection installs before use.
//! - [`ProtocolTransport`]: framed message exchange over a pair of byte streams.
//!
//! # Binary Format
//!
//! - Each message begins with a base-128 varint holding the payload length.
//! - The payload is the bincode encoding of the message.
//! - All fixed-width integers are big-endian.
//!
//! # See Also
//!
//! - [`client`](crate::client): Interactive loop built on top of this module.
pub mod codec;
pub mod frame;
pub mod pipeline;
mod request;
mod response;
mod server;
mod thread;
mod transport;

use thread::ThreadPool;

pub use codec::{RequestDecoder, RequestEncoder, ResponseDecoder, ResponseEncoder};
pub use frame::{FrameDecoder, FrameEncoder, FrameError};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use request::{QueryRequest, QueryService, is_bye};
pub use response::{QueryResponse, ResponseError};
pub use server::{EchoServer, echo};
pub use transport::{ProtocolTransport, TransportError};
