//! Interactive query client.
//!
//! [`QueryClient::connect`] opens a TCP connection and lets the caller install the
//! connection's [`Pipeline`]; [`run_loop`] then drives one query per input line over any
//! [`SearchChannel`], strictly one round trip at a time.
//!
//! # Example
//! ```no_run
//! use std::io;
//!
//! use tunequery::client::{ClientConfig, QueryClient, run_loop};
//! use tunequery::protocol::{FrameDecoder, RequestEncoder, ResponseDecoder};
//!
//! let config = ClientConfig::default();
//! let mut session = QueryClient::connect(&config, |p| {
//!     p.frame_decoder(FrameDecoder::new(config.max_frame_size))?
//!         .response_decoder(ResponseDecoder::default())?
//!         .request_encoder(RequestEncoder::default())?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! run_loop(io::stdin().lock(), io::stdout().lock(), &mut session).unwrap();
//! ```
use std::{
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream},
    time::Duration,
};

use log::{debug, info};
use thiserror::Error;

use crate::{
    cli::{Command, format_exchange, read_line},
    protocol::{
        FrameDecoder, Pipeline, PipelineBuilder, PipelineError, ProtocolTransport, QueryRequest,
        QueryResponse, RequestEncoder, ResponseDecoder, TransportError,
        frame::DEFAULT_MAX_FRAME_SIZE,
    },
};

pub const DEFAULT_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 6666));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: SocketAddr,
        source: io::Error,
    },
    #[error("pipeline setup failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("search request failed: {0}")]
    Submission(TransportError),
    #[error("connection teardown failed: {0}")]
    Teardown(TransportError),
    #[error("failed to write output: {0}")]
    Output(io::Error),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: SocketAddr,
    /// Bound on each wait for a response; `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            response_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// One connection able to answer search requests.
pub trait SearchChannel {
    /// Sends `request` and blocks until its response arrives.
    fn do_search(&mut self, request: QueryRequest) -> Result<QueryResponse, ClientError>;

    /// Blocks until the peer closes the connection.
    fn wait_closed(&mut self) -> Result<(), ClientError>;

    /// Completes any buffered outbound writes.
    fn flush_pending(&mut self) -> Result<(), ClientError>;
}

/// A connected pipeline: framed transport plus the installed message stages.
pub struct QuerySession<R: Read, W: Write> {
    transport: ProtocolTransport<R, W>,
    decoder: ResponseDecoder,
    encoder: RequestEncoder,
    /// Handle on the underlying socket, used to lift the response timeout before
    /// waiting for the peer to close.
    socket: Option<TcpStream>,
}

impl<R: Read, W: Write> QuerySession<R, W> {
    pub fn new(reader: R, writer: W, pipeline: Pipeline) -> Self {
        let Pipeline {
            frame_decoder,
            response_decoder,
            request_encoder,
            frame_encoder,
        } = pipeline;

        Self {
            transport: ProtocolTransport::new(reader, writer, frame_decoder, frame_encoder),
            decoder: response_decoder,
            encoder: request_encoder,
            socket: None,
        }
    }

    fn with_socket(mut self, socket: TcpStream) -> Self {
        self.socket = Some(socket);
        self
    }
}

impl<R: Read, W: Write> SearchChannel for QuerySession<R, W> {
    fn do_search(&mut self, request: QueryRequest) -> Result<QueryResponse, ClientError> {
        debug!("sending request: {request:?}");
        self.transport
            .send(&mut self.encoder, &request)
            .map_err(ClientError::Submission)?;

        match self.transport.receive(&mut self.decoder) {
            Ok(Some(resp)) => {
                debug!("received response: {resp:?}");
                Ok(resp)
            }
            Ok(None) => Err(ClientError::Submission(TransportError::ConnectionClosed)),
            Err(e) => Err(ClientError::Submission(e)),
        }
    }

    fn wait_closed(&mut self) -> Result<(), ClientError> {
        info!("waiting for server to close the connection");
        if let Some(socket) = &self.socket {
            socket
                .set_read_timeout(None)
                .map_err(|e| ClientError::Teardown(TransportError::Io(e)))?;
        }
        self.transport.wait_closed().map_err(ClientError::Teardown)
    }

    fn flush_pending(&mut self) -> Result<(), ClientError> {
        self.transport.flush().map_err(ClientError::Teardown)
    }
}

pub type TcpSession = QuerySession<BufReader<TcpStream>, BufWriter<TcpStream>>;

pub struct QueryClient;

impl QueryClient {
    /// Connects to `config.address` and installs the pipeline built by `init`.
    pub fn connect<F>(config: &ClientConfig, init: F) -> Result<TcpSession, ClientError>
    where
        F: FnOnce(&mut PipelineBuilder) -> Result<(), PipelineError>,
    {
        let address = config.address;
        let connect_err = move |source| ClientError::Connect { address, source };

        let stream = TcpStream::connect(address).map_err(connect_err)?;
        stream
            .set_read_timeout(config.response_timeout)
            .map_err(connect_err)?;
        info!("connected to {address}");

        let mut builder = PipelineBuilder::new();
        init(&mut builder)?;
        let pipeline = builder.build()?;

        let socket = stream.try_clone().map_err(connect_err)?;
        let reader = BufReader::new(stream.try_clone().map_err(connect_err)?);
        let writer = BufWriter::new(stream);
        Ok(QuerySession::new(reader, writer, pipeline).with_socket(socket))
    }

    /// Connects with the standard pipeline and runs [`run_loop`] until input ends or `bye`.
    pub fn run<I: BufRead, O: Write>(
        config: &ClientConfig,
        input: I,
        output: O,
    ) -> Result<usize, ClientError> {
        let mut session = Self::connect(config, |p| {
            p.frame_decoder(FrameDecoder::new(config.max_frame_size))?
                .response_decoder(ResponseDecoder::default())?
                .request_encoder(RequestEncoder::default())?;
            Ok(())
        })?;

        run_loop(input, output, &mut session)
    }
}

/// Reads queries from `input` until end of input or `bye`, printing each exchange.
///
/// Returns the number of queries answered.
pub fn run_loop<I, O, C>(mut input: I, mut output: O, channel: &mut C) -> Result<usize, ClientError>
where
    I: BufRead,
    O: Write,
    C: SearchChannel,
{
    info!("begin loop");
    let mut answered = 0;

    while let Some(line) = read_line(&mut input) {
        let command = Command::from(line);
        let response = channel.do_search(QueryRequest::song(command.text()))?;
        answered += 1;

        writeln!(output, "{}", format_exchange(command.text(), &response))
            .and_then(|_| output.flush())
            .map_err(ClientError::Output)?;

        if let Command::Bye(_) = command {
            channel.wait_closed()?;
            break;
        }
    }

    channel.flush_pending()?;
    info!("loop finished after {answered} queries");
    Ok(answered)
}
