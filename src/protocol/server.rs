use std::{
    io::{BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream},
};

use log::{info, warn};

use super::{
    FrameDecoder, FrameEncoder, ProtocolTransport, QueryRequest, QueryResponse, RequestDecoder,
    ResponseEncoder, ThreadPool, frame::DEFAULT_MAX_FRAME_SIZE, transport::TransportError,
};

/// Loopback responder answering every query with `ECHO:<text>`.
///
/// After answering a `bye` query the connection is closed.
pub struct EchoServer {
    listener: TcpListener,
    pool: ThreadPool,
    max_frame_size: usize,
}

impl EchoServer {
    pub fn bind(address: SocketAddr, workers: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)?;
        Ok(Self {
            listener,
            pool: ThreadPool::new(workers),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn listen(self) -> Result<(), TransportError> {
        info!("listening at {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let max_frame_size = self.max_frame_size;
                    self.pool.execute(move || {
                        if let Err(e) = handle_connection(stream, max_frame_size) {
                            warn!("connection failed: {e}");
                        }
                    });
                }
                Err(e) => warn!("broken connection: {e:?}"),
            }
        }
        Ok(())
    }
}

pub fn echo(request: &QueryRequest) -> QueryResponse {
    QueryResponse::Results {
        body: format!("ECHO:{}", request.text),
    }
}

fn handle_connection(stream: TcpStream, max_frame_size: usize) -> Result<(), TransportError> {
    let peer = stream.peer_addr()?;
    info!("accepted connection from {peer}");

    let reader = BufReader::new(stream.try_clone()?);
    let writer = BufWriter::new(stream);
    let mut transport = ProtocolTransport::new(
        reader,
        writer,
        FrameDecoder::new(max_frame_size),
        FrameEncoder::new(max_frame_size),
    );
    let mut decoder = RequestDecoder::default();
    let mut encoder = ResponseEncoder::default();

    loop {
        let Some(req) = transport.receive(&mut decoder)? else {
            info!("{peer} disconnected");
            return Ok(());
        };
        info!("received request: {req:?}");

        transport.send(&mut encoder, &echo(&req))?;

        if req.is_bye() {
            info!("closing connection to {peer}");
            return Ok(());
        }
    }
}
