pub mod cli;
pub mod client;
pub mod negotiation;
pub mod protocol;

pub use cli::Command;
pub use client::{ClientConfig, ClientError, QueryClient, SearchChannel, run_loop};
pub use negotiation::{ProtocolSelector, SelectedProtocol, SpdyProtocolRecorder};
