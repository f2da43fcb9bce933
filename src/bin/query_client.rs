use std::{error::Error, io, net::SocketAddr, time::Duration};

use clap::Parser;
use tunequery::{
    ClientConfig, QueryClient,
    client::DEFAULT_ADDRESS,
    protocol::frame::DEFAULT_MAX_FRAME_SIZE,
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address of the query server
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    address: SocketAddr,
    /// Give up waiting for a response after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Largest accepted message, in bytes (capped at 16 MiB)
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to STDERR; STDOUT carries the transcript.
    env_logger::init();

    let cli = Cli::parse();
    let config = ClientConfig {
        address: cli.address,
        response_timeout: cli.timeout_ms.map(Duration::from_millis),
        max_frame_size: cli.max_frame_size,
    };

    QueryClient::run(&config, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
