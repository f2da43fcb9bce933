use std::{error::Error, net::SocketAddr, process};

use clap::Parser;
use log::info;
use tunequery::{client::DEFAULT_ADDRESS, protocol::EchoServer};

#[derive(Debug, Parser)]
#[command(version, about = "Loopback server answering every query with ECHO:<text>")]
struct Cli {
    /// Listen for new connection at address
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    address: SocketAddr,
    /// Number of connection worker threads
    #[arg(long, default_value_t = 15)]
    workers: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    ctrlc::set_handler(|| {
        info!("received interrupt, shutting down");
        process::exit(0);
    })?;

    let server = EchoServer::bind(cli.address, cli.workers.max(1))?;
    server.listen()?;
    Ok(())
}
