//! docshape-server binary
//!
//! Reads its configuration from the environment, builds the capture API
//! client, and serves the conversion endpoint over HTTP.

use std::process;

use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod server;

use config::ServerConfig;
use server::ConversionServer;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let server = match ConversionServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: failed to install tracing subscriber");
    }
}
