//! Scoped file manager - Entry Point
//!
//! Serves browse, create, delete, upload, copy and move operations confined
//! to a single storage root.

use log::info;
use std::process::ExitCode;

use scoped_fm::config::ServerConfig;
use scoped_fm::error::ServerError;
use scoped_fm::error::handlers::handle_error;
use scoped_fm::server::Server;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching scoped file manager...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await;
    Ok(())
}
