//! Logging middleware
//!
//! Provides session logging helpers.

use log::info;
use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::Command;

/// Log a client connection
pub fn log_connection(client_addr: &SocketAddr, active: usize, max_clients: usize) {
    info!(
        "Client connected: {} ({}/{} clients)",
        client_addr, active, max_clients
    );
}

/// Log a client command
pub fn log_command(client_addr: &SocketAddr, command: &Command) {
    info!("Client {} executed: {:?}", client_addr, command);
}

/// Log a client disconnect with the session length
pub fn log_disconnect(client_addr: &SocketAddr, connected_for: Option<Duration>) {
    match connected_for {
        Some(duration) => info!(
            "Client {} disconnected after {:.1}s",
            client_addr,
            duration.as_secs_f64()
        ),
        None => info!("Client {} disconnected", client_addr),
    }
}
