//! Module `client`
//!
//! Defines the `Client` struct holding per-session state: the peer address
//! and the directory the session is currently looking at.

use std::net::SocketAddr;

/// Represents the state of a connected client.
///
/// `current_dir` is a canonical relative path, empty for the storage root.
#[derive(Debug, Clone, Default)]
pub struct Client {
    client_addr: Option<SocketAddr>,
    current_dir: String,
}

impl Client {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr: Some(client_addr),
            current_dir: String::new(),
        }
    }

    /// Returns the client's socket address if known.
    pub fn client_addr(&self) -> Option<&SocketAddr> {
        self.client_addr.as_ref()
    }

    /// Returns the directory the session navigated to last.
    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    /// Sets the current directory.
    ///
    /// Only engine-validated relative paths are stored here.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = dir;
    }
}
