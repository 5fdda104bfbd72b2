//! Client registry
//!
//! Tracks connected sessions for the connection limit. Session state itself
//! lives in each session task, so no lock is held while a command runs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Registry for tracking active clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Instant>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_clients` sessions are already active.
    pub fn try_register(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.clients.len() >= max_clients {
            return false;
        }
        self.clients.insert(addr, Instant::now());
        true
    }

    /// Removes `addr`, returning when it connected.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Instant> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_enforces_limit() {
        let mut registry = ClientRegistry::new();
        let a: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:4001".parse().unwrap();

        assert!(registry.try_register(a, 1));
        assert!(!registry.try_register(b, 1));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&a).is_some());
        assert!(registry.is_empty());
        assert!(registry.try_register(b, 1));
    }
}
