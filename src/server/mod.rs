//! Server core functionality
//!
//! Listener, accept loop and connection limit.

pub mod core;

pub use core::Server;
