//! Server middleware
//!
//! Provides session logging.

pub mod logging;
