//! Stacks application library
//!
//! The library lending and product catalog modules, plus the bootstrap that
//! wires them into the kernel registry and HTTP server.
#![recursion_limit = "256"]

pub mod app;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;
