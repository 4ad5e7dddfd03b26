//! Environment-based runtime configuration.
//!
//! ## Environment variables
//!
//! ### `STRADA_STACK_SIZE`
//!
//! Stack size for handler coroutines, decimal (`16384`) or hex (`0x4000`).
//! Default: `0x4000` (16 KB).
//!
//! Larger stacks support deeper call chains; smaller stacks reduce memory
//! for many concurrent coroutines (800 in-flight requests × 1 MB stack =
//! 800 MB virtual memory). Tune to handler complexity.

use std::env;

/// Runtime configuration loaded from environment variables.
///
/// Load at startup with [`RuntimeConfig::from_env()`] before binding the
/// server; [`crate::server::HttpServer::listen`] applies it to the coroutine
/// runtime.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("STRADA_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }
}
