//! # Runtime Module
//!
//! One request, one `may` coroutine. Hosts that accept connections on a
//! `may` runtime hand each parsed [`Request`] to [`spawn_request`] and join
//! the handle for the response.
//!
//! ## Environment Variables
//!
//! ### `ROUTEGATE_STACK_SIZE`
//!
//! Stack size for request coroutines, decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x4000` (16 KB). Operations with deep call chains
//! or large locals need more.
//!
//! ```rust
//! use routegate::runtime::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_lookup(|_| Some("0x8000".to_string()));
//! assert_eq!(config.stack_size, 0x8000);
//! ```

use crate::dispatcher::Dispatcher;
use crate::server::{HttpResponse, Request};
use may::coroutine::JoinHandle;
use std::env;
use std::io;
use std::sync::Arc;
use tracing::{debug, error};

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unparsable or zero values fall
    /// back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = lookup("ROUTEGATE_STACK_SIZE")
            .as_deref()
            .and_then(parse_size)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_STACK_SIZE);
        Self { stack_size }
    }
}

/// Dispatch `request` on its own coroutine.
///
/// The coroutine never unwinds past the dispatcher, so joining the handle
/// yields the response for every request.
///
/// # Errors
///
/// Returns the spawn error if the coroutine could not be created.
pub fn spawn_request(
    dispatcher: Arc<Dispatcher>,
    request: Request,
    config: &RuntimeConfig,
) -> io::Result<JoinHandle<HttpResponse>> {
    let stack_size = config.stack_size;
    // SAFETY: the coroutine owns everything it touches (an `Arc` of the
    // dispatcher and the request); it holds no thread-local state and does
    // not block the worker thread outside of `may` primitives.
    #[allow(unsafe_code)]
    let spawned = unsafe {
        may::coroutine::Builder::new()
            .name("routegate-request".to_string())
            .stack_size(stack_size)
            .spawn(move || dispatcher.dispatch(&request))
    };
    match &spawned {
        Ok(_) => debug!(stack_size = stack_size, "Request coroutine spawned"),
        Err(err) => error!(
            stack_size = stack_size,
            error = %err,
            "Failed to spawn request coroutine"
        ),
    }
    spawned
}
