// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Mustekala - Single-Flight Fetch Bridge
//!
//! An async HTTP fetch bridge for media player resolver plugins. Plugins
//! issue one outstanding request at a time and get the body delivered to a
//! callback; the host's event loop never blocks.
//!
//! ## Features
//!
//! - Single-flight: one fetch slot, `Busy` rejection returns the request
//! - Exactly-once delivery: callback on success, UI warning on failure
//! - Transparent 301/302 following with a bounded hop count
//! - Per-host policy: referer overrides, user-agent derivation, unseekable
//!   host hints for playback
//! - Process-wide proxy: none, HTTP, SOCKS5
//! - Published "final resolved URL" side channel
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mustekala::{LogDelegate, ScriptBridge};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = ScriptBridge::new(Arc::new(LogDelegate))?;
//!
//!     bridge.bind_referer("example.com", "https://example.com/player")?;
//!     bridge.fetch_get("https://example.com/watch?v=1", None, |body| async move {
//!         println!("resolved page: {} bytes", body.len());
//!         Ok(())
//!     })?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod policy;
pub mod session;

// Re-exports for convenience

// Plugin-facing bridge
pub use api::ScriptBridge;

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{HttpClient, ProxyKind, Request, Response, Transport};

// Policy
pub use policy::{PolicySnapshot, PolicyTables, DEFAULT_USER_AGENT, MOBILE_USER_AGENT};

// Session
pub use session::{
    Busy, FetchCallback, FetchRequest, FetchSession, LogDelegate, UiDelegate, DEFAULT_TIMEOUT,
    MAX_REDIRECT_HOPS,
};

/// Mustekala version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
