// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for the fetch bridge
//!
//! Wraps a single shared client that injects per-host policy headers and
//! applies the process-wide proxy. Redirect interpretation belongs to the
//! session, so the client never follows them itself.

mod client;
mod request;
mod response;
mod traits;

pub use client::{HttpClient, ProxyKind};
pub use request::Request;
pub use response::Response;
pub use traits::Transport;

/// Common HTTP headers
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const USER_AGENT: &str = "user-agent";
    pub const REFERER: &str = "referer";
    pub const LOCATION: &str = "location";
}

/// Content type sent with POST bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
