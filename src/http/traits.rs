// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport seam between the session and the HTTP client

use async_trait::async_trait;

use super::{Request, Response};
use crate::error::Result;

/// One outstanding request/response exchange.
///
/// `HttpClient` is the production implementation; tests drive the session
/// against scripted transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and wait for its single terminal event.
    ///
    /// Implementations do not retry, do not interpret status codes and do
    /// not follow redirects; all of that is session policy.
    async fn issue(&self, request: &Request) -> Result<Response>;
}
