// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Wire-level request description

use bytes::Bytes;
use url::Url;

use crate::error::Result;

/// One outgoing exchange as the session describes it to the transport.
///
/// Method is implied: a request with a body is a POST, without one a GET.
/// The URL is rebound in place when the session follows a redirect.
#[derive(Debug, Clone)]
pub struct Request {
    /// Target URL
    pub url: Url,
    /// Explicit referer. Takes precedence over the policy table entry.
    pub referer: Option<String>,
    /// POST body, form-encoded by the caller
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url.as_ref())?,
            referer: None,
            body: None,
        })
    }

    /// Create a POST request with a form-encoded body
    pub fn post(url: impl AsRef<str>, body: impl Into<Bytes>) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url.as_ref())?,
            referer: None,
            body: Some(body.into()),
        })
    }

    /// Set the explicit referer
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Whether this request goes out as a POST
    pub fn is_post(&self) -> bool {
        self.body.is_some()
    }

    /// Get the target host
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Rebind the request to a redirect target.
    ///
    /// The target resolves against the current URL, so relative `Location`
    /// values work. Redirect hops go out as plain GETs with the explicit
    /// referer cleared; the policy table still applies on the new host.
    pub fn redirect_to(&mut self, target: &str) -> Result<()> {
        self.url = self.url.join(target)?;
        self.referer = None;
        self.body = None;
        Ok(())
    }
}
