// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Terminal transport event

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

/// The single terminal event a transport exchange yields.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Full response body
    pub body: Bytes,
    /// The URL the exchange was issued against
    pub url: Url,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the session follows this response.
    ///
    /// Exactly 301 and 302, not the full redirect family. 303/307/308 are
    /// delivered to the callback like any other terminal status.
    pub fn is_followable_redirect(&self) -> bool {
        matches!(self.status.as_u16(), 301 | 302)
    }

    /// The `Location` header of a redirect response
    pub fn redirect_target(&self) -> Option<&str> {
        self.header(super::headers::LOCATION)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get body as text, lossy conversion
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get body length
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
