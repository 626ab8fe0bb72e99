// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Shared HTTP client with per-host policy injection

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use reqwest::Client;

use super::{headers, Request, Response, Transport, FORM_CONTENT_TYPE};
use crate::error::{Error, Result};
use crate::policy::PolicyTables;

/// Process-wide proxy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyKind {
    /// Direct connection
    #[default]
    None,
    /// HTTP proxy
    Http,
    /// SOCKS5 proxy
    Socks5,
}

impl FromStr for ProxyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("none") {
            Ok(ProxyKind::None)
        } else if s.eq_ignore_ascii_case("http") {
            Ok(ProxyKind::Http)
        } else if s.eq_ignore_ascii_case("socks5") {
            Ok(ProxyKind::Socks5)
        } else {
            Err(Error::config(format!("unrecognized proxy kind: {}", s)))
        }
    }
}

/// The shared client every fetch goes through.
///
/// Injects `Referer` and `User-Agent` from the policy tables on each
/// outgoing request and applies the process-wide proxy. Redirects are never
/// followed here; the session interprets them.
pub struct HttpClient {
    /// Rebuilt when the proxy changes; reqwest clients are cheap to clone
    client: RwLock<Client>,
    policies: Arc<PolicyTables>,
}

impl HttpClient {
    /// Create a client with a direct connection
    pub fn new(policies: Arc<PolicyTables>) -> Result<Self> {
        Ok(Self {
            client: RwLock::new(build_client(None)?),
            policies,
        })
    }

    /// Set the process-wide proxy for subsequent requests.
    ///
    /// Proxying is a builder-time setting in the underlying client, so this
    /// swaps in a freshly built one. In-flight requests keep the client they
    /// started with.
    pub fn set_proxy(&self, kind: ProxyKind, host: &str, port: u16) -> Result<()> {
        let proxy_url = match kind {
            ProxyKind::None => None,
            ProxyKind::Http => Some(format!("http://{}:{}", host, port)),
            ProxyKind::Socks5 => Some(format!("socks5://{}:{}", host, port)),
        };
        let client = build_client(proxy_url.as_deref())?;
        *self.client.write() = client;
        tracing::info!(?kind, host, port, "proxy configured");
        Ok(())
    }

    /// Access the policy tables this client consults
    pub fn policies(&self) -> &Arc<PolicyTables> {
        &self.policies
    }
}

fn build_client(proxy_url: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().redirect(Policy::none());
    if let Some(url) = proxy_url {
        builder = builder.proxy(
            reqwest::Proxy::all(url).map_err(|e| Error::config(format!("invalid proxy: {}", e)))?,
        );
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))
}

#[async_trait]
impl Transport for HttpClient {
    async fn issue(&self, request: &Request) -> Result<Response> {
        let client = self.client.read().clone();

        let mut builder = if let Some(body) = &request.body {
            client
                .post(request.url.clone())
                .header(headers::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.clone())
        } else {
            client.get(request.url.clone())
        };

        // Explicit referer wins over the table entry for the host
        let referer = request
            .referer
            .clone()
            .or_else(|| request.host().and_then(|h| self.policies.referer_for(h)));
        if let Some(value) = referer.as_deref().and_then(|v| HeaderValue::try_from(v).ok()) {
            builder = builder.header(headers::REFERER, value);
        }

        let user_agent = self.policies.user_agent_for(&request.url);
        builder = builder.header(headers::USER_AGENT, user_agent);

        tracing::debug!(
            method = if request.is_post() { "POST" } else { "GET" },
            url = %request.url,
            "issuing request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(Response::new(status, resp_headers, body, request.url.clone()))
    }
}
