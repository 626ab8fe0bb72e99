// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The entry points resolver plugins call
//!
//! Validates argument shapes before delegating, so the session and the
//! policy tables only ever see well-formed input. Malformed arguments fail
//! with `InvalidArguments`; a taken fetch slot fails with `Busy`.

use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::http::{HttpClient, ProxyKind};
use crate::policy::PolicyTables;
use crate::session::{FetchRequest, FetchSession, UiDelegate};

/// Plugin-facing fetch bridge.
///
/// Owns the shared HTTP client, the policy tables and the single-flight
/// session; a host application creates one per process and exposes its
/// methods to plugin code.
pub struct ScriptBridge {
    client: Arc<HttpClient>,
    policies: Arc<PolicyTables>,
    session: FetchSession,
    ui: Arc<dyn UiDelegate>,
}

impl ScriptBridge {
    /// Create a bridge with a fresh client and empty policy tables
    pub fn new(ui: Arc<dyn UiDelegate>) -> Result<Self> {
        let policies = Arc::new(PolicyTables::new());
        let client = Arc::new(HttpClient::new(Arc::clone(&policies))?);
        let session = FetchSession::new(Arc::clone(&client) as _, Arc::clone(&ui));
        Ok(Self {
            client,
            policies,
            session,
            ui,
        })
    }

    /// Issue a GET fetch. The callback receives the body on success.
    pub fn fetch_get<F, Fut>(&self, url: &str, referer: Option<&str>, callback: F) -> Result<()>
    where
        F: FnOnce(Bytes) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        validate_url(url)?;
        let referer = validate_optional("referer", referer)?;
        let mut req = FetchRequest::get(url, callback).map_err(invalid_url)?;
        if let Some(referer) = referer {
            req = req.referer(referer);
        }
        self.session.start(req).map_err(Error::from)
    }

    /// Issue a POST fetch with a form-encoded body
    pub fn fetch_post<F, Fut>(
        &self,
        url: &str,
        body: &str,
        referer: Option<&str>,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce(Bytes) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        validate_url(url)?;
        if body.is_empty() {
            // an empty body would silently degrade to a GET
            return Err(Error::invalid_args("post body must not be empty"));
        }
        let referer = validate_optional("referer", referer)?;
        let mut req =
            FetchRequest::post(url, body.as_bytes().to_vec(), callback).map_err(invalid_url)?;
        if let Some(referer) = referer {
            req = req.referer(referer);
        }
        self.session.start(req).map_err(Error::from)
    }

    /// Register a referer override for a host
    pub fn bind_referer(&self, host: &str, referer: &str) -> Result<()> {
        validate_nonempty("host", host)?;
        validate_nonempty("referer", referer)?;
        self.policies.set_referer(host, referer);
        Ok(())
    }

    /// Mark a host's streams as non-seekable
    pub fn force_unseekable(&self, host: &str) -> Result<()> {
        validate_nonempty("host", host)?;
        self.policies.force_unseekable(host);
        Ok(())
    }

    /// Configure the process-wide proxy. Kind is one of `none`, `HTTP`,
    /// `SOCKS5` (case-insensitive).
    pub fn set_proxy(&self, kind: &str, host: &str, port: u16) -> Result<()> {
        let kind = ProxyKind::from_str(kind)?;
        if kind != ProxyKind::None {
            validate_nonempty("proxy host", host)?;
        }
        self.client.set_proxy(kind, host, port)
    }

    /// Show a warning through the host UI
    pub fn warn(&self, message: &str) {
        self.ui.report_warning("Warning", message);
    }

    /// Ask the user a yes/no question through the host UI
    pub fn question(&self, message: &str) -> bool {
        self.ui.ask_yes_no(message)
    }

    /// The published "final resolved target" side channel
    pub fn final_url(&self) -> String {
        self.session.final_url()
    }

    /// The single-flight session behind the entry points
    pub fn session(&self) -> &FetchSession {
        &self.session
    }

    /// The policy tables behind the entry points
    pub fn policies(&self) -> &Arc<PolicyTables> {
        &self.policies
    }
}

fn validate_url(url: &str) -> Result<()> {
    validate_nonempty("url", url)
}

fn validate_nonempty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_args(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn validate_optional<'a>(what: &str, value: Option<&'a str>) -> Result<Option<&'a str>> {
    match value {
        Some(v) => {
            validate_nonempty(what, v)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

/// A URL that fails to parse is a malformed argument, not a transport fault
fn invalid_url(err: Error) -> Error {
    match err {
        Error::Url(e) => Error::invalid_args(format!("unparseable url: {}", e)),
        other => other,
    }
}
