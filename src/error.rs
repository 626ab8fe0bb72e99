// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the Mustekala fetch bridge
//!
//! The taxonomy mirrors the bridge's delivery contract: `Busy` and
//! `InvalidArguments` are synchronous rejections, `Transport` is a terminal
//! mid-flight failure reported out-of-band, `Callback` is a plugin failure
//! after successful delivery.

use thiserror::Error;

/// Result type alias for Mustekala operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the fetch bridge
#[derive(Error, Debug)]
pub enum Error {
    /// A fetch was requested while another one is in flight
    #[error("another fetch is already in flight")]
    Busy,

    /// Malformed entry-point call
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Network/timeout/abort failure surfaced mid-flight
    #[error("transport error{}: {message}", fmt_status(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The plugin callback itself signaled failure after delivery
    #[error("callback error: {0}")]
    Callback(String),

    /// Invalid proxy kind or unbuildable client
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" ({})", s),
        None => String::new(),
    }
}

impl Error {
    /// Create an invalid-arguments error
    pub fn invalid_args<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArguments(msg.into())
    }

    /// Create a transport error without a status code
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::Transport {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a transport error carrying the HTTP status
    pub fn transport_with_status<S: Into<String>>(status: u16, msg: S) -> Self {
        Error::Transport {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a callback error
    pub fn callback<S: Into<String>>(msg: S) -> Self {
        Error::Callback(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is the single-flight rejection
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy)
    }

    /// Check if this is a terminal transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Http(_))
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
