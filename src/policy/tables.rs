// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Host-keyed policy tables
//!
//! Insert-only tables: plugins register overrides, nothing ever deletes
//! them. Concurrent maps because table reads happen on whatever runtime
//! thread carries the in-flight request.

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use super::user_agent::derive_user_agent;

/// Per-host request policy: referer overrides, user-agent overrides and the
/// unseekable-host hint set consumed by playback.
#[derive(Debug, Default)]
pub struct PolicyTables {
    /// Explicit Referer header to send for a host
    referer_by_host: DashMap<String, String>,
    /// Cached or overridden user agent per host
    user_agent_by_host: DashMap<String, String>,
    /// Hosts whose streams must be treated as non-seekable
    unseekable_hosts: DashSet<String>,
}

impl PolicyTables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a referer override for a host. Last write wins.
    pub fn set_referer(&self, host: impl Into<String>, referer: impl Into<String>) {
        self.referer_by_host.insert(host.into(), referer.into());
    }

    /// Look up the referer override for a host
    pub fn referer_for(&self, host: &str) -> Option<String> {
        self.referer_by_host.get(host).map(|v| v.value().clone())
    }

    /// Register a user-agent override for a host. Last write wins.
    pub fn set_user_agent(&self, host: impl Into<String>, user_agent: impl Into<String>) {
        self.user_agent_by_host.insert(host.into(), user_agent.into());
    }

    /// Look up the user-agent override (or cached derivation) for a host
    pub fn user_agent_override(&self, host: &str) -> Option<String> {
        self.user_agent_by_host.get(host).map(|v| v.value().clone())
    }

    /// Mark a host's streams as non-seekable. Idempotent.
    pub fn force_unseekable(&self, host: impl Into<String>) {
        self.unseekable_hosts.insert(host.into());
    }

    /// Check whether a host was marked non-seekable
    pub fn is_unseekable(&self, host: &str) -> bool {
        self.unseekable_hosts.contains(host)
    }

    /// Resolve the user agent for a request URL.
    ///
    /// Override first, then the derivation rules; the derived value is
    /// cached so every later request to the host resolves from the table.
    /// URLs without a host get the default UA.
    pub fn user_agent_for(&self, url: &Url) -> String {
        let Some(host) = url.host_str() else {
            return derive_user_agent("").to_string();
        };
        if let Some(ua) = self.user_agent_override(host) {
            return ua;
        }
        let derived = derive_user_agent(host).to_string();
        self.user_agent_by_host
            .insert(host.to_string(), derived.clone());
        derived
    }

    /// Seed the tables from a snapshot of the host application's persisted
    /// configuration. Entries overwrite, set membership unions.
    pub fn load_snapshot(&self, snapshot: &PolicySnapshot) {
        for (host, referer) in &snapshot.referers {
            self.set_referer(host.clone(), referer.clone());
        }
        for (host, ua) in &snapshot.user_agents {
            self.set_user_agent(host.clone(), ua.clone());
        }
        for host in &snapshot.unseekable {
            self.force_unseekable(host.clone());
        }
    }

    /// Export the current tables for the host application to persist
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            referers: self
                .referer_by_host
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            user_agents: self
                .user_agent_by_host
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            unseekable: self.unseekable_hosts.iter().map(|e| e.key().clone()).collect(),
        }
    }
}

/// Serializable policy state, exchanged with the host application's
/// configuration layer. Loading and saving the file is the host's job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub referers: HashMap<String, String>,
    #[serde(default)]
    pub user_agents: HashMap<String, String>,
    #[serde(default)]
    pub unseekable: Vec<String>,
}

impl PolicySnapshot {
    /// Export to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Create from JSON
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}
