// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! User-agent derivation rules

use std::collections::HashSet;

use lazy_static::lazy_static;

/// Default user agent string, sent when no host rule applies
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0.1 Safari/605.1.15";

/// User agent sent to mobile-only media hosts
pub const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 12_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1";

lazy_static! {
    /// Leading host labels that mark a mobile variant of a site
    static ref MOBILE_LABELS: HashSet<&'static str> = ["m", "mobile", "wap"].iter().copied().collect();
}

/// Derive the user agent for a host with no explicit override.
///
/// Mobile site variants get the mobile UA so media hosts serve direct
/// streams instead of app interstitials; everything else gets the default.
pub fn derive_user_agent(host: &str) -> &'static str {
    match host.split('.').next() {
        Some(label) if MOBILE_LABELS.contains(label) => MOBILE_USER_AGENT,
        _ => DEFAULT_USER_AGENT,
    }
}
