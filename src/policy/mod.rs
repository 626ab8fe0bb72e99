// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-host request policy for the fetch bridge
//!
//! Hosts the referer/user-agent override tables and the unseekable-host set
//! that resolver plugins populate and the HTTP layer consults.

mod tables;
mod user_agent;

pub use tables::{PolicySnapshot, PolicyTables};
pub use user_agent::{derive_user_agent, DEFAULT_USER_AGENT, MOBILE_USER_AGENT};
