// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Plugin-facing entry points
//!
//! The surface a host application binds into its scripting runtime.

mod bridge;

pub use bridge::ScriptBridge;
