// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Single-flight fetch orchestration
//!
//! One session, one slot: at most one outstanding fetch, redirects followed
//! transparently, exactly one terminal delivery per accepted start.

mod fetch;
mod ui;

pub use fetch::{
    Busy, CallbackFuture, FetchCallback, FetchRequest, FetchSession, DEFAULT_TIMEOUT,
    MAX_REDIRECT_HOPS,
};
pub use ui::{LogDelegate, UiDelegate};
