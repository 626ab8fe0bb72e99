// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Presentation-free UI capabilities the session invokes

/// What the session needs from the surrounding application's UI.
///
/// The host wires this to real dialogs; headless hosts and tests use
/// [`LogDelegate`] or a capturing stub.
pub trait UiDelegate: Send + Sync {
    /// Surface a warning to the user
    fn report_warning(&self, title: &str, message: &str);

    /// Ask the user a yes/no question
    fn ask_yes_no(&self, message: &str) -> bool;
}

/// Delegate that routes warnings to the log and declines every question
#[derive(Debug, Default)]
pub struct LogDelegate;

impl UiDelegate for LogDelegate {
    fn report_warning(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "warning");
    }

    fn ask_yes_no(&self, message: &str) -> bool {
        tracing::info!(message, "question declined (no UI attached)");
        false
    }
}
