// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language messages for viewer failures.
//
// The gateway never shows anything itself; apps that want to tell the user
// why a file did not open can run the error through `humanize_error`.

use crate::error::ViewerError;

/// How the user can respond to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may work.
    Transient,
    /// The user must do something first (install an app, pick another file).
    ActionRequired,
    /// Nothing the user can do on this device.
    Permanent,
}

/// A failure described for an end user.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short heading.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Describe `err` in plain language.
pub fn humanize_error(err: &ViewerError) -> HumanError {
    match err {
        ViewerError::InvalidPath(detail) => HumanError {
            message: "This file can't be found.".into(),
            suggestion: format!(
                "It may have been moved or deleted. Try choosing it again. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        ViewerError::NoViewerAvailable(_) => HumanError {
            message: "No app on this device can open this file.".into(),
            suggestion: "Install an app that supports this kind of file, then try again.".into(),
            severity: Severity::ActionRequired,
        },

        ViewerError::PlatformUnsupported => HumanError {
            message: "Opening files isn't supported here.".into(),
            suggestion: "Open the file from your phone or tablet instead.".into(),
            severity: Severity::Permanent,
        },

        ViewerError::NativeFailure(detail) => humanize_native_detail(detail),

        ViewerError::Config(_) => HumanError {
            message: "The app's viewer settings are damaged.".into(),
            suggestion: "Reinstalling the app should restore them.".into(),
            severity: Severity::Permanent,
        },
    }
}

fn humanize_native_detail(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("permission") || lower.contains("securityexception") {
        HumanError {
            message: "This app isn't allowed to open that file.".into(),
            suggestion: "Check the app's storage permission in Settings, then try again.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("main thread") || lower.contains("view controller") {
        HumanError {
            message: "The viewer couldn't be shown right now.".into(),
            suggestion: "Wait a moment and try again.".into(),
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "The file couldn't be opened.".into(),
            suggestion: format!("Try again. If this keeps happening, restart the app. (Detail: {detail})"),
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_viewer_needs_action() {
        let human = humanize_error(&ViewerError::NoViewerAvailable("no activity for .dwg".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn unsupported_platform_is_permanent() {
        let human = humanize_error(&ViewerError::PlatformUnsupported);
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn permission_denied_needs_action() {
        let err = ViewerError::NativeFailure(
            "startActivityForResult: java.lang.SecurityException: Permission Denial".into(),
        );
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn unknown_native_detail_is_transient_and_kept() {
        let human = humanize_error(&ViewerError::NativeFailure("binder died".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.suggestion.contains("binder died"));
    }
}
