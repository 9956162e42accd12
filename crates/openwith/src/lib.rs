// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Openwith — open a file in the host platform's native viewer.
//
// `open` hands the file to the platform (Quick Look / document interaction
// on iOS, an ACTION_VIEW intent on Android) and completes once the viewer
// is dismissed. `FileViewer` does the same against an injected native
// layer.

pub mod gateway;

use std::sync::OnceLock;

pub use gateway::FileViewer;
pub use openwith_bridge::{NativeViewer, SessionEvents, platform_bridge};
pub use openwith_core::error::{ErrorKind, Result, ViewerError};
pub use openwith_core::human_errors::{HumanError, Severity, humanize_error};
pub use openwith_core::types::{Listener, OpenArg, OpenOptions, OpenRequest, SessionEvent};
pub use openwith_core::{BridgeConfig, config::FlagDefaults};

static DEFAULT_VIEWER: OnceLock<FileViewer> = OnceLock::new();

/// Open `path` with the platform viewer for this build target.
///
/// `options` may be omitted (`()`), a display name (`"Report"`), or a full
/// [`OpenOptions`]. Resolves once the viewer has been dismissed.
pub async fn open(path: impl Into<String>, options: impl Into<OpenArg>) -> Result<()> {
    DEFAULT_VIEWER
        .get_or_init(|| FileViewer::for_platform(BridgeConfig::default()))
        .open(path, options)
        .await
}
