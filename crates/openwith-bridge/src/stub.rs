// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no native viewer is wired up.
//
// Every request fails with `PlatformUnsupported`; real implementations live
// in the `ios` and `android` modules.

use openwith_core::error::{Result, ViewerError};
use openwith_core::types::OpenRequest;

use crate::traits::*;

/// Bridge returned on platforms without a native viewer.
pub struct StubBridge;

impl NativeViewer for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn present(&self, request: &OpenRequest, events: SessionEvents) -> Result<()> {
        tracing::warn!(
            path = %request.path,
            session = %events.session(),
            "NativeViewer::present called on stub bridge"
        );
        Err(ViewerError::PlatformUnsupported)
    }
}
