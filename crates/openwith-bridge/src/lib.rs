// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Native file viewer bridges.
//!
//! Defines the capability the gateway needs from the host platform and
//! picks the implementation for the compilation target: UIKit on iOS, JNI
//! intents on Android, and a stub everywhere else.

use std::sync::Arc;

use openwith_core::BridgeConfig;

pub mod registry;
pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod stub;

pub use registry::SessionRegistry;
pub use traits::{NativeViewer, SessionEvents};

/// Returns the viewer bridge for the target operating system.
pub fn platform_bridge(config: BridgeConfig) -> Arc<dyn NativeViewer> {
    #[cfg(target_os = "ios")]
    {
        Arc::new(ios::IosBridge::new(config))
    }
    #[cfg(target_os = "android")]
    {
        Arc::new(android::AndroidBridge::new(config))
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        // Nothing to configure without a native viewer.
        let _ = config;
        Arc::new(stub::StubBridge)
    }
}
