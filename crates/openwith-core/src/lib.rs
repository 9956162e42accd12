// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Openwith — Core request types, configuration and error definitions shared
// by the gateway and the native bridges.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod mime;
pub mod types;

pub use config::BridgeConfig;
pub use error::{ErrorKind, ViewerError};
pub use types::*;
