// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Values a native bridge uses for flags the caller left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagDefaults {
    pub show_apps_suggestions: bool,
    pub show_open_with_dialog: bool,
    pub show_send_button: bool,
}

/// Settings shared by the native bridges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Defaults for unset request flags.
    pub defaults: FlagDefaults,
    /// Chooser title when the request carries no display name (Android).
    pub chooser_title: String,
    /// Appended to the package name to form the FileProvider authority (Android).
    pub file_provider_suffix: String,
    /// Store search URI prefix for app suggestions; the file extension is appended.
    pub store_search_prefix: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            defaults: FlagDefaults::default(),
            chooser_title: "Open with".into(),
            file_provider_suffix: ".fileprovider".into(),
            store_search_prefix: "market://search?q=".into(),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON override. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
