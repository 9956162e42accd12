// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request and option types passed between the gateway and native bridges.

use serde::{Deserialize, Serialize};

use crate::config::BridgeConfig;
use crate::error::ViewerError;

/// One-shot zero-argument listener registered for a single `open` call.
pub type Listener = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// Caller-facing options
// ---------------------------------------------------------------------------

/// Full options record for an `open` call.
///
/// Every flag left as `None` is decided by the native layer.
#[derive(Default)]
pub struct OpenOptions {
    /// Name shown in the viewer UI instead of the file name.
    pub display_name: Option<String>,
    /// Suggest installable apps when nothing can open the file.
    pub show_apps_suggestions: Option<bool>,
    /// Force the app chooser instead of the default viewer.
    pub show_open_with_dialog: Option<bool>,
    /// Offer a send/share action next to the viewer.
    pub show_send_button: Option<bool>,
    /// Runs if the user triggers the send action.
    pub on_send: Option<Listener>,
    /// Runs when the viewer closes, after any send.
    pub on_dismiss: Option<Listener>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn show_apps_suggestions(mut self, show: bool) -> Self {
        self.show_apps_suggestions = Some(show);
        self
    }

    pub fn show_open_with_dialog(mut self, show: bool) -> Self {
        self.show_open_with_dialog = Some(show);
        self
    }

    pub fn show_send_button(mut self, show: bool) -> Self {
        self.show_send_button = Some(show);
        self
    }

    pub fn on_send(mut self, listener: impl FnOnce() + Send + 'static) -> Self {
        self.on_send = Some(Box::new(listener));
        self
    }

    pub fn on_dismiss(mut self, listener: impl FnOnce() + Send + 'static) -> Self {
        self.on_dismiss = Some(Box::new(listener));
        self
    }
}

impl std::fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenOptions")
            .field("display_name", &self.display_name)
            .field("show_apps_suggestions", &self.show_apps_suggestions)
            .field("show_open_with_dialog", &self.show_open_with_dialog)
            .field("show_send_button", &self.show_send_button)
            .field("on_send", &self.on_send.is_some())
            .field("on_dismiss", &self.on_dismiss.is_some())
            .finish()
    }
}

/// The shapes an `open` caller may pass as options.
///
/// A bare string is shorthand for a display name.
#[derive(Debug, Default)]
pub enum OpenArg {
    #[default]
    Omitted,
    DisplayNameShorthand(String),
    FullOptions(OpenOptions),
}

impl OpenArg {
    /// Collapse every shape into a single options record.
    pub fn normalize(self) -> OpenOptions {
        match self {
            OpenArg::Omitted => OpenOptions::default(),
            OpenArg::DisplayNameShorthand(name) => OpenOptions::new().display_name(name),
            OpenArg::FullOptions(options) => options,
        }
    }
}

impl From<()> for OpenArg {
    fn from(_: ()) -> Self {
        OpenArg::Omitted
    }
}

impl From<&str> for OpenArg {
    fn from(name: &str) -> Self {
        OpenArg::DisplayNameShorthand(name.to_owned())
    }
}

impl From<String> for OpenArg {
    fn from(name: String) -> Self {
        OpenArg::DisplayNameShorthand(name)
    }
}

impl From<OpenOptions> for OpenArg {
    fn from(options: OpenOptions) -> Self {
        OpenArg::FullOptions(options)
    }
}

impl<T: Into<OpenArg>> From<Option<T>> for OpenArg {
    fn from(arg: Option<T>) -> Self {
        arg.map(Into::into).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Native-facing request
// ---------------------------------------------------------------------------

/// What the native layer receives for one `open` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub path: String,
    pub display_name: Option<String>,
    pub show_apps_suggestions: Option<bool>,
    pub show_open_with_dialog: Option<bool>,
    pub show_send_button: Option<bool>,
}

impl OpenRequest {
    /// Build the request from a path and normalized options.
    ///
    /// The listeners stay with the caller; only data crosses into the
    /// native layer.
    pub fn new(path: impl Into<String>, options: &OpenOptions) -> Self {
        Self {
            path: path.into(),
            display_name: options.display_name.clone(),
            show_apps_suggestions: options.show_apps_suggestions,
            show_open_with_dialog: options.show_open_with_dialog,
            show_send_button: options.show_send_button,
        }
    }

    /// Fill unset flags from the bridge defaults.
    pub fn resolve(&self, config: &BridgeConfig) -> ResolvedRequest {
        ResolvedRequest {
            path: self.path.clone(),
            path_kind: PathKind::classify(&self.path),
            display_name: self.display_name.clone(),
            show_apps_suggestions: self
                .show_apps_suggestions
                .unwrap_or(config.defaults.show_apps_suggestions),
            show_open_with_dialog: self
                .show_open_with_dialog
                .unwrap_or(config.defaults.show_open_with_dialog),
            show_send_button: self
                .show_send_button
                .unwrap_or(config.defaults.show_send_button),
        }
    }
}

/// An [`OpenRequest`] with concrete flag values, as native code consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub path: String,
    pub path_kind: PathKind,
    pub display_name: Option<String>,
    pub show_apps_suggestions: bool,
    pub show_open_with_dialog: bool,
    pub show_send_button: bool,
}

impl ResolvedRequest {
    /// Last path segment, used when no display name was given. Paths
    /// ending in `/` yield the whole path.
    pub fn file_name(&self) -> &str {
        let trimmed = strip_uri_suffix(&self.path);
        match trimmed.rsplit('/').next() {
            Some(last) if !last.is_empty() => last,
            _ => trimmed,
        }
    }

    /// Display name if set, otherwise the file name.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.file_name())
    }
}

/// Rough shape of the path string; bridges pick a native representation
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    /// `/storage/emulated/0/a.pdf`
    Absolute,
    /// `file:///tmp/a.pdf`
    FileUri,
    /// `content://com.example.provider/a.pdf`
    ContentUri,
    Other,
}

impl PathKind {
    pub fn classify(path: &str) -> Self {
        if path.starts_with("file://") {
            PathKind::FileUri
        } else if path.starts_with("content://") {
            PathKind::ContentUri
        } else if path.starts_with('/') {
            PathKind::Absolute
        } else {
            PathKind::Other
        }
    }
}

/// Drop `?query` and `#fragment` from URI-shaped paths.
pub(crate) fn strip_uri_suffix(path: &str) -> &str {
    if !path.contains("://") {
        return path;
    }
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// Event reported by a native layer during one viewer session.
#[derive(Debug)]
pub enum SessionEvent {
    /// The viewer UI is on screen.
    Presented,
    /// The user triggered the send action.
    SendTriggered,
    /// The viewer UI closed. Ends the session successfully.
    Dismissed,
    /// The native layer gave up. Ends the session with this error.
    Failed(ViewerError),
}
