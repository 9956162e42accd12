// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capability the gateway drives, plus the handle native
// code uses to report what happened on screen.

use tokio::sync::mpsc;
use uuid::Uuid;

use openwith_core::BridgeConfig;
use openwith_core::error::{Result, ViewerError};
use openwith_core::types::{OpenRequest, ResolvedRequest, SessionEvent};

/// Presents a file in the host platform's viewer.
pub trait NativeViewer: Send + Sync {
    /// Human-readable platform name (e.g. "iOS", "Android").
    fn platform_name(&self) -> &str;

    /// Start a viewer session for `request`.
    ///
    /// `Ok(())` means the request was handed to the platform; the outcome
    /// arrives later through `events`. An `Err` fails the call immediately
    /// and no further events are expected.
    fn present(&self, request: &OpenRequest, events: SessionEvents) -> Result<()>;

    /// Concrete flag values this layer uses for `request`.
    ///
    /// Bridges holding a [`BridgeConfig`] override this so callers see the
    /// same defaults the native UI applies.
    fn resolve(&self, request: &OpenRequest) -> ResolvedRequest {
        request.resolve(&BridgeConfig::default())
    }
}

/// Sending half of one viewer session.
///
/// Cheap to clone and safe to move onto whatever thread the platform
/// delivers callbacks on. Events sent after the caller stopped listening
/// are dropped.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    session: Uuid,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionEvents {
    /// Create a session handle and the receiver the gateway listens on.
    pub fn channel(session: Uuid) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { session, tx }, rx)
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Whether the caller has stopped listening for this session.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn presented(&self) {
        self.emit(SessionEvent::Presented);
    }

    pub fn send_triggered(&self) {
        self.emit(SessionEvent::SendTriggered);
    }

    pub fn dismissed(&self) {
        self.emit(SessionEvent::Dismissed);
    }

    pub fn failed(&self, err: ViewerError) {
        self.emit(SessionEvent::Failed(err));
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            tracing::debug!(session = %self.session, ?event, "viewer session no longer awaited");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (events, mut rx) = SessionEvents::channel(Uuid::new_v4());
        events.presented();
        events.clone().send_triggered();
        events.dismissed();

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Presented)));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::SendTriggered)));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Dismissed)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emitting_after_receiver_dropped_is_harmless() {
        let (events, rx) = SessionEvents::channel(Uuid::new_v4());
        drop(rx);
        assert!(events.is_closed());
        events.failed(ViewerError::NoViewerAvailable("none".into()));
        events.dismissed();
    }

    #[test]
    fn open_while_receiver_alive() {
        let (events, _rx) = SessionEvents::channel(Uuid::new_v4());
        assert!(!events.is_closed());
    }

    #[test]
    fn default_resolve_uses_default_config() {
        struct Bare;
        impl NativeViewer for Bare {
            fn platform_name(&self) -> &str {
                "bare"
            }
            fn present(&self, _: &OpenRequest, _: SessionEvents) -> Result<()> {
                Ok(())
            }
        }

        let request = OpenRequest::new(
            "/tmp/a.pdf",
            &openwith_core::types::OpenOptions::new().show_apps_suggestions(true),
        );
        let resolved = Bare.resolve(&request);
        assert!(resolved.show_apps_suggestions);
        assert!(!resolved.show_send_button);
    }
}
