// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer gateway: turns one `open` call into a native viewer session and
// maps the session's events onto the caller's listeners and result.
//
// Per call: Idle -> Requested -> {Displayed -> (SendTriggered)? -> Dismissed}
// | Failed. Only `Requested` is entered here; every later state comes from
// the native layer through `SessionEvents`.

use std::sync::Arc;

use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use openwith_bridge::{NativeViewer, SessionEvents, platform_bridge};
use openwith_core::BridgeConfig;
use openwith_core::error::{Result, ViewerError};
use openwith_core::types::{OpenArg, OpenOptions, OpenRequest, SessionEvent};

/// Presents files through a native viewer layer.
///
/// Calls share nothing but the native layer itself, so any number of
/// `open` futures may be in flight at once.
#[derive(Clone)]
pub struct FileViewer {
    native: Arc<dyn NativeViewer>,
}

impl FileViewer {
    /// Gateway over an explicit native layer.
    pub fn new(native: Arc<dyn NativeViewer>) -> Self {
        Self { native }
    }

    /// Gateway over the bridge for the current build target.
    pub fn for_platform(config: BridgeConfig) -> Self {
        Self::new(platform_bridge(config))
    }

    pub fn platform_name(&self) -> &str {
        self.native.platform_name()
    }

    /// Open `path` in the native viewer and wait until it is dismissed.
    ///
    /// `on_send` runs at most once, only when the user sends the file and
    /// the send button was enabled, either by the caller or by the native
    /// layer's default. `on_dismiss` runs once, right before
    /// this returns `Ok(())`. On failure neither runs again and the native
    /// layer's error is returned unchanged.
    ///
    /// On iOS the future must be polled on the main thread.
    pub async fn open(&self, path: impl Into<String>, options: impl Into<OpenArg>) -> Result<()> {
        let path = path.into();
        let options = options.into().normalize();
        let session = Uuid::new_v4();
        let span = info_span!("open", %session, path = %path);

        self.run_session(path, options, session)
            .instrument(span)
            .await
            .inspect_err(|e| debug!(%session, kind = %e.kind(), error = %e, "open failed"))
    }

    async fn run_session(&self, path: String, mut options: OpenOptions, session: Uuid) -> Result<()> {
        if path.is_empty() {
            return Err(ViewerError::InvalidPath("path must not be empty".into()));
        }

        let request = OpenRequest::new(path, &options);
        // Same resolution the native UI applies, so a send-button default
        // from the bridge config counts.
        let send_enabled = self.native.resolve(&request).show_send_button;
        let (events, mut rx) = SessionEvents::channel(session);

        debug!(platform = self.native.platform_name(), ?request, "requested");
        self.native.present(&request, events)?;

        let mut sent = false;
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Presented => debug!("displayed"),

                SessionEvent::SendTriggered if !send_enabled => {
                    warn!("send reported without a send button; ignored");
                }
                SessionEvent::SendTriggered if sent => {
                    warn!("duplicate send reported; ignored");
                }
                SessionEvent::SendTriggered => {
                    sent = true;
                    debug!("send triggered");
                    if let Some(on_send) = options.on_send.take() {
                        on_send();
                    }
                }

                SessionEvent::Dismissed => {
                    debug!(sent, "dismissed");
                    if let Some(on_dismiss) = options.on_dismiss.take() {
                        on_dismiss();
                    }
                    return Ok(());
                }

                SessionEvent::Failed(err) => return Err(err),
            }
        }

        Err(ViewerError::NativeFailure(
            "native session ended without dismissal".into(),
        ))
    }
}

impl std::fmt::Debug for FileViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileViewer")
            .field("platform", &self.native.platform_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use openwith_core::ErrorKind;

    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    type Script = Box<dyn Fn(&OpenRequest, SessionEvents) -> Result<()> + Send + Sync>;

    /// Native layer double: records every request and plays a script.
    struct ScriptedViewer {
        requests: Mutex<Vec<OpenRequest>>,
        config: BridgeConfig,
        script: Script,
    }

    impl ScriptedViewer {
        fn new(
            script: impl Fn(&OpenRequest, SessionEvents) -> Result<()> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Self::with_config(BridgeConfig::default(), script)
        }

        fn with_config(
            config: BridgeConfig,
            script: impl Fn(&OpenRequest, SessionEvents) -> Result<()> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                config,
                script: Box::new(script),
            })
        }

        fn requests(&self) -> Vec<OpenRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl NativeViewer for ScriptedViewer {
        fn platform_name(&self) -> &str {
            "scripted"
        }

        fn present(&self, request: &OpenRequest, events: SessionEvents) -> Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            (self.script)(request, events)
        }

        fn resolve(&self, request: &OpenRequest) -> openwith_core::types::ResolvedRequest {
            request.resolve(&self.config)
        }
    }

    fn dismiss_immediately(_: &OpenRequest, events: SessionEvents) -> Result<()> {
        events.presented();
        events.dismissed();
        Ok(())
    }

    /// Listener log shared between callbacks and assertions.
    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<&'static str>>>);

    impl Log {
        fn push(&self, entry: &'static str) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    fn logged_options(log: &Log) -> OpenOptions {
        let (on_send, on_dismiss) = (log.clone(), log.clone());
        OpenOptions::new()
            .on_send(move || on_send.push("send"))
            .on_dismiss(move || on_dismiss.push("dismiss"))
    }

    #[tokio::test]
    async fn omitted_options_resolve_on_dismiss() {
        init_tracing();
        let native = ScriptedViewer::new(dismiss_immediately);
        let viewer = FileViewer::new(native.clone());

        viewer.open("/tmp/a.pdf", ()).await.unwrap();

        let requests = native.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/tmp/a.pdf");
        assert_eq!(requests[0].display_name, None);
        assert_eq!(requests[0].show_send_button, None);
    }

    #[tokio::test]
    async fn shorthand_and_full_options_reach_native_identically() {
        init_tracing();
        let native = ScriptedViewer::new(dismiss_immediately);
        let viewer = FileViewer::new(native.clone());

        viewer.open("/tmp/a.pdf", "Report").await.unwrap();
        viewer
            .open("/tmp/a.pdf", OpenOptions::new().display_name("Report"))
            .await
            .unwrap();

        let requests = native.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].display_name.as_deref(), Some("Report"));
    }

    #[tokio::test]
    async fn flags_pass_through_unchanged() {
        init_tracing();
        let native = ScriptedViewer::new(dismiss_immediately);
        let viewer = FileViewer::new(native.clone());

        let options = OpenOptions::new()
            .show_apps_suggestions(true)
            .show_open_with_dialog(false)
            .show_send_button(true);
        viewer.open("content://docs/q3.xlsx", options).await.unwrap();

        let request = &native.requests()[0];
        assert_eq!(request.show_apps_suggestions, Some(true));
        assert_eq!(request.show_open_with_dialog, Some(false));
        assert_eq!(request.show_send_button, Some(true));
    }

    #[tokio::test]
    async fn send_runs_once_and_dismiss_runs_last() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.presented();
            events.send_triggered();
            events.send_triggered();
            events.dismissed();
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        viewer
            .open("/tmp/a.pdf", logged_options(&log).show_send_button(true))
            .await
            .unwrap();

        assert_eq!(log.entries(), vec!["send", "dismiss"]);
    }

    #[tokio::test]
    async fn send_ignored_without_send_button() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.send_triggered();
            events.dismissed();
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        viewer.open("/tmp/a.pdf", logged_options(&log)).await.unwrap();

        assert_eq!(log.entries(), vec!["dismiss"]);
    }

    #[tokio::test]
    async fn send_button_enabled_by_bridge_default() {
        init_tracing();
        let config =
            BridgeConfig::from_json_str(r#"{"defaults": {"show_send_button": true}}"#).unwrap();
        let bridge_config = config.clone();
        let native = ScriptedViewer::with_config(config, move |request, events| {
            if request.resolve(&bridge_config).show_send_button {
                events.send_triggered();
            }
            events.dismissed();
            Ok(())
        });
        let viewer = FileViewer::new(native.clone());
        let log = Log::default();

        viewer.open("/tmp/a.pdf", logged_options(&log)).await.unwrap();

        assert_eq!(native.requests()[0].show_send_button, None);
        assert_eq!(log.entries(), vec!["send", "dismiss"]);
    }

    #[tokio::test]
    async fn explicit_false_overrides_bridge_send_default() {
        init_tracing();
        let config =
            BridgeConfig::from_json_str(r#"{"defaults": {"show_send_button": true}}"#).unwrap();
        let native = ScriptedViewer::with_config(config, |_, events| {
            events.send_triggered();
            events.dismissed();
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        viewer
            .open("/tmp/a.pdf", logged_options(&log).show_send_button(false))
            .await
            .unwrap();

        assert_eq!(log.entries(), vec!["dismiss"]);
    }

    #[tokio::test]
    async fn dismiss_runs_listener_exactly_once_before_resolving() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.dismissed();
            // Anything after settlement goes nowhere.
            events.dismissed();
            events.failed(ViewerError::NativeFailure("late".into()));
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let dismissals = Arc::new(AtomicUsize::new(0));
        let counter = dismissals.clone();

        viewer
            .open(
                "/tmp/a.pdf",
                OpenOptions::new().on_dismiss(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();

        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_viewer_failure_rejects_without_listeners() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.failed(ViewerError::from_native("NoViewerAvailable", "nothing opens .dwg"));
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        let err = viewer
            .open("/tmp/plan.dwg", logged_options(&log).show_send_button(true))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoViewerAvailable);
        assert_eq!(err.kind().as_str(), "NoViewerAvailable");
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn synchronous_native_refusal_is_relayed_unchanged() {
        init_tracing();
        let native = ScriptedViewer::new(|_, _| {
            Err(ViewerError::NativeFailure("must be called from the main thread".into()))
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        let err = viewer.open("/tmp/a.pdf", logged_options(&log)).await.unwrap_err();

        assert_eq!(err.to_string(), "native viewer failed: must be called from the main thread");
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn failure_after_send_skips_dismiss() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.send_triggered();
            events.failed(ViewerError::NativeFailure("share extension crashed".into()));
            events.dismissed();
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        let err = viewer
            .open("/tmp/a.pdf", logged_options(&log).show_send_button(true))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NativeFailure);
        assert_eq!(log.entries(), vec!["send"]);
    }

    #[tokio::test]
    async fn empty_path_never_reaches_native() {
        init_tracing();
        let native = ScriptedViewer::new(dismiss_immediately);
        let viewer = FileViewer::new(native.clone());

        let err = viewer.open("", "Report").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(native.requests().is_empty());
    }

    #[tokio::test]
    async fn abandoned_session_is_a_native_failure() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            events.presented();
            drop(events);
            Ok(())
        });
        let viewer = FileViewer::new(native);

        let err = viewer.open("/tmp/a.pdf", ()).await.unwrap_err();

        assert!(matches!(err, ViewerError::NativeFailure(ref m) if m.contains("without dismissal")));
    }

    #[tokio::test]
    async fn events_from_another_thread_settle_the_call() {
        init_tracing();
        let native = ScriptedViewer::new(|_, events| {
            std::thread::spawn(move || {
                events.presented();
                std::thread::sleep(Duration::from_millis(20));
                events.send_triggered();
                events.dismissed();
            });
            Ok(())
        });
        let viewer = FileViewer::new(native);
        let log = Log::default();

        viewer
            .open("/tmp/a.pdf", logged_options(&log).show_send_button(true))
            .await
            .unwrap();

        assert_eq!(log.entries(), vec!["send", "dismiss"]);
    }

    #[tokio::test]
    async fn concurrent_calls_settle_independently() {
        init_tracing();
        let native = ScriptedViewer::new(|request, events| {
            let fail = request.path.ends_with(".dwg");
            tokio::spawn(async move {
                events.presented();
                if fail {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    events.failed(ViewerError::NoViewerAvailable("nothing opens .dwg".into()));
                } else {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    events.dismissed();
                }
            });
            Ok(())
        });
        let viewer = FileViewer::new(native.clone());
        let dismissed_pdf = Log::default();
        let dismissed_dwg = Log::default();

        let (pdf, dwg) = tokio::join!(
            viewer.open("/tmp/a.pdf", logged_options(&dismissed_pdf)),
            viewer.open("/tmp/plan.dwg", logged_options(&dismissed_dwg)),
        );

        assert!(pdf.is_ok());
        assert_eq!(dwg.unwrap_err().kind(), ErrorKind::NoViewerAvailable);
        assert_eq!(dismissed_pdf.entries(), vec!["dismiss"]);
        assert!(dismissed_dwg.entries().is_empty());
        assert_eq!(native.requests().len(), 2);
    }
}
