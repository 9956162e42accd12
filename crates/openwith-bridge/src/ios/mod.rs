// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS viewer bridge via objc2.
//
// Requires compilation with the iOS SDK (Xcode). A viewer session is a
// `UIDocumentInteractionController` presented from the root view
// controller; its delegate reports send and dismissal back to the caller.
//
// This module is cfg-gated to `target_os = "ios"`. All UIKit interactions
// require the main thread; `present` returns `NativeFailure` when called
// off-main.
//
// Unsafe code here is limited to Objective-C message sends
// (`msg_send!`, `define_class!`). Selector correctness follows Apple's SDK
// headers; main-thread requirements are enforced with `MainThreadMarker`.

#![cfg(target_os = "ios")]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, NSObject};
use objc2::{DefinedClass, MainThreadMarker, define_class, msg_send};
use objc2_core_foundation::{CGPoint, CGRect, CGSize};
use objc2_foundation::{NSString, NSURL};
use objc2_ui_kit::{UIApplication, UIDocumentInteractionControllerDelegate, UIViewController};
use uuid::Uuid;

use openwith_core::BridgeConfig;
use openwith_core::error::{Result, ViewerError};
use openwith_core::types::{OpenRequest, PathKind, ResolvedRequest};

use crate::traits::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assert that we are on the main thread and return the marker.
fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| ViewerError::NativeFailure("must be called from the main thread".into()))
}

/// Obtain the root `UIViewController` from the key window.
fn root_view_controller(mtm: MainThreadMarker) -> Result<Retained<UIViewController>> {
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: keyWindow and rootViewController are well-known UIKit
    // selectors; the marker guarantees main-thread execution.
    let root: Option<Retained<UIViewController>> = unsafe {
        let window: Option<Retained<AnyObject>> = msg_send![&app, keyWindow];
        window.and_then(|w| msg_send![&w, rootViewController])
    };

    root.ok_or_else(|| ViewerError::NativeFailure("no root view controller available".into()))
}

/// `NSURL` for the request path. Filesystem paths must exist.
fn file_url(request: &ResolvedRequest) -> Result<Retained<NSURL>> {
    match request.path_kind {
        PathKind::Absolute => {
            if !Path::new(&request.path).exists() {
                return Err(ViewerError::InvalidPath(format!(
                    "{} does not exist",
                    request.path
                )));
            }
            Ok(NSURL::fileURLWithPath(&NSString::from_str(&request.path)))
        }
        PathKind::FileUri | PathKind::ContentUri | PathKind::Other => {
            NSURL::URLWithString(&NSString::from_str(&request.path)).ok_or_else(|| {
                ViewerError::InvalidPath(format!("{} is not a valid URL", request.path))
            })
        }
    }
}

fn zero_rect() -> CGRect {
    CGRect::new(CGPoint::new(0.0, 0.0), CGSize::new(0.0, 0.0))
}

// ---------------------------------------------------------------------------
// Live sessions
// ---------------------------------------------------------------------------
// UIDocumentInteractionController does not retain its delegate, and nothing
// else holds the controller once `present` returns. Both stay in LIVE until
// the session ends, then in RETIRED until the next `present`: the objects
// are still on the call stack when the dismissal callback runs.
// Only touched on the main thread.

struct LiveSession {
    _controller: Retained<AnyObject>,
    _delegate: Retained<ViewerDelegate>,
    /// Lets `present` spot sessions nobody awaits any more.
    events: SessionEvents,
}

/// Retire sessions whose caller stopped listening without UIKit ever
/// reporting dismissal.
fn prune_abandoned() {
    let abandoned: Vec<LiveSession> = LIVE.with(|live| {
        let mut live = live.borrow_mut();
        let stale: Vec<Uuid> = live
            .iter()
            .filter(|(_, s)| s.events.is_closed())
            .map(|(id, _)| *id)
            .collect();
        stale.iter().filter_map(|id| live.remove(id)).collect()
    });
    if !abandoned.is_empty() {
        tracing::debug!(count = abandoned.len(), "iOS: releasing abandoned viewer sessions");
        RETIRED.with(|retired| retired.borrow_mut().extend(abandoned));
    }
}

thread_local! {
    static LIVE: RefCell<HashMap<Uuid, LiveSession>> = RefCell::new(HashMap::new());
    static RETIRED: RefCell<Vec<LiveSession>> = const { RefCell::new(Vec::new()) };
}

// ---------------------------------------------------------------------------
// Interaction delegate (UIDocumentInteractionControllerDelegate)
// ---------------------------------------------------------------------------

struct ViewerDelegateIvars {
    session: Uuid,
    /// Taken on dismissal so the session ends exactly once.
    events: RefCell<Option<SessionEvents>>,
    /// Presents the preview.
    presenter: Retained<UIViewController>,
}

// SAFETY: define_class! #[unsafe(super(NSObject))] declares ViewerDelegate as
// an ObjC class inheriting from NSObject. MainThreadOnly matches UIKit's
// delivery of delegate callbacks.
define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "OpenwithViewerDelegate"]
    #[ivars = ViewerDelegateIvars]
    struct ViewerDelegate;

    unsafe impl UIDocumentInteractionControllerDelegate for ViewerDelegate {
        #[unsafe(method(documentInteractionControllerViewControllerForPreview:))]
        fn preview_controller(&self, _controller: &AnyObject) -> Retained<UIViewController> {
            self.ivars().presenter.clone()
        }

        #[unsafe(method(documentInteractionControllerDidEndPreview:))]
        fn did_end_preview(&self, _controller: &AnyObject) {
            self.finish();
        }

        #[unsafe(method(documentInteractionControllerDidDismissOptionsMenu:))]
        fn did_dismiss_options_menu(&self, _controller: &AnyObject) {
            self.finish();
        }

        #[unsafe(method(documentInteractionControllerDidDismissOpenInMenu:))]
        fn did_dismiss_open_in_menu(&self, _controller: &AnyObject) {
            self.finish();
        }

        #[unsafe(method(documentInteractionController:willBeginSendingToApplication:))]
        fn will_begin_sending(&self, _controller: &AnyObject, application: Option<&NSString>) {
            tracing::info!(
                session = %self.ivars().session,
                target = ?application.map(|a| a.to_string()),
                "iOS: file handed to another app"
            );
            if let Some(events) = self.ivars().events.borrow().as_ref() {
                events.send_triggered();
            }
        }
    }
}

impl ViewerDelegate {
    fn new(
        mtm: MainThreadMarker,
        events: SessionEvents,
        presenter: Retained<UIViewController>,
    ) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(ViewerDelegateIvars {
            session: events.session(),
            events: RefCell::new(Some(events)),
            presenter,
        });
        // SAFETY: standard NSObject init via super on a freshly allocated
        // object.
        unsafe { msg_send![super(this), init] }
    }

    /// Report dismissal once and release the session's UIKit objects.
    fn finish(&self) {
        let session = self.ivars().session;
        if let Some(events) = self.ivars().events.borrow_mut().take() {
            tracing::info!(session = %session, "iOS: viewer dismissed");
            events.dismissed();
        }
        if let Some(done) = LIVE.with(|live| live.borrow_mut().remove(&session)) {
            RETIRED.with(|retired| retired.borrow_mut().push(done));
        }
    }
}

// ---------------------------------------------------------------------------
// IosBridge
// ---------------------------------------------------------------------------

/// Concrete iOS viewer bridge. Must be driven from the main thread.
pub struct IosBridge {
    config: BridgeConfig,
}

impl IosBridge {
    /// Create a new iOS bridge instance.
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl NativeViewer for IosBridge {
    fn platform_name(&self) -> &str {
        "iOS"
    }

    fn resolve(&self, request: &OpenRequest) -> ResolvedRequest {
        request.resolve(&self.config)
    }

    /// Present the file in a `UIDocumentInteractionController`.
    ///
    /// Presentation per resolved flags:
    /// - `show_open_with_dialog`: the "Open in" menu, listing apps only.
    /// - otherwise `show_apps_suggestions` or `show_send_button`: the options
    ///   menu, whose share targets report a send through the delegate.
    /// - otherwise: a Quick Look preview.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` when a filesystem path does not exist.
    /// - `NoViewerAvailable` when UIKit refuses every presentation.
    /// - `NativeFailure` off the main thread or without a root view controller.
    fn present(&self, request: &OpenRequest, events: SessionEvents) -> Result<()> {
        let mtm = require_main_thread()?;
        RETIRED.with(|retired| retired.borrow_mut().clear());
        prune_abandoned();
        let resolved = self.resolve(request);
        let url = file_url(&resolved)?;
        let root_vc = root_view_controller(mtm)?;

        tracing::info!(
            path = %resolved.path,
            session = %events.session(),
            "iOS: presenting UIDocumentInteractionController"
        );

        // SAFETY: class method documented by UIKit; returns an autoreleased
        // controller which Retained keeps alive.
        let controller: Retained<AnyObject> = unsafe {
            msg_send![
                objc2::class!(UIDocumentInteractionController),
                interactionControllerWithURL: &*url
            ]
        };

        let session = events.session();
        let delegate = ViewerDelegate::new(mtm, events.clone(), root_vc.clone());
        let name = NSString::from_str(resolved.title());

        // SAFETY: name and delegate are UIDocumentInteractionController
        // properties; ViewerDelegate is an NSObject subclass conforming to
        // the delegate protocol.
        unsafe {
            let _: () = msg_send![&controller, setName: &*name];
            let _: () = msg_send![&controller, setDelegate: &*delegate];
        }

        // SAFETY: presentation selectors on the main thread; the view comes
        // from the root view controller.
        let shown: bool = unsafe {
            let view: Retained<AnyObject> = msg_send![&root_vc, view];
            if resolved.show_open_with_dialog {
                msg_send![
                    &controller,
                    presentOpenInMenuFromRect: zero_rect(),
                    inView: &*view,
                    animated: true
                ]
            } else if resolved.show_apps_suggestions || resolved.show_send_button {
                msg_send![
                    &controller,
                    presentOptionsMenuFromRect: zero_rect(),
                    inView: &*view,
                    animated: true
                ]
            } else {
                let previewed: bool = msg_send![&controller, presentPreviewAnimated: true];
                previewed
            }
        };

        if !shown {
            return Err(ViewerError::NoViewerAvailable(format!(
                "UIKit has no viewer for {}",
                resolved.file_name()
            )));
        }

        LIVE.with(|live| {
            live.borrow_mut().insert(
                session,
                LiveSession {
                    _controller: controller,
                    _delegate: delegate,
                    events: events.clone(),
                },
            )
        });
        events.presented();
        Ok(())
    }
}
