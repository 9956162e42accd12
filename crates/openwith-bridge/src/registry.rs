// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request-code bookkeeping for platforms that report viewer results through
// host callbacks (Android's `onActivityResult`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use openwith_core::error::ViewerError;

use crate::traits::SessionEvents;

/// Open viewer sessions keyed by the request code handed to the platform.
#[derive(Debug)]
pub struct SessionRegistry {
    base: i32,
    span: i32,
    next: AtomicI32,
    sessions: Mutex<HashMap<i32, SessionEvents>>,
}

impl SessionRegistry {
    /// Codes are allocated from `base..base + span`, wrapping.
    pub fn new(base: i32, span: i32) -> Self {
        Self {
            base,
            span: span.max(1),
            next: AtomicI32::new(0),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i32, SessionEvents>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Track `events` under a fresh request code and return the code.
    ///
    /// Sessions whose caller stopped listening are dropped first. A live
    /// session still holding the code is failed.
    pub fn register(&self, events: SessionEvents) -> i32 {
        let code = self.base + self.next.fetch_add(1, Ordering::Relaxed).rem_euclid(self.span);
        let mut sessions = self.lock();
        sessions.retain(|_, open| !open.is_closed());
        if let Some(stale) = sessions.insert(code, events) {
            tracing::warn!(request_code = code, session = %stale.session(), "request code reused; dropping stale session");
            stale.failed(ViewerError::NativeFailure(
                "viewer session superseded before it was dismissed".into(),
            ));
        }
        code
    }

    /// Stop tracking `code` without reporting anything.
    pub fn forget(&self, code: i32) -> Option<SessionEvents> {
        self.lock().remove(&code)
    }

    /// Report dismissal for `code` and stop tracking it.
    ///
    /// Returns `false` if `code` does not belong to an open session.
    pub fn dismissed(&self, code: i32) -> bool {
        match self.forget(code) {
            Some(events) => {
                tracing::info!(request_code = code, session = %events.session(), "viewer dismissed");
                events.dismissed();
                true
            }
            None => false,
        }
    }

    /// Report a send for `code`; the session stays open.
    ///
    /// Returns `false` if `code` does not belong to an open session.
    pub fn send_triggered(&self, code: i32) -> bool {
        match self.lock().get(&code) {
            Some(events) => {
                events.send_triggered();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
