// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android viewer bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. A viewer session is an `ACTION_VIEW` intent
// launched with `startActivityForResult`.
//
// ## Architecture notes
//
// Android reports the end of a viewer session through the host Activity's
// `onActivityResult`. Each session gets its own request code; the host must
// forward results to [`on_activity_result`], which reports dismissal to the
// waiting caller. Android has no built-in send report: hosts that want
// `on_send` must register a chooser `IntentSender` callback and forward it to
// [`on_send_triggered`].

#![cfg(target_os = "android")]

use std::sync::{LazyLock, OnceLock};

use jni::{JNIEnv, JavaVM};
use jni::objects::{JObject, JString, JValue};

use openwith_core::BridgeConfig;
use openwith_core::error::{Result, ViewerError};
use openwith_core::mime;
use openwith_core::types::{OpenRequest, PathKind, ResolvedRequest};

use crate::registry::SessionRegistry;
use crate::traits::*;

// ---------------------------------------------------------------------------
// Session registry
// ---------------------------------------------------------------------------

/// First request code handed to `startActivityForResult`. Codes stay within
/// the lower 16 bits so `FragmentActivity` hosts accept them.
pub const REQUEST_OPEN_FILE_BASE: i32 = 0x4F00;

/// Number of distinct request codes before wrapping.
const REQUEST_CODE_SPAN: i32 = 0x100;

const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

static SESSIONS: LazyLock<SessionRegistry> =
    LazyLock::new(|| SessionRegistry::new(REQUEST_OPEN_FILE_BASE, REQUEST_CODE_SPAN));

/// Report the end of a viewer session. Call from the host Activity's
/// `onActivityResult`.
///
/// Returns `false` if `request_code` does not belong to an open session.
pub fn on_activity_result(request_code: i32) -> bool {
    SESSIONS.dismissed(request_code)
}

/// Report that the user picked the send action for an open session.
///
/// Android does not tell the launching app which chooser target was picked.
/// Unless the host registers its own chooser callback (an `IntentSender`
/// passed to `Intent.createChooser`) and forwards it here with the request
/// code, no send is ever reported and `on_send` never runs on Android.
///
/// Returns `false` if `request_code` does not belong to an open session.
pub fn on_send_triggered(request_code: i32) -> bool {
    SESSIONS.send_triggered(request_code)
}

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

/// The process-wide `JavaVM`, read once from the NDK context.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| ViewerError::NativeFailure(format!("failed to obtain JavaVM: {e}")))?;
    Ok(JAVA_VM.get_or_init(|| vm))
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| ViewerError::NativeFailure(format!("failed to attach JNI thread: {e}")))
}

/// The `Activity` hosting the native code.
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(ViewerError::PlatformUnsupported);
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

fn jni_err(context: &str, e: jni::errors::Error) -> ViewerError {
    ViewerError::NativeFailure(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the viewer bridge.
///
/// Holds only configuration; session state lives in the request-code
/// registry until the host reports the activity result.
pub struct AndroidBridge {
    config: BridgeConfig,
}

impl AndroidBridge {
    /// Create a new Android bridge. No JNI call happens until `present`.
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl NativeViewer for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }

    fn resolve(&self, request: &OpenRequest) -> ResolvedRequest {
        request.resolve(&self.config)
    }

    /// Launch an `ACTION_VIEW` intent for the requested file.
    ///
    /// Fails with `InvalidPath` when a filesystem path does not exist and
    /// with `NoViewerAvailable` when no activity can handle the file. In the
    /// latter case the store search is opened first if suggestions are on.
    ///
    /// Presentation per resolved flags:
    /// - neither `show_open_with_dialog` nor `show_send_button`: the view
    ///   intent is launched directly (system default app or resolver).
    /// - `show_open_with_dialog`: a chooser titled with the display name.
    /// - `show_send_button`: the chooser also lists an `ACTION_SEND` entry.
    fn present(&self, request: &OpenRequest, events: SessionEvents) -> Result<()> {
        let resolved = self.resolve(request);
        let mut env = jni_env()?;
        let activity = activity()?;
        let mime_type = mime::mime_for_path(&resolved.path);

        tracing::info!(
            path = %resolved.path,
            mime = mime_type,
            session = %events.session(),
            "Android: dispatching view intent"
        );

        let uri = content_uri(&mut env, &activity, &resolved, &self.config)?;

        // -- Build ACTION_VIEW intent -------------------------------------------
        let view_intent = new_intent(&mut env, "android.intent.action.VIEW")?;
        let j_mime: JString = env
            .new_string(mime_type)
            .map_err(|e| jni_err("new_string(mime)", e))?;
        env.call_method(
            &view_intent,
            "setDataAndType",
            "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&uri), JValue::Object(&j_mime)],
        )
        .map_err(|e| jni_err("setDataAndType", e))?;
        add_flags(&mut env, &view_intent, FLAG_GRANT_READ_URI_PERMISSION)?;

        // -- Anything able to handle it? ----------------------------------------
        if !has_handler(&mut env, &activity, &view_intent)? {
            if resolved.show_apps_suggestions {
                open_store_search(&mut env, &activity, &resolved, &self.config)?;
            }
            return Err(ViewerError::NoViewerAvailable(format!(
                "no activity handles {mime_type}"
            )));
        }

        // -- Chooser when forced or when a send option is wanted -----------------
        let launch = if resolved.show_open_with_dialog || resolved.show_send_button {
            chooser(&mut env, view_intent, &uri, mime_type, &resolved, &self.config)?
        } else {
            view_intent
        };

        // -- Launch -------------------------------------------------------------
        let request_code = SESSIONS.register(events.clone());

        let launched = env.call_method(
            &activity,
            "startActivityForResult",
            "(Landroid/content/Intent;I)V",
            &[JValue::Object(&launch), JValue::Int(request_code)],
        );
        if let Err(e) = launched {
            SESSIONS.forget(request_code);
            let _ = env.exception_clear();
            return Err(jni_err("startActivityForResult", e));
        }

        tracing::info!(request_code, session = %events.session(), "Android: view intent dispatched");
        events.presented();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Turn the request path into a `Uri` another app may read.
///
/// Filesystem paths go through `FileProvider` after an existence check;
/// `content://` and other URIs are parsed as-is.
fn content_uri<'a>(
    env: &mut JNIEnv<'a>,
    activity: &JObject<'_>,
    request: &ResolvedRequest,
    config: &BridgeConfig,
) -> Result<JObject<'a>> {
    let fs_path = match request.path_kind {
        PathKind::Absolute => Some(request.path.as_str()),
        PathKind::FileUri => request.path.strip_prefix("file://"),
        PathKind::ContentUri | PathKind::Other => None,
    };

    let Some(fs_path) = fs_path else {
        let j_uri: JString = env
            .new_string(&request.path)
            .map_err(|e| jni_err("new_string(uri)", e))?;
        return env
            .call_static_method(
                "android/net/Uri",
                "parse",
                "(Ljava/lang/String;)Landroid/net/Uri;",
                &[JValue::Object(&j_uri)],
            )
            .map_err(|e| jni_err("Uri.parse", e))?
            .l()
            .map_err(|e| jni_err("Uri.parse->l", e));
    };

    let j_path: JString = env
        .new_string(fs_path)
        .map_err(|e| jni_err("new_string(path)", e))?;
    let file_obj: JObject = env
        .new_object(
            "java/io/File",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&j_path)],
        )
        .map_err(|e| jni_err("new File(path)", e))?;

    let exists = env
        .call_method(&file_obj, "exists", "()Z", &[])
        .map_err(|e| jni_err("File.exists", e))?
        .z()
        .map_err(|e| jni_err("File.exists->z", e))?;
    if !exists {
        return Err(ViewerError::InvalidPath(format!("{fs_path} does not exist")));
    }

    let authority = get_authority(env, activity, config)?;
    let j_authority: JString = env
        .new_string(&authority)
        .map_err(|e| jni_err("new_string(authority)", e))?;

    let uri = env.call_static_method(
        "androidx/core/content/FileProvider",
        "getUriForFile",
        "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
        &[
            JValue::Object(activity),
            JValue::Object(&j_authority),
            JValue::Object(&file_obj),
        ],
    );
    match uri {
        Ok(value) => value.l().map_err(|e| jni_err("getUriForFile->l", e)),
        Err(e) => {
            // IllegalArgumentException: the path is outside every configured
            // FileProvider root.
            let _ = env.exception_clear();
            Err(ViewerError::InvalidPath(format!(
                "{fs_path} is not shared through {authority}: {e}"
            )))
        }
    }
}

fn new_intent<'a>(env: &mut JNIEnv<'a>, action: &str) -> Result<JObject<'a>> {
    let j_action: JString = env
        .new_string(action)
        .map_err(|e| jni_err("new_string(action)", e))?;
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;)V",
        &[JValue::Object(&j_action)],
    )
    .map_err(|e| jni_err("new Intent", e))
}

fn add_flags(env: &mut JNIEnv<'_>, intent: &JObject<'_>, flags: i32) -> Result<()> {
    env.call_method(
        intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(flags)],
    )
    .map_err(|e| jni_err("addFlags", e))?;
    Ok(())
}

/// Whether any installed activity resolves `intent`.
fn has_handler(env: &mut JNIEnv<'_>, activity: &JObject<'_>, intent: &JObject<'_>) -> Result<bool> {
    let pm: JObject = env
        .call_method(
            activity,
            "getPackageManager",
            "()Landroid/content/pm/PackageManager;",
            &[],
        )
        .map_err(|e| jni_err("getPackageManager", e))?
        .l()
        .map_err(|e| jni_err("getPackageManager->l", e))?;

    let component: JObject = env
        .call_method(
            intent,
            "resolveActivity",
            "(Landroid/content/pm/PackageManager;)Landroid/content/ComponentName;",
            &[JValue::Object(&pm)],
        )
        .map_err(|e| jni_err("resolveActivity", e))?
        .l()
        .map_err(|e| jni_err("resolveActivity->l", e))?;

    Ok(!component.is_null())
}

/// Open the app store searching for the file's extension.
fn open_store_search(
    env: &mut JNIEnv<'_>,
    activity: &JObject<'_>,
    request: &ResolvedRequest,
    config: &BridgeConfig,
) -> Result<()> {
    let query = mime::extension(&request.path).unwrap_or_else(|| request.file_name().to_owned());
    let j_uri: JString = env
        .new_string(format!("{}{query}", config.store_search_prefix))
        .map_err(|e| jni_err("new_string(store_uri)", e))?;
    let store_uri: JObject = env
        .call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&j_uri)],
        )
        .map_err(|e| jni_err("Uri.parse(store)", e))?
        .l()
        .map_err(|e| jni_err("Uri.parse(store)->l", e))?;

    let store_intent = new_intent(env, "android.intent.action.VIEW")?;
    env.call_method(
        &store_intent,
        "setData",
        "(Landroid/net/Uri;)Landroid/content/Intent;",
        &[JValue::Object(&store_uri)],
    )
    .map_err(|e| jni_err("setData(store)", e))?;
    add_flags(env, &store_intent, FLAG_ACTIVITY_NEW_TASK)?;

    tracing::info!(query = %query, "Android: opening store search for a viewer");

    if let Err(e) = env.call_method(
        activity,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[JValue::Object(&store_intent)],
    ) {
        // No store installed; the caller still gets NoViewerAvailable.
        let _ = env.exception_clear();
        tracing::warn!(error = %e, "Android: store search could not be opened");
    }
    Ok(())
}

/// Wrap `view_intent` in a chooser titled with the request's title, adding
/// an `ACTION_SEND` entry when a send option is wanted.
fn chooser<'a>(
    env: &mut JNIEnv<'a>,
    view_intent: JObject<'a>,
    uri: &JObject<'_>,
    mime_type: &str,
    request: &ResolvedRequest,
    config: &BridgeConfig,
) -> Result<JObject<'a>> {
    let title = request
        .display_name
        .as_deref()
        .unwrap_or(config.chooser_title.as_str());
    let j_title: JString = env
        .new_string(title)
        .map_err(|e| jni_err("new_string(chooser_title)", e))?;

    let chooser: JObject = env
        .call_static_method(
            "android/content/Intent",
            "createChooser",
            "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
            &[JValue::Object(&view_intent), JValue::Object(&j_title)],
        )
        .map_err(|e| jni_err("Intent.createChooser", e))?
        .l()
        .map_err(|e| jni_err("createChooser->l", e))?;

    if request.show_send_button {
        let send_intent = new_intent(env, "android.intent.action.SEND")?;
        let j_mime: JString = env
            .new_string(mime_type)
            .map_err(|e| jni_err("new_string(send_mime)", e))?;
        env.call_method(
            &send_intent,
            "setType",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_mime)],
        )
        .map_err(|e| jni_err("setType(send)", e))?;

        let j_extra_stream: JString = env
            .new_string("android.intent.extra.STREAM")
            .map_err(|e| jni_err("new_string(EXTRA_STREAM)", e))?;
        env.call_method(
            &send_intent,
            "putExtra",
            "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
            &[JValue::Object(&j_extra_stream), JValue::Object(uri)],
        )
        .map_err(|e| jni_err("putExtra(EXTRA_STREAM)", e))?;
        add_flags(env, &send_intent, FLAG_GRANT_READ_URI_PERMISSION)?;

        let initial = env
            .new_object_array(1, "android/content/Intent", &send_intent)
            .map_err(|e| jni_err("new_object_array(initial_intents)", e))?;
        let j_extra_initial: JString = env
            .new_string("android.intent.extra.INITIAL_INTENTS")
            .map_err(|e| jni_err("new_string(EXTRA_INITIAL_INTENTS)", e))?;
        env.call_method(
            &chooser,
            "putExtra",
            "(Ljava/lang/String;[Landroid/os/Parcelable;)Landroid/content/Intent;",
            &[JValue::Object(&j_extra_initial), JValue::Object(&*initial)],
        )
        .map_err(|e| jni_err("putExtra(EXTRA_INITIAL_INTENTS)", e))?;
    }

    Ok(chooser)
}

/// Build the FileProvider authority string for this application:
/// `<applicationId>` followed by the configured suffix.
fn get_authority(
    env: &mut JNIEnv<'_>,
    activity: &JObject<'_>,
    config: &BridgeConfig,
) -> Result<String> {
    let j_pkg: JObject = env
        .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("getPackageName", e))?
        .l()
        .map_err(|e| jni_err("getPackageName->l", e))?;

    let pkg: String = env
        .get_string(&JString::from(j_pkg))
        .map_err(|e| jni_err("get_string(packageName)", e))?
        .into();

    Ok(format!("{pkg}{}", config.file_provider_suffix))
}
