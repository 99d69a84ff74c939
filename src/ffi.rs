//! FFI bindings for Vitalsynth
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `vitalsynth_free_string`. Stateful streaming goes through an opaque handle
//! created with `vitalsynth_stream_new` and freed with
//! `vitalsynth_stream_free`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::document;
use crate::error::EngineError;
use crate::generate::{self, GenerationRequest, ManipulationPolicy};
use crate::pattern::PatternKind;
use crate::presets::StressPreset;
use crate::scenario::StreamScenario;
use crate::stream::StreamEngine;
use crate::transform;
use crate::types::Bundle;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Helper to parse a keyword argument (preset, policy, pattern, scenario)
unsafe fn parse_keyword_arg<T>(ptr: *const c_char, name: &str) -> Option<T>
where
    T: FromStr<Err = EngineError>,
{
    let raw = match cstr_to_string(ptr) {
        Some(s) => s,
        None => {
            set_last_error(&format!("Invalid {} string pointer", name));
            return None;
        }
    };
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            set_last_error(&e.to_string());
            None
        }
    }
}

/// Helper to parse an RFC 3339 timestamp argument
unsafe fn parse_timestamp_arg(ptr: *const c_char, name: &str) -> Option<DateTime<Utc>> {
    let raw = match cstr_to_string(ptr) {
        Some(s) => s,
        None => {
            set_last_error(&format!("Invalid {} string pointer", name));
            return None;
        }
    };
    match raw.parse::<DateTime<Utc>>() {
        Ok(ts) => Some(ts),
        Err(e) => {
            set_last_error(&format!("Invalid {} timestamp: {}", name, e));
            None
        }
    }
}

/// Helper to decode a bundle document argument
unsafe fn parse_bundle_arg(ptr: *const c_char, name: &str) -> Option<Bundle> {
    let raw = match cstr_to_string(ptr) {
        Some(s) => s,
        None => {
            set_last_error(&format!("Invalid {} string pointer", name));
            return None;
        }
    };
    match document::decode(&raw) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            set_last_error(&e.to_string());
            None
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Synthesize a bundle and return it as a JSON document.
///
/// `preset` is one of `lower_stress`, `normal`, `higher_stress`,
/// `edge_cases`. `policy` is one of `keep_original`, `generate_missing`,
/// `smooth_replace`, `accessibility_mode`. `start` and `end` are RFC 3339
/// timestamps. `existing_json` may be NULL, or a bundle document for the
/// policy to merge with.
///
/// # Safety
/// - `preset`, `policy`, `start`, and `end` must be valid null-terminated C strings.
/// - `existing_json` must be a valid null-terminated C string or NULL.
/// - `include_menstrual` is treated as a boolean (0 = false).
/// - Returns a newly allocated string that must be freed with `vitalsynth_free_string`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_generate(
    preset: *const c_char,
    policy: *const c_char,
    start: *const c_char,
    end: *const c_char,
    seed: u64,
    include_menstrual: i32,
    existing_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let preset = match parse_keyword_arg::<StressPreset>(preset, "preset") {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    let policy = match parse_keyword_arg::<ManipulationPolicy>(policy, "policy") {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    let start = match parse_timestamp_arg(start, "start") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let end = match parse_timestamp_arg(end, "end") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let existing = if existing_json.is_null() {
        None
    } else {
        match parse_bundle_arg(existing_json, "existing_json") {
            Some(bundle) => Some(bundle),
            None => return ptr::null_mut(),
        }
    };

    let request = GenerationRequest {
        preset,
        policy,
        start,
        end,
        seed,
        include_menstrual: include_menstrual != 0,
    };

    let result = generate::generate(&request, existing.as_ref())
        .and_then(|bundle| document::encode(&bundle));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Transform a bundle document onto a new date range and return the result
/// as a JSON document.
///
/// `pattern` is one of `similar`, `amplified`, `reduced`, `inverted`,
/// `random`. `target_start` and `target_end` are RFC 3339 timestamps.
///
/// # Safety
/// - All pointer arguments must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitalsynth_free_string`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_transform(
    bundle_json: *const c_char,
    pattern: *const c_char,
    target_start: *const c_char,
    target_end: *const c_char,
    seed: u64,
) -> *mut c_char {
    clear_last_error();

    let source = match parse_bundle_arg(bundle_json, "bundle_json") {
        Some(bundle) => bundle,
        None => return ptr::null_mut(),
    };

    let pattern = match parse_keyword_arg::<PatternKind>(pattern, "pattern") {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    let target_start = match parse_timestamp_arg(target_start, "target_start") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let target_end = match parse_timestamp_arg(target_end, "target_end") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let result = transform::transform(&source, target_start, target_end, pattern, seed)
        .and_then(|bundle| document::encode(&bundle));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Transform a bundle document so that it ends at `now`, preserving its
/// duration, and return the result as a JSON document.
///
/// # Safety
/// - All pointer arguments must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitalsynth_free_string`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_transpose_to_now(
    bundle_json: *const c_char,
    pattern: *const c_char,
    seed: u64,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let source = match parse_bundle_arg(bundle_json, "bundle_json") {
        Some(bundle) => bundle,
        None => return ptr::null_mut(),
    };

    let pattern = match parse_keyword_arg::<PatternKind>(pattern, "pattern") {
        Some(p) => p,
        None => return ptr::null_mut(),
    };

    let now = match parse_timestamp_arg(now, "now") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let result = transform::transpose_to_now(&source, pattern, seed, now)
        .and_then(|bundle| document::encode(&bundle));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Stream API
// ============================================================================

/// Opaque handle to a StreamEngine
pub struct VitalsStreamHandle {
    engine: StreamEngine,
}

/// Create a new stream engine for the given scenario and seed.
///
/// `scenario` is one of `normal`, `low_stress`, `stress`, `extreme`,
/// `edge_cases`, `workout`, `sleep`.
///
/// # Safety
/// - `scenario` must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `vitalsynth_stream_free`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_new(
    scenario: *const c_char,
    base_seed: u64,
) -> *mut VitalsStreamHandle {
    clear_last_error();

    let scenario = match parse_keyword_arg::<StreamScenario>(scenario, "scenario") {
        Some(s) => s,
        None => return ptr::null_mut(),
    };

    let engine = StreamEngine::new(scenario, base_seed);
    let handle = Box::new(VitalsStreamHandle { engine });
    Box::into_raw(handle)
}

/// Create a stream engine whose baselines come from a bundle document's
/// mean heart rate and HRV.
///
/// # Safety
/// - `scenario` and `bundle_json` must be valid null-terminated C strings.
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `vitalsynth_stream_free`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_with_source(
    scenario: *const c_char,
    base_seed: u64,
    bundle_json: *const c_char,
) -> *mut VitalsStreamHandle {
    clear_last_error();

    let scenario = match parse_keyword_arg::<StreamScenario>(scenario, "scenario") {
        Some(s) => s,
        None => return ptr::null_mut(),
    };

    let bundle = match parse_bundle_arg(bundle_json, "bundle_json") {
        Some(bundle) => bundle,
        None => return ptr::null_mut(),
    };

    let engine = StreamEngine::new(scenario, base_seed).with_baselines_from(&bundle);
    let handle = Box::new(VitalsStreamHandle { engine });
    Box::into_raw(handle)
}

/// Free a stream engine.
///
/// # Safety
/// - `stream` must be a valid pointer returned by `vitalsynth_stream_new`
///   or `vitalsynth_stream_with_source`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_free(stream: *mut VitalsStreamHandle) {
    if !stream.is_null() {
        drop(Box::from_raw(stream));
    }
}

/// Start streaming at `now`.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - `now` must be a valid null-terminated C string (RFC 3339).
/// - Returns 0 when the stream is running, 1 when the engine refused because
///   its session cap was reached (reset it first), -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_start(
    stream: *mut VitalsStreamHandle,
    now: *const c_char,
) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let now = match parse_timestamp_arg(now, "now") {
        Some(ts) => ts,
        None => return -1,
    };

    let handle = &mut *stream;
    if handle.engine.start(now) {
        0
    } else {
        1
    }
}

/// Pause an active stream.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_pause(stream: *mut VitalsStreamHandle) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let handle = &mut *stream;
    handle.engine.pause();
    0
}

/// Resume a paused stream.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_resume(stream: *mut VitalsStreamHandle) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let handle = &mut *stream;
    handle.engine.resume();
    0
}

/// Stop the stream, keeping its counters.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_stop(stream: *mut VitalsStreamHandle) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let handle = &mut *stream;
    handle.engine.stop();
    0
}

/// Reset the stream counters and clear the session cap.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_reset(stream: *mut VitalsStreamHandle) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let handle = &mut *stream;
    handle.engine.reset();
    0
}

/// Switch the active scenario without interrupting the stream.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - `scenario` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_set_scenario(
    stream: *mut VitalsStreamHandle,
    scenario: *const c_char,
) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }

    let scenario = match parse_keyword_arg::<StreamScenario>(scenario, "scenario") {
        Some(s) => s,
        None => return -1,
    };

    let handle = &mut *stream;
    handle.engine.set_scenario(scenario);
    0
}

/// Advance the stream by one tick at `now` and return the outcome as JSON,
/// e.g. `{"outcome":"emitted","point":{...}}`.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - `now` must be a valid null-terminated C string (RFC 3339).
/// - Returns a newly allocated string that must be freed with `vitalsynth_free_string`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_tick(
    stream: *mut VitalsStreamHandle,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return ptr::null_mut();
    }

    let now = match parse_timestamp_arg(now, "now") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let handle = &mut *stream;
    let outcome = handle.engine.tick(now);
    match serde_json::to_string(&outcome) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the current stream snapshot as JSON.
///
/// # Safety
/// - `stream` must be a valid pointer returned by a stream constructor.
/// - `now` must be a valid null-terminated C string (RFC 3339).
/// - Returns a newly allocated string that must be freed with `vitalsynth_free_string`.
/// - Returns NULL on error; call `vitalsynth_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_stream_snapshot(
    stream: *mut VitalsStreamHandle,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return ptr::null_mut();
    }

    let now = match parse_timestamp_arg(now, "now") {
        Some(ts) => ts,
        None => return ptr::null_mut(),
    };

    let handle = &*stream;
    let snapshot = handle.engine.snapshot(now);
    match serde_json::to_string(&snapshot) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitalsynth functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitalsynth function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Vitalsynth function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        match &*e.borrow() {
            Some(cstr) => cstr.as_ptr(),
            None => ptr::null(),
        }
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitalsynth library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitalsynth_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
