//! FFI bindings for Cadence
//!
//! This module provides C-compatible functions for calling Cadence from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `cadence_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::calendar::parse_instant;
use crate::error::EngineError;
use crate::pipeline::{analytics_json, notifications_json, recommend_json};

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

/// Read the optional `now` argument; NULL means the current time
unsafe fn read_now(now: *const c_char) -> Result<DateTime<Utc>, EngineError> {
    match cstr_to_string(now) {
        Some(raw) => parse_instant(&raw),
        None => Ok(Utc::now()),
    }
}

/// Shared body of the stateless entry points
unsafe fn run_json(
    input_json: *const c_char,
    now: *const c_char,
    compute: impl FnOnce(String, DateTime<Utc>) -> Result<String, EngineError>,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(input_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let now = match read_now(now) {
        Ok(now) => now,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match compute(json_str, now) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score an input document and return the recommendation report JSON.
///
/// # Safety
/// - `input_json` must be a valid null-terminated C string.
/// - `now` must be NULL (use the current time) or an RFC 3339 C string.
/// - Returns a newly allocated string that must be freed with `cadence_free_string`.
/// - Returns NULL on error; call `cadence_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cadence_recommend(
    input_json: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    run_json(input_json, now, recommend_json)
}

/// Analyze an input document and return the analytics report JSON.
///
/// # Safety
/// - `input_json` must be a valid null-terminated C string.
/// - `now` must be NULL (use the current time) or an RFC 3339 C string.
/// - Returns a newly allocated string that must be freed with `cadence_free_string`.
/// - Returns NULL on error; call `cadence_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cadence_analytics(
    input_json: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    run_json(input_json, now, analytics_json)
}

/// Project notifications for an input document and return the report JSON.
///
/// # Safety
/// - `input_json` must be a valid null-terminated C string.
/// - `now` must be NULL (use the current time) or an RFC 3339 C string.
/// - Returns a newly allocated string that must be freed with `cadence_free_string`.
/// - Returns NULL on error; call `cadence_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cadence_notifications(
    input_json: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    run_json(input_json, now, notifications_json)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Cadence functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Cadence function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cadence_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Cadence function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cadence_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Cadence library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn cadence_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
