//! FFI bindings for Stroke Flux
//!
//! This module provides C-compatible functions for calling Stroke Flux from other
//! languages. All functions take C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `stroke_flux_free_string`.
//!
//! Every entry point takes an optional configuration JSON; pass NULL for defaults.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::parse_session;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::{annotate_session, session_to_csv, session_to_json};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Caller must free the result
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// NULL means default settings; a non-NULL pointer must hold valid config JSON
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, AnalysisError> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    let json = cstr_to_string(config_json)
        .ok_or_else(|| AnalysisError::ConfigError("config is not valid UTF-8".to_string()))?;
    AnalysisConfig::from_json(&json)
}

/// Shared body of the string-in, string-out entry points
unsafe fn run_string_call<F>(json: *const c_char, config_json: *const c_char, call: F) -> *mut c_char
where
    F: FnOnce(&str, &AnalysisConfig) -> Result<String, AnalysisError>,
{
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match call(&json_str, &config) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analysis API
// ============================================================================

/// Analyze a session and return its temporal features as JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string holding a session object
///   or an array of strokes.
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `stroke_flux_free_string`.
/// - Returns NULL on error; call `stroke_flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_analyze_json(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_string_call(json, config_json, session_to_json)
}

/// Analyze a session and return a CSV header plus one data row.
///
/// # Safety
/// - Same contract as `stroke_flux_analyze_json`.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_analyze_csv(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_string_call(json, config_json, session_to_csv)
}

/// Return per-point renderer annotations as a JSON array of strokes.
///
/// # Safety
/// - Same contract as `stroke_flux_analyze_json`.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_annotate(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_string_call(json, config_json, |raw, config| {
        let session = parse_session(raw)?;
        let annotated = annotate_session(&session, config)?;
        Ok(serde_json::to_string(&annotated)?)
    })
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Stroke Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Stroke Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Stroke Flux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Stroke Flux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn stroke_flux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
