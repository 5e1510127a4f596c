//! FFI bindings for devpulse
//!
//! C-compatible functions for calling devpulse from the dashboard shell.
//! All inputs are null-terminated UTF-8 strings. Returned strings are
//! allocated here and must be released with `pulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::PulseConfig;
use crate::encoder::to_json;
use crate::error::ComputeError;
use crate::pipeline::{
    app_usage_json, daily_heatmap_json, hourly_heatmap_json, parse_end_date,
    segment_session_json, PulseProcessor,
};

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

/// Borrow a C string as `&str`, recording an error naming `what` on failure
unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Option<&'a str> {
    if ptr.is_null() {
        set_last_error(&format!("Null {} pointer", what));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            set_last_error(&format!("Invalid UTF-8 in {}", what));
            None
        }
    }
}

/// Hand a result to the caller: an owned C string, or NULL plus last error
fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => cstr.into_raw(),
            Err(_) => {
                set_last_error("Output contained an interior NUL byte");
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Non-positive counts from C fall back to `default`
fn count_or(value: i32, default: usize) -> usize {
    if value <= 0 {
        default
    } else {
        value as usize
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Segment one session's window events into a timeline payload.
///
/// # Safety
/// - `events_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_segment_session(events_json: *const c_char) -> *mut c_char {
    clear_last_error();
    match read_str(events_json, "events JSON") {
        Some(json) => finish(segment_session_json(json)),
        None => ptr::null_mut(),
    }
}

/// Daily heatmap for the `days` days ending at `end_date` (`YYYY-MM-DD`).
///
/// A non-positive `days` uses the default 30 day window.
///
/// # Safety
/// - `summaries_json` and `end_date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_daily_heatmap(
    summaries_json: *const c_char,
    end_date: *const c_char,
    days: i32,
) -> *mut c_char {
    clear_last_error();
    let Some(json) = read_str(summaries_json, "summaries JSON") else {
        return ptr::null_mut();
    };
    let Some(end) = read_str(end_date, "end date") else {
        return ptr::null_mut();
    };
    let days = count_or(days, PulseConfig::default().daily_window_days);
    finish(daily_heatmap_json(json, end, days))
}

/// Hour-of-day heatmap from session records at the given UTC offset.
///
/// # Safety
/// - `sessions_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_hourly_heatmap(
    sessions_json: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();
    match read_str(sessions_json, "sessions JSON") {
        Some(json) => finish(hourly_heatmap_json(json, utc_offset_minutes)),
        None => ptr::null_mut(),
    }
}

/// Per-app usage breakdown. A non-positive `limit` keeps every app.
///
/// # Safety
/// - `events_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_app_usage(events_json: *const c_char, limit: i32) -> *mut c_char {
    clear_last_error();
    match read_str(events_json, "events JSON") {
        Some(json) => finish(app_usage_json(json, count_or(limit, 0))),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a PulseProcessor
pub struct PulseProcessorHandle {
    processor: PulseProcessor,
}

/// Create a processor from a JSON config, or with defaults when `config_json` is NULL.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `pulse_processor_free`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_new(config_json: *const c_char) -> *mut PulseProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        Ok(PulseProcessor::default())
    } else {
        match read_str(config_json, "config JSON") {
            Some(json) => PulseProcessor::from_config_json(json),
            None => return ptr::null_mut(),
        }
    };

    match processor {
        Ok(processor) => Box::into_raw(Box::new(PulseProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a pointer returned by `pulse_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_free(processor: *mut PulseProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Segment a session with a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - `events_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_segment_session(
    processor: *const PulseProcessorHandle,
    events_json: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(handle) = processor.as_ref() else {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    };
    let Some(json) = read_str(events_json, "events JSON") else {
        return ptr::null_mut();
    };
    finish(
        handle
            .processor
            .segment_session(json)
            .and_then(|payload| to_json(&payload, false)),
    )
}

/// Daily heatmap over the processor's configured window ending at `end_date`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - `summaries_json` and `end_date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_daily_heatmap(
    processor: *const PulseProcessorHandle,
    summaries_json: *const c_char,
    end_date: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(handle) = processor.as_ref() else {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    };
    let Some(json) = read_str(summaries_json, "summaries JSON") else {
        return ptr::null_mut();
    };
    let Some(end) = read_str(end_date, "end date") else {
        return ptr::null_mut();
    };

    let result = parse_end_date(end)
        .and_then(|end| handle.processor.daily_heatmap(json, end))
        .and_then(|payload| to_json(&payload, false));
    finish(result)
}

/// Hourly heatmap at the processor's configured UTC offset.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - `sessions_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_hourly_heatmap(
    processor: *const PulseProcessorHandle,
    sessions_json: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(handle) = processor.as_ref() else {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    };
    let Some(json) = read_str(sessions_json, "sessions JSON") else {
        return ptr::null_mut();
    };
    finish(
        handle
            .processor
            .hourly_heatmap(json)
            .and_then(|payload| to_json(&payload, false)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a devpulse function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a devpulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next devpulse call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if the last call succeeded.
#[no_mangle]
pub unsafe extern "C" fn pulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the devpulse library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn pulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_json() -> CString {
        CString::new(
            r#"[
                { "timestamp": 1705327200000, "app_name": "code.exe", "duration": 120 },
                { "timestamp": 1705327320000, "app_name": "chrome.exe", "duration": 60 }
            ]"#,
        )
        .unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        pulse_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_segment_session() {
        let json = events_json();
        unsafe {
            let value = take_json(pulse_segment_session(json.as_ptr()));
            assert_eq!(value["segments"][0]["kind"], "deep_work");
            assert_eq!(value["segments"][0]["switch_count"], 1);
            assert!(pulse_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_daily_heatmap() {
        let rows = CString::new(r#"[{ "date": "2024-01-02", "total_diffs": 3 }]"#).unwrap();
        let end = CString::new("2024-01-02").unwrap();
        unsafe {
            let value = take_json(pulse_daily_heatmap(rows.as_ptr(), end.as_ptr(), 7));
            assert_eq!(value["values"].as_array().unwrap().len(), 7);
            assert_eq!(value["values"][6], 1.0);

            // default window
            let value = take_json(pulse_daily_heatmap(rows.as_ptr(), end.as_ptr(), 0));
            assert_eq!(value["values"].as_array().unwrap().len(), 30);
        }
    }

    #[test]
    fn test_ffi_hourly_heatmap_and_app_usage() {
        let sessions =
            CString::new(r#"[{ "start_time": 1705327200000, "end_time": 1705329000000 }]"#).unwrap();
        let events = events_json();
        unsafe {
            let hourly = take_json(pulse_hourly_heatmap(sessions.as_ptr(), 0));
            assert_eq!(hourly["values"][14], 1.0);

            let usage = take_json(pulse_app_usage(events.as_ptr(), 0));
            assert_eq!(usage["apps"].as_array().unwrap().len(), 2);
            assert_eq!(usage["coding_minutes"], 2);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        let config = CString::new(r#"{ "utc_offset_minutes": 60, "daily_window_days": 2 }"#).unwrap();
        let events = events_json();
        let rows = CString::new(r#"[{ "date": "2024-01-01", "total_diffs": 2 }]"#).unwrap();
        let end = CString::new("2024-01-02").unwrap();
        let sessions =
            CString::new(r#"[{ "start_time": 1705327200000, "end_time": 1705329000000 }]"#).unwrap();

        unsafe {
            let processor = pulse_processor_new(config.as_ptr());
            assert!(!processor.is_null());

            let timeline = take_json(pulse_processor_segment_session(processor, events.as_ptr()));
            assert_eq!(timeline["summary"]["segment_count"], 1);

            let daily = take_json(pulse_processor_daily_heatmap(
                processor,
                rows.as_ptr(),
                end.as_ptr(),
            ));
            assert_eq!(daily["values"], serde_json::json!([1.0, 0.0]));

            let hourly = take_json(pulse_processor_hourly_heatmap(processor, sessions.as_ptr()));
            assert_eq!(hourly["values"][15], 1.0);

            pulse_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_processor_defaults_and_bad_config() {
        unsafe {
            let processor = pulse_processor_new(ptr::null());
            assert!(!processor.is_null());
            pulse_processor_free(processor);

            let bad = CString::new(r#"{ "daily_window_days": 0 }"#).unwrap();
            assert!(pulse_processor_new(bad.as_ptr()).is_null());
            assert!(!pulse_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        unsafe {
            assert!(pulse_segment_session(invalid.as_ptr()).is_null());
            let error = CStr::from_ptr(pulse_last_error()).to_str().unwrap();
            assert!(!error.is_empty());

            assert!(pulse_segment_session(ptr::null()).is_null());
            let error = CStr::from_ptr(pulse_last_error()).to_str().unwrap();
            assert!(error.contains("Null"));

            let events = events_json();
            assert!(pulse_processor_segment_session(ptr::null(), events.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(pulse_version()).to_str().unwrap();
            assert_eq!(version, crate::PULSE_VERSION);
        }
    }
}
