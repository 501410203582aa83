//! FFI bindings for PetPulse
//!
//! This module provides C-compatible functions for calling PetPulse from other
//! languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `petpulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::HealthEngine;
use crate::types::ReadingOrder;

// Thread-local storage for the last error message
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

// ============================================================================
// Stateless API
// ============================================================================

/// Assess a JSON array of readings and return the assessment as JSON.
///
/// `newest_first` is non-zero when the array is ordered newest-first and
/// zero when it is oldest-first. `catalog_json` may be NULL to use the
/// standard catalog.
///
/// # Safety
/// - `readings_json` must be a valid null-terminated C string.
/// - `catalog_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `petpulse_free_string`.
/// - Returns NULL on error; call `petpulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn petpulse_compute_health(
    readings_json: *const c_char,
    newest_first: i32,
    catalog_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let readings_str = match cstr_to_string(readings_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid readings string pointer");
            return ptr::null_mut();
        }
    };

    let engine = if catalog_json.is_null() {
        HealthEngine::new()
    } else {
        let catalog_str = match cstr_to_string(catalog_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid catalog string pointer");
                return ptr::null_mut();
            }
        };
        match HealthEngine::from_catalog_json(&catalog_str) {
            Ok(engine) => engine,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let order = if newest_first != 0 {
        ReadingOrder::NewestFirst
    } else {
        ReadingOrder::OldestFirst
    };

    match engine.compute_health_json(&readings_str, order) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a PetPulse function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a PetPulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn petpulse_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next PetPulse call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn petpulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the PetPulse library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn petpulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_readings() -> CString {
        CString::new(
            r#"[
                {"timestamp": "2024-06-01T12:00:00Z", "heart_rate": 80, "temperature": 38.5},
                {"timestamp": "2024-06-01T12:10:00Z", "heart_rate": 135, "temperature": 38.6}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_compute_health() {
        let readings = sample_readings();

        unsafe {
            let result = petpulse_compute_health(readings.as_ptr(), 0, ptr::null());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["alerts"][0]["metric_key"], "heartRate");
            assert_eq!(value["trends"]["heartRate"], "increasing");

            petpulse_free_string(result);
        }
    }

    #[test]
    fn test_ffi_custom_catalog() {
        let readings = sample_readings();
        let catalog = CString::new(crate::catalog::MetricCatalog::standard().to_json().unwrap())
            .unwrap();

        unsafe {
            let result = petpulse_compute_health(readings.as_ptr(), 0, catalog.as_ptr());
            assert!(!result.is_null());
            petpulse_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            // declared newest-first but supplied oldest-first
            let readings = sample_readings();
            let result = petpulse_compute_health(readings.as_ptr(), 1, ptr::null());
            assert!(result.is_null());

            let error = petpulse_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("ordering"));

            let result = petpulse_compute_health(ptr::null(), 1, ptr::null());
            assert!(result.is_null());

            let bad_catalog = CString::new(r#"{"metrics": []}"#).unwrap();
            let result = petpulse_compute_health(readings.as_ptr(), 0, bad_catalog.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(petpulse_last_error()).to_str().unwrap();
            assert!(error_str.contains("no metrics"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = petpulse_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
