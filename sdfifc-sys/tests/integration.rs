//! Integration tests for sdfifc-sys
//!
//! These tests call into libsdfifc and only run when the crate was built with
//! the `link` feature and the library was found.

#![cfg(sdfifc_linked)]

use sdfifc_sys::*;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

#[test]
fn test_library_version() {
    unsafe {
        let mut api_major = 0u16;
        let mut api_minor = 0u16;
        let mut build_version: *const c_char = ptr::null();
        let mut build_tag: *const c_char = ptr::null();
        let status = fwifc_get_library_version(
            &mut api_major,
            &mut api_minor,
            &mut build_version,
            &mut build_tag,
        );

        assert_eq!(status, FWIFC_NO_ERROR);
        assert!(!build_version.is_null());
        assert!(CStr::from_ptr(build_version).to_str().is_ok());
    }
}

#[test]
fn test_last_error_is_empty_before_failures() {
    unsafe {
        let mut message: *const c_char = ptr::null();
        assert_eq!(fwifc_get_last_error(&mut message), FWIFC_NO_ERROR);
        assert_eq!(CStr::from_ptr(message).to_bytes(), b"");
    }
}

#[test]
fn test_open_nonexistent_file() {
    unsafe {
        let path = CString::new("/nonexistent/path/to/file.sdf").unwrap();
        let mut file: fwifc_file = ptr::null_mut();
        let status = fwifc_open(path.as_ptr(), &mut file);

        assert_ne!(status, FWIFC_NO_ERROR, "Opening nonexistent file should fail");
    }
}
