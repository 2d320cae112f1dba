//! # sdfifc-sys
//!
//! Raw FFI bindings to Riegl's `libsdfifc`, the vendor library that reads
//! full-waveform `.sdf` files.
//!
//! This crate provides low-level, unsafe declarations only. For a safe,
//! idiomatic Rust API, use the `sdf-rs` crate instead.
//!
//! ## Usage
//!
//! Direct usage requires careful attention to:
//!
//! - Closing every `fwifc_file` returned by [`fwifc_open`] exactly once
//! - Copying sample buffers out of [`fwifc_sbl_t`] before the next
//!   [`fwifc_read`], which reuses them
//! - Reindexing a file before reading or seeking
//! - Calling into the library from one thread only (it is not thread-safe)
//!
//! ## Example
//!
//! ```no_run
//! use sdfifc_sys::*;
//! use std::ffi::CString;
//! use std::ptr;
//!
//! unsafe {
//!     let path = CString::new("scan.sdf").unwrap();
//!     let mut file: fwifc_file = ptr::null_mut();
//!
//!     if fwifc_open(path.as_ptr(), &mut file) == FWIFC_NO_ERROR {
//!         fwifc_reindex(file);
//!         fwifc_close(file);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `link`: emit the link directives for `libsdfifc` (see `build.rs` for the
//!   `SDFIFC_LIB_DIR` and `SDFIFC_STATIC` variables)

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int};

// ============================================================================
// Status Codes
// ============================================================================

/// The end of the file has been reached.
pub const FWIFC_END_OF_FILE: c_int = -1;

/// The call succeeded.
pub const FWIFC_NO_ERROR: c_int = 0;

/// A bad argument was passed.
pub const FWIFC_ERR_BAD_ARG: c_int = 1;

/// The file is not in a format the library can decode.
pub const FWIFC_ERR_UNSUPPORTED_FORMAT: c_int = 2;

/// Reads and seeks need an index file; see [`fwifc_reindex`].
pub const FWIFC_ERR_MISSING_INDEX: c_int = 3;

/// An exception escaped the library's C++ internals.
pub const FWIFC_ERR_UNKNOWN_EXCEPTION: c_int = 4;

/// The call is not implemented by this build of the library.
pub const FWIFC_ERR_NOT_IMPLEMENTED: c_int = 5;

/// A runtime error occurred; the message is available from [`fwifc_get_last_error`].
pub const FWIFC_ERR_RUNTIME: c_int = 6;

// ============================================================================
// Flag Masks
// ============================================================================

/// `fwifc_get_info` flag: external time was GPS synchronized.
pub const FWIFC_INFO_GPS_SYNCHRONIZED: u16 = 0x01;

/// `fwifc_read` flag: the record is GPS synchronized.
pub const FWIFC_READ_SYNCHRONIZED: u16 = 0x01;

/// `fwifc_read` flag: synchronization happened within the last second.
pub const FWIFC_READ_SYNC_LASTSEC: u16 = 0x02;

/// `fwifc_read` flag: the record is a housekeeping block.
pub const FWIFC_READ_HOUSEKEEPING: u16 = 0x04;

// ============================================================================
// Calibration Table Kinds
// ============================================================================

/// Amplitude calibration of the high-power channel.
pub const FWIFC_CALIB_AMPL_CH0: u16 = 0;

/// Amplitude calibration of the low-power channel.
pub const FWIFC_CALIB_AMPL_CH1: u16 = 1;

/// Range calibration of the high-power channel.
pub const FWIFC_CALIB_RNG_CH0: u16 = 2;

/// Range calibration of the low-power channel.
pub const FWIFC_CALIB_RNG_CH1: u16 = 3;

// ============================================================================
// Types
// ============================================================================

/// Opaque file state owned by the library.
#[repr(C)]
pub struct fwifc_file_t {
    _private: [u8; 0],
}

/// Handle to an open file.
pub type fwifc_file = *mut fwifc_file_t;

/// One sample block of a record.
///
/// `sample` points into a buffer owned by the library that is overwritten by
/// the next call to [`fwifc_read`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct fwifc_sbl_t {
    /// Start of the sample block, in seconds.
    pub time_sosbl: c_double,
    /// 0: high, 1: low, 2: saturation, 3: reference.
    pub channel: u32,
    /// Number of samples in the block.
    pub sample_count: u32,
    /// Size of one sample in bytes.
    pub sample_size: u32,
    /// The samples.
    pub sample: *mut u16,
}

// ============================================================================
// Functions
// ============================================================================

extern "C" {
    pub fn fwifc_open(path: *const c_char, file: *mut fwifc_file) -> c_int;
    pub fn fwifc_close(file: fwifc_file) -> c_int;

    pub fn fwifc_get_library_version(
        api_major: *mut u16,
        api_minor: *mut u16,
        build_version: *mut *const c_char,
        build_tag: *mut *const c_char,
    ) -> c_int;
    pub fn fwifc_get_last_error(message: *mut *const c_char) -> c_int;

    pub fn fwifc_reindex(file: fwifc_file) -> c_int;
    pub fn fwifc_set_sosbl_relative(file: fwifc_file, value: c_int) -> c_int;

    pub fn fwifc_get_info(
        file: fwifc_file,
        instrument: *mut *const c_char,
        serial: *mut *const c_char,
        epoch: *mut *const c_char,
        v_group: *mut c_double,
        sampling_time: *mut c_double,
        flags: *mut u16,
        num_facets: *mut u16,
    ) -> c_int;
    pub fn fwifc_get_calib(
        file: fwifc_file,
        table_kind: u16,
        count: *mut u32,
        abscissa: *mut *const c_double,
        ordinate: *mut *const c_double,
    ) -> c_int;

    pub fn fwifc_read(
        file: fwifc_file,
        time_sorg: *mut c_double,
        time_external: *mut c_double,
        origin: *mut c_double,
        direction: *mut c_double,
        flags: *mut u16,
        facet: *mut u16,
        sbl_count: *mut u32,
        sbl_size: *mut u32,
        sbl: *mut *mut fwifc_sbl_t,
    ) -> c_int;
    pub fn fwifc_seek(file: fwifc_file, index: u32) -> c_int;
    pub fn fwifc_seek_time(file: fwifc_file, time: c_double) -> c_int;
    pub fn fwifc_seek_time_external(file: fwifc_file, time: c_double) -> c_int;
    pub fn fwifc_tell(file: fwifc_file, index: *mut u32) -> c_int;
}

/// Index passed to [`fwifc_seek`] to position on the last record.
///
/// The next [`fwifc_read`] returns that record; [`fwifc_tell`] after it gives
/// the record count plus one.
pub const FWIFC_SEEK_END: u32 = u32::MAX;

// ============================================================================
// Tests
// ============================================================================
