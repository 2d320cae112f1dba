//! The vendor SDK boundary.
//!
//! [`Sdk`] describes, in raw terms, what the core needs from the vendor
//! library: opaque handles, numeric status codes, and record views whose
//! buffers belong to the vendor. Implementations do no bookkeeping beyond what
//! the vendor itself does; handle ownership, status translation and buffer
//! copying all happen in the safe layer above.
//!
//! Two implementations ship with the crate:
//!
//! - [`fwifc::Fwifc`] calls `libsdfifc` (requires the `native` feature)
//! - `memory::MemorySdk` (feature `testing`) serves in-memory fixtures and counts every
//!   acquisition and release, standing in for the vendor in tests

use std::ffi::CStr;
use std::fmt;

use crate::calibration::CalibrationTable;

#[cfg_attr(not(feature = "native"), allow(dead_code))]
mod claim;
#[cfg(feature = "native")]
pub mod fwifc;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

/// A raw vendor status code.
pub type Status = i32;

/// Opaque identifier of one vendor-allocated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The kind of resource a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// An open file.
    File,
    /// A cursor over the scan lines of a file.
    ScanLineCursor,
    /// A cursor over the pulses of one scan line.
    PulseCursor,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleKind::File => "file",
            HandleKind::ScanLineCursor => "scan-line cursor",
            HandleKind::PulseCursor => "pulse cursor",
        };
        f.write_str(name)
    }
}

/// Header fields as reported by the vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHeader {
    /// Format version declared by the file.
    pub format_version: u16,
    /// Number of pulse records in the file.
    pub pulse_count: u64,
    /// Number of scan lines, when the file declares it.
    pub scan_line_count: Option<u64>,
    /// Instrument name, e.g. "Q680I".
    pub instrument: String,
    /// Instrument serial number.
    pub serial: String,
    /// Type of external time, or "UNKNOWN".
    pub epoch: String,
    /// External time of the first record, in seconds relative to the epoch.
    pub capture_time: f64,
    /// Group velocity in m/s.
    pub v_group: f64,
    /// Sampling interval in seconds.
    pub sampling_time: f64,
    /// Whether external time was synchronized with GPS.
    pub gps_synchronized: bool,
    /// Number of mirror facets of the instrument.
    pub num_facets: u16,
}

/// One scan-line record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScanLine {
    /// Zero-based position of the scan line in the file.
    pub index: u64,
    /// External time of the first pulse, in seconds.
    pub timestamp: f64,
    /// Mirror facet that produced the scan line.
    pub facet: u16,
    /// Number of pulses in the scan line.
    pub pulse_count: u64,
}

/// One sample block, borrowed from a vendor buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawBlock<'a> {
    /// Start of the sample block, in seconds.
    pub time_sosbl: f64,
    /// Raw channel number.
    pub channel: u32,
    /// Samples, valid only until the cursor advances.
    pub samples: &'a [u16],
}

/// One pulse record, borrowed from vendor buffers.
#[derive(Debug, Clone)]
pub struct RawPulse<'a> {
    /// Zero-based position of the pulse in the file.
    pub index: u64,
    /// Start of the range gate, in seconds.
    pub time_sorg: f64,
    /// External time in seconds relative to the epoch.
    pub time_external: f64,
    /// Origin vector, in meters.
    pub origin: [f64; 3],
    /// Direction vector (dimensionless).
    pub direction: [f64; 3],
    /// GPS synchronized.
    pub synchronized: bool,
    /// Synchronized within the last second.
    pub sync_lastsec: bool,
    /// Housekeeping block.
    pub housekeeping: bool,
    /// Mirror facet number.
    pub facet: u16,
    /// Sample blocks of the pulse.
    pub blocks: Vec<RawBlock<'a>>,
}

/// Version information of the vendor library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLibraryVersion {
    /// API major version.
    pub api_major: u16,
    /// API minor version.
    pub api_minor: u16,
    /// Build version string.
    pub build_version: String,
    /// Build tag string.
    pub build_tag: String,
}

/// The capabilities of the vendor library, in raw form.
///
/// Every fallible call returns the vendor's status code on failure; the
/// end-of-file status terminates cursors. Record views that borrow vendor
/// memory are only handed out inside a callback, so nothing can hold on to
/// them past the call that produced them.
///
/// The vendor library is single-threaded; implementations are not expected
/// to be `Send` or `Sync`.
pub trait Sdk {
    /// Open a file.
    fn open(&self, path: &CStr) -> Result<RawHandle, Status>;

    /// Read the header of an open file.
    fn header(&self, file: RawHandle) -> Result<RawHeader, Status>;

    /// Report sample-block start times relative to the file (`true`) or
    /// absolute (`false`).
    fn set_sosbl_relative(&self, file: RawHandle, relative: bool) -> Result<(), Status>;

    /// Start a cursor at the first scan line of a file.
    fn begin_scan_lines(&self, file: RawHandle) -> Result<RawHandle, Status>;

    /// Advance a scan-line cursor.
    fn next_scan_line(&self, cursor: RawHandle) -> Result<RawScanLine, Status>;

    /// Start a cursor over the pulses of the scan line most recently returned
    /// by `scan_lines`.
    fn begin_pulses(&self, scan_lines: RawHandle) -> Result<RawHandle, Status>;

    /// Advance a pulse cursor, exposing the pulse to `visit`.
    ///
    /// The buffers behind the pulse are only valid during `visit`.
    fn next_pulse(
        &self,
        cursor: RawHandle,
        visit: &mut dyn FnMut(&RawPulse<'_>),
    ) -> Result<(), Status>;

    /// Expose one calibration table of an open file to `visit` as
    /// `(abscissa, ordinate)`.
    fn calibration(
        &self,
        file: RawHandle,
        table: CalibrationTable,
        visit: &mut dyn FnMut(&[f64], &[f64]),
    ) -> Result<(), Status>;

    /// Release a handle.
    fn close(&self, handle: RawHandle, kind: HandleKind) -> Status;

    /// The message describing the most recent failure.
    fn last_error(&self) -> String;

    /// Version information of the library.
    fn library_version(&self) -> Result<RawLibraryVersion, Status>;
}
