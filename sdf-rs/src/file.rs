//! Opening `.sdf` files.
//!
//! This module provides [`SdfFile`], the main entry point for reading.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "native")]
//! # fn example() -> sdf::Result<()> {
//! use sdf::{SdfFile, sdk::fwifc::Fwifc};
//!
//! let file = SdfFile::open(Fwifc::new()?, "110630_174316.sdf")?;
//! println!("{} pulses from {}", file.metadata().pulse_count, file.metadata().instrument);
//! # Ok(())
//! # }
//! ```

use std::ffi::CString;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};

use crate::calibration::{Calibration, CalibrationKind};
use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::scan_line::ScanLines;
use crate::sdk::{HandleKind, RawHeader, Sdk};
use crate::status;

/// Highest format version this crate reads.
pub const SUPPORTED_FORMAT_VERSION: u16 = 1;

/// How the start time of each sample block is reported.
///
/// Absolute times of long captures can lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosblMode {
    /// Relative to the file, preserving maximum precision.
    Relative,
    /// Absolute time.
    Absolute,
}

/// Options applied when opening a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Sample-block time mode; `None` keeps the vendor default.
    pub sosbl_mode: Option<SosblMode>,
}

impl OpenOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the sample-block time mode.
    pub fn sosbl_mode(mut self, mode: SosblMode) -> Self {
        self.sosbl_mode = Some(mode);
        self
    }
}

/// Header information, read once when the file is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Path the file was opened from.
    pub path: PathBuf,
    /// Format version declared by the file.
    pub format_version: u16,
    /// Number of pulse records.
    pub pulse_count: u64,
    /// Number of scan lines, when the file declares it.
    pub scan_line_count: Option<u64>,
    /// The instrument name, e.g. "Q680I".
    pub instrument: String,
    /// The instrument serial number.
    pub serial: String,
    /// The type of external time, or "UNKNOWN".
    pub epoch: String,
    /// External time of the first pulse, in seconds relative to the epoch.
    pub capture_time: f64,
    /// The group velocity in m/s.
    pub v_group: f64,
    /// The sampling interval in seconds.
    pub sampling_time: f64,
    /// True if this file's time was synchronized with GPS time.
    pub gps_synchronized: bool,
    /// The number of mirror facets in the instrument.
    pub num_facets: u16,
}

impl Metadata {
    fn from_raw(path: PathBuf, raw: RawHeader) -> Self {
        Metadata {
            path,
            format_version: raw.format_version,
            pulse_count: raw.pulse_count,
            scan_line_count: raw.scan_line_count,
            instrument: raw.instrument,
            serial: raw.serial,
            epoch: raw.epoch,
            capture_time: raw.capture_time,
            v_group: raw.v_group,
            sampling_time: raw.sampling_time,
            gps_synchronized: raw.gps_synchronized,
            num_facets: raw.num_facets,
        }
    }

    /// Sensor identifier, `instrument` and `serial` joined.
    pub fn sensor_id(&self) -> String {
        format!("{} {}", self.instrument, self.serial)
    }
}

/// An `.sdf` file opened for reading.
///
/// `SdfFile` owns the vendor file handle and releases it when dropped. Header
/// metadata is read once, at open.
///
/// # Thread Safety
///
/// `SdfFile` is `!Send` and `!Sync`; the vendor library is not thread-safe.
///
/// # One traversal at a time
///
/// [`scan_lines`](Self::scan_lines) borrows the file mutably, so only one
/// traversal can be live at once.
///
/// ```compile_fail
/// use sdf::SdfFile;
/// use sdf::sdk::memory::{Fixture, MemorySdk};
///
/// # let tmp = tempfile::NamedTempFile::new().unwrap();
/// let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
/// let mut file = SdfFile::open(sdk, tmp.path()).unwrap();
/// let first = file.scan_lines().unwrap();
/// let second = file.scan_lines().unwrap();
/// drop(first);
/// ```
pub struct SdfFile<S: Sdk> {
    handle: NativeHandle<S>,
    metadata: Metadata,
}

impl<S: Sdk> SdfFile<S> {
    /// Open a file with default options.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the path does not resolve
    /// - [`Error::PermissionDenied`] if the file is not readable
    /// - [`Error::Corrupt`] if the vendor rejects the header
    /// - [`Error::UnsupportedVersion`] if the file is newer than this crate
    pub fn open(sdk: S, path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(sdk, path, &OpenOptions::default())
    }

    /// Open a file with explicit options.
    pub fn open_with(sdk: S, path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        check_path(path)?;

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::invalid_path(path, "path is not valid UTF-8"))?;
        let c_path = CString::new(path_str)?;

        let sdk = Rc::new(sdk);
        let handle = NativeHandle::acquire(&sdk, HandleKind::File, "opening the file", |sdk| {
            sdk.open(&c_path)
        })?;

        // From here on, returning early drops `handle` and closes the file.
        if let Some(mode) = options.sosbl_mode {
            sdk.set_sosbl_relative(handle.raw(), mode == SosblMode::Relative)
                .map_err(|code| status::from_sdk(&*sdk, code).into_error("setting the time mode"))?;
        }

        let header = sdk
            .header(handle.raw())
            .map_err(|code| status::from_sdk(&*sdk, code).into_error("reading the header"))?;

        if header.format_version > SUPPORTED_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: header.format_version,
                supported: SUPPORTED_FORMAT_VERSION,
            });
        }

        let metadata = Metadata::from_raw(path.to_path_buf(), header);
        info!(
            "Opened {} ({} pulses, instrument {})",
            path.display(),
            metadata.pulse_count,
            metadata.sensor_id()
        );

        Ok(SdfFile { handle, metadata })
    }

    /// The header information read at open. Never calls into the vendor
    /// library.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.metadata.path
    }

    /// Start a traversal of the scan lines, from the first one.
    ///
    /// Each call starts a new, independent traversal. The traversal borrows
    /// the file mutably until it is dropped.
    pub fn scan_lines(&mut self) -> Result<ScanLines<'_, S>> {
        let file = self.handle.raw();
        let cursor = NativeHandle::acquire(
            self.handle.sdk_rc(),
            HandleKind::ScanLineCursor,
            "starting the scan-line traversal",
            |sdk| sdk.begin_scan_lines(file),
        )?;
        debug!("Started scan-line traversal of {}", self.metadata.path.display());
        Ok(ScanLines::new(cursor))
    }

    /// Copy one calibration table out of the file.
    pub fn calibration(&self, kind: CalibrationKind) -> Result<Calibration> {
        let table = kind.table()?;
        let sdk = self.handle.sdk();

        let mut calibration = Calibration::default();
        sdk.calibration(self.handle.raw(), table, &mut |abscissa, ordinate| {
            calibration.abscissa = abscissa.to_vec();
            calibration.ordinate = ordinate.to_vec();
        })
        .map_err(|code| status::from_sdk(sdk, code).into_error("reading calibration"))?;

        Ok(calibration)
    }

    /// Close the file now and report how the vendor took it.
    ///
    /// Dropping the file closes it too, but swallows the status.
    pub fn close(self) -> Result<()> {
        self.handle.release()
    }
}

impl<S: Sdk> std::fmt::Debug for SdfFile<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdfFile")
            .field("handle", &self.handle)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Resolve problems with the path before the vendor sees it; the vendor has
/// no status codes for them.
fn check_path(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| Error::from_io(path, &e))?;
    if meta.is_dir() {
        return Err(Error::invalid_path(path, "path is a directory"));
    }
    fs::File::open(path).map_err(|e| Error::from_io(path, &e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::memory::{Fault, Fixture, MemorySdk};
    use sdfifc_sys::{FWIFC_ERR_RUNTIME, FWIFC_ERR_UNSUPPORTED_FORMAT};
    use tempfile::NamedTempFile;

    fn fixture_file() -> NamedTempFile {
        NamedTempFile::new().unwrap()
    }

    #[test]
    fn test_open_nonexistent() {
        let sdk = MemorySdk::new(Fixture::default());
        let result = SdfFile::open(sdk.clone(), "/nonexistent/path/to/file.sdf");

        match result.unwrap_err() {
            Error::NotFound { path } => {
                assert!(path.to_str().unwrap().contains("nonexistent"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert_eq!(sdk.ledger().acquired(HandleKind::File), 0);
    }

    #[test]
    fn test_open_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = SdfFile::open(MemorySdk::new(Fixture::default()), dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_metadata_is_cached() {
        let tmp = fixture_file();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[2, 3]));
        let file = SdfFile::open(sdk.clone(), tmp.path()).unwrap();

        let calls = sdk.ledger().header_calls;
        let metadata = file.metadata();
        assert_eq!(metadata.pulse_count, 5);
        assert_eq!(metadata.scan_line_count, Some(2));
        assert_eq!(metadata.path, tmp.path());
        let _ = file.metadata();
        assert_eq!(sdk.ledger().header_calls, calls);
    }

    #[test]
    fn test_corrupt_header_closes_file() {
        let tmp = fixture_file();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        sdk.inject(Fault::Header(FWIFC_ERR_UNSUPPORTED_FORMAT));

        let err = SdfFile::open(sdk.clone(), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert_eq!(err.code(), Some(FWIFC_ERR_UNSUPPORTED_FORMAT));

        let ledger = sdk.ledger();
        assert_eq!(ledger.acquired(HandleKind::File), 1);
        assert_eq!(ledger.released(HandleKind::File), 1);
    }

    #[test]
    fn test_future_version_rejected() {
        let tmp = fixture_file();
        let mut fixture = Fixture::with_pulses_per_line(&[1]);
        fixture.format_version = SUPPORTED_FORMAT_VERSION + 1;
        let sdk = MemorySdk::new(fixture);

        let err = SdfFile::open(sdk.clone(), tmp.path()).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedVersion {
                found: SUPPORTED_FORMAT_VERSION + 1,
                supported: SUPPORTED_FORMAT_VERSION,
            }
        );
        assert_eq!(sdk.ledger().live(), 0);
    }

    #[test]
    fn test_sosbl_mode_applied() {
        let tmp = fixture_file();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let options = OpenOptions::new().sosbl_mode(SosblMode::Relative);

        let _file = SdfFile::open_with(sdk.clone(), tmp.path(), &options).unwrap();
        assert_eq!(sdk.sosbl_relative(), Some(true));
    }

    #[test]
    fn test_close_reports_status() {
        let tmp = fixture_file();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        sdk.inject(Fault::Close(HandleKind::File, FWIFC_ERR_RUNTIME));

        let file = SdfFile::open(sdk.clone(), tmp.path()).unwrap();
        assert_eq!(file.close().unwrap_err().code(), Some(FWIFC_ERR_RUNTIME));
        assert_eq!(sdk.ledger().released(HandleKind::File), 1);
    }

    #[test]
    fn test_calibration_copied() {
        let tmp = fixture_file();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let file = SdfFile::open(sdk, tmp.path()).unwrap();

        let calib = file
            .calibration(CalibrationKind::Amplitude(crate::Channel::High))
            .unwrap();
        assert!(!calib.is_empty());
        assert_eq!(calib.abscissa.len(), calib.ordinate.len());

        let err = file
            .calibration(CalibrationKind::Range(crate::Channel::Saturation))
            .unwrap_err();
        assert!(matches!(err, Error::NoCalibrationTable { .. }));
    }
}
