//! The vendor SDK, through `libsdfifc`.
//!
//! `libsdfifc` has a single read position per file and no notion of scan
//! lines. [`Fwifc`] layers cursors over it:
//!
//! - a scan line is a run of consecutive records from the same mirror facet
//! - every cursor remembers its own record index and seeks there before each
//!   read, so a scan-line cursor and the pulse cursor below it do not disturb
//!   each other
//!
//! Grouping reads every record of a scan line once before its pulses are
//! read, so a full traversal reads the file twice.
//!
//! Record indexes are 1-based in the vendor library and 0-based everywhere
//! else in this crate.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;
use std::slice;
use std::sync::Mutex;

use log::{debug, info, warn};
use sdfifc_sys::{
    fwifc_close, fwifc_file, fwifc_get_calib, fwifc_get_info, fwifc_get_last_error,
    fwifc_get_library_version, fwifc_open, fwifc_read, fwifc_reindex, fwifc_sbl_t, fwifc_seek,
    fwifc_set_sosbl_relative, fwifc_tell, FWIFC_CALIB_AMPL_CH0, FWIFC_CALIB_AMPL_CH1,
    FWIFC_CALIB_RNG_CH0, FWIFC_CALIB_RNG_CH1, FWIFC_END_OF_FILE, FWIFC_ERR_BAD_ARG,
    FWIFC_INFO_GPS_SYNCHRONIZED, FWIFC_NO_ERROR, FWIFC_READ_HOUSEKEEPING,
    FWIFC_READ_SYNCHRONIZED, FWIFC_READ_SYNC_LASTSEC, FWIFC_SEEK_END,
};

use super::claim::{Claim, Owner};
use super::{
    HandleKind, RawBlock, RawHandle, RawHeader, RawLibraryVersion, RawPulse, RawScanLine, Sdk,
    Status,
};
use crate::calibration::CalibrationTable;

/// Format version of every file `libsdfifc` opens; the library reports none.
const FORMAT_VERSION: u16 = 1;

/// The thread currently allowed to call `libsdfifc`.
static LIBRARY: Owner = Mutex::new(None);

#[derive(Debug, Clone, Copy)]
enum Resource {
    File(fwifc_file),
    ScanLines {
        file: fwifc_file,
        /// 1-based record index of the next scan line's first record.
        next: u32,
        /// Zero-based index of the next scan line.
        line: u64,
        /// `(first record, record count)` of the scan line last returned.
        current: Option<(u32, u32)>,
    },
    Pulses {
        file: fwifc_file,
        next: u32,
        end: u32,
    },
}

impl Resource {
    fn kind(&self) -> HandleKind {
        match self {
            Resource::File(_) => HandleKind::File,
            Resource::ScanLines { .. } => HandleKind::ScanLineCursor,
            Resource::Pulses { .. } => HandleKind::PulseCursor,
        }
    }
}

/// The fields of one record, before the sample blocks are looked at.
struct Record {
    time_sorg: f64,
    time_external: f64,
    origin: [f64; 3],
    direction: [f64; 3],
    flags: u16,
    facet: u16,
    sbl_count: u32,
    sbl: *mut fwifc_sbl_t,
}

/// `libsdfifc`, behind the [`Sdk`] boundary.
///
/// The vendor library is not thread-safe and keeps its last error in
/// process-wide state. `Fwifc` is neither `Send` nor `Sync`, and while any
/// `Fwifc` is alive the library belongs to the thread that created it.
#[derive(Debug)]
pub struct Fwifc {
    resources: RefCell<HashMap<u64, Resource>>,
    next_id: Cell<u64>,
    // Dropped after every leftover file is closed.
    _claim: Claim,
}

impl Fwifc {
    /// A fresh instance with no open files.
    ///
    /// Several instances may live on one thread at once.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`](crate::Error::InvalidState) while a `Fwifc`
    /// is alive on another thread.
    pub fn new() -> crate::Result<Self> {
        Ok(Fwifc {
            resources: RefCell::default(),
            next_id: Cell::default(),
            _claim: Claim::take(&LIBRARY)?,
        })
    }

    fn insert(&self, resource: Resource) -> RawHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.resources.borrow_mut().insert(id, resource);
        RawHandle(id)
    }

    fn get(&self, handle: RawHandle) -> Result<Resource, Status> {
        self.resources
            .borrow()
            .get(&handle.0)
            .copied()
            .ok_or(FWIFC_ERR_BAD_ARG)
    }

    fn update(&self, handle: RawHandle, resource: Resource) {
        self.resources.borrow_mut().insert(handle.0, resource);
    }

    fn file(&self, handle: RawHandle) -> Result<fwifc_file, Status> {
        match self.get(handle)? {
            Resource::File(file) => Ok(file),
            _ => Err(FWIFC_ERR_BAD_ARG),
        }
    }
}

impl Drop for Fwifc {
    fn drop(&mut self) {
        for (_, resource) in self.resources.get_mut().drain() {
            if let Resource::File(file) = resource {
                warn!("Closing a file left open at shutdown");
                // SAFETY: `file` came from a successful `fwifc_open` and was
                // never closed; it is removed from the table here.
                unsafe { fwifc_close(file) };
            }
        }
    }
}

fn check(code: Status) -> Result<(), Status> {
    if code == FWIFC_NO_ERROR {
        Ok(())
    } else {
        Err(code)
    }
}

/// Copy a vendor string; null becomes empty.
///
/// # Safety
///
/// `ptr` is null or points to a NUL-terminated string.
unsafe fn string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

fn seek(file: fwifc_file, index: u32) -> Result<(), Status> {
    // SAFETY: `file` is a live handle from the resource table.
    check(unsafe { fwifc_seek(file, index) })
}

fn tell(file: fwifc_file) -> Result<u32, Status> {
    let mut index = 0u32;
    // SAFETY: `file` is live and `index` is a valid out-pointer.
    check(unsafe { fwifc_tell(file, &mut index) })?;
    Ok(index)
}

fn read(file: fwifc_file) -> Result<Record, Status> {
    let mut record = Record {
        time_sorg: 0.0,
        time_external: 0.0,
        origin: [0.0; 3],
        direction: [0.0; 3],
        flags: 0,
        facet: 0,
        sbl_count: 0,
        sbl: ptr::null_mut(),
    };
    let mut sbl_size = 0u32;
    // SAFETY: `file` is live and every out-pointer refers to a local of the
    // matching type; `origin` and `direction` have room for three doubles.
    let code = unsafe {
        fwifc_read(
            file,
            &mut record.time_sorg,
            &mut record.time_external,
            record.origin.as_mut_ptr(),
            record.direction.as_mut_ptr(),
            &mut record.flags,
            &mut record.facet,
            &mut record.sbl_count,
            &mut sbl_size,
            &mut record.sbl,
        )
    };
    check(code)?;
    Ok(record)
}

/// Read one record and return its facet.
fn read_facet(file: fwifc_file) -> Result<Option<u16>, Status> {
    match read(file) {
        Ok(record) => Ok(Some(record.facet)),
        Err(FWIFC_END_OF_FILE) => Ok(None),
        Err(code) => Err(code),
    }
}

impl Sdk for Fwifc {
    fn open(&self, path: &CStr) -> Result<RawHandle, Status> {
        let mut file: fwifc_file = ptr::null_mut();
        // SAFETY: `path` is NUL-terminated and `file` is a valid out-pointer.
        check(unsafe { fwifc_open(path.as_ptr(), &mut file) })?;
        if file.is_null() {
            return Err(FWIFC_ERR_BAD_ARG);
        }

        let path = path.to_string_lossy();
        if !Path::new(&*path).with_extension("idx").is_file() {
            info!("Indexing {}", path);
            // SAFETY: `file` was just opened.
            if let Err(code) = check(unsafe { fwifc_reindex(file) }) {
                // SAFETY: `file` is open and not yet in the table.
                unsafe { fwifc_close(file) };
                return Err(code);
            }
        }
        Ok(self.insert(Resource::File(file)))
    }

    fn header(&self, handle: RawHandle) -> Result<RawHeader, Status> {
        let file = self.file(handle)?;

        let mut instrument = ptr::null();
        let mut serial = ptr::null();
        let mut epoch = ptr::null();
        let mut v_group = 0.0;
        let mut sampling_time = 0.0;
        let mut flags = 0u16;
        let mut num_facets = 0u16;
        // SAFETY: `file` is live and every out-pointer refers to a local of
        // the matching type.
        check(unsafe {
            fwifc_get_info(
                file,
                &mut instrument,
                &mut serial,
                &mut epoch,
                &mut v_group,
                &mut sampling_time,
                &mut flags,
                &mut num_facets,
            )
        })?;
        // SAFETY: the strings are NUL-terminated and live until the next call
        // into the library; they are copied before then.
        let (instrument, serial, epoch) =
            unsafe { (string(instrument), string(serial), string(epoch)) };

        seek(file, 1)?;
        let capture_time = match read(file) {
            Ok(record) => record.time_external,
            Err(FWIFC_END_OF_FILE) => 0.0,
            Err(code) => return Err(code),
        };

        seek(file, FWIFC_SEEK_END)?;
        let pulse_count = match read(file) {
            Ok(_) => u64::from(tell(file)?.saturating_sub(1)),
            Err(FWIFC_END_OF_FILE) => 0,
            Err(code) => return Err(code),
        };
        seek(file, 1)?;

        Ok(RawHeader {
            format_version: FORMAT_VERSION,
            pulse_count,
            scan_line_count: None,
            instrument,
            serial,
            epoch,
            capture_time,
            v_group,
            sampling_time,
            gps_synchronized: flags & FWIFC_INFO_GPS_SYNCHRONIZED != 0,
            num_facets,
        })
    }

    fn set_sosbl_relative(&self, handle: RawHandle, relative: bool) -> Result<(), Status> {
        let file = self.file(handle)?;
        // SAFETY: `file` is live.
        check(unsafe { fwifc_set_sosbl_relative(file, i32::from(relative)) })
    }

    fn begin_scan_lines(&self, handle: RawHandle) -> Result<RawHandle, Status> {
        let file = self.file(handle)?;
        Ok(self.insert(Resource::ScanLines {
            file,
            next: 1,
            line: 0,
            current: None,
        }))
    }

    fn next_scan_line(&self, cursor: RawHandle) -> Result<RawScanLine, Status> {
        let (file, start, line) = match self.get(cursor)? {
            Resource::ScanLines { file, next, line, .. } => (file, next, line),
            _ => return Err(FWIFC_ERR_BAD_ARG),
        };

        seek(file, start)?;
        let first = match read(file) {
            Ok(record) => record,
            Err(code) => {
                if code == FWIFC_END_OF_FILE {
                    self.update(
                        cursor,
                        Resource::ScanLines {
                            file,
                            next: start,
                            line,
                            current: None,
                        },
                    );
                }
                return Err(code);
            }
        };

        let mut count = 1u32;
        while read_facet(file)? == Some(first.facet) {
            count += 1;
        }

        self.update(
            cursor,
            Resource::ScanLines {
                file,
                next: start + count,
                line: line + 1,
                current: Some((start, count)),
            },
        );
        Ok(RawScanLine {
            index: line,
            timestamp: first.time_external,
            facet: first.facet,
            pulse_count: u64::from(count),
        })
    }

    fn begin_pulses(&self, scan_lines: RawHandle) -> Result<RawHandle, Status> {
        match self.get(scan_lines)? {
            Resource::ScanLines {
                file,
                current: Some((start, count)),
                ..
            } => Ok(self.insert(Resource::Pulses {
                file,
                next: start,
                end: start + count,
            })),
            _ => Err(FWIFC_ERR_BAD_ARG),
        }
    }

    fn next_pulse(
        &self,
        cursor: RawHandle,
        visit: &mut dyn FnMut(&RawPulse<'_>),
    ) -> Result<(), Status> {
        let (file, next, end) = match self.get(cursor)? {
            Resource::Pulses { file, next, end } => (file, next, end),
            _ => return Err(FWIFC_ERR_BAD_ARG),
        };
        if next >= end {
            return Err(FWIFC_END_OF_FILE);
        }

        seek(file, next)?;
        let record = read(file)?;
        self.update(
            cursor,
            Resource::Pulses {
                file,
                next: next + 1,
                end,
            },
        );

        let sbls: &[fwifc_sbl_t] = if record.sbl.is_null() || record.sbl_count == 0 {
            &[]
        } else {
            // SAFETY: the library hands out `sbl_count` contiguous blocks that
            // stay valid until the next read on this file, which cannot
            // happen before `visit` returns.
            unsafe { slice::from_raw_parts(record.sbl, record.sbl_count as usize) }
        };
        let blocks = sbls
            .iter()
            .map(|sbl| RawBlock {
                time_sosbl: sbl.time_sosbl,
                channel: sbl.channel,
                samples: if sbl.sample.is_null() || sbl.sample_count == 0 {
                    &[]
                } else {
                    // SAFETY: as above; each block points at `sample_count`
                    // samples in the same vendor buffer.
                    unsafe { slice::from_raw_parts(sbl.sample, sbl.sample_count as usize) }
                },
            })
            .collect();

        visit(&RawPulse {
            index: u64::from(next - 1),
            time_sorg: record.time_sorg,
            time_external: record.time_external,
            origin: record.origin,
            direction: record.direction,
            synchronized: record.flags & FWIFC_READ_SYNCHRONIZED != 0,
            sync_lastsec: record.flags & FWIFC_READ_SYNC_LASTSEC != 0,
            housekeeping: record.flags & FWIFC_READ_HOUSEKEEPING != 0,
            facet: record.facet,
            blocks,
        });
        Ok(())
    }

    fn calibration(
        &self,
        handle: RawHandle,
        table: CalibrationTable,
        visit: &mut dyn FnMut(&[f64], &[f64]),
    ) -> Result<(), Status> {
        let file = self.file(handle)?;
        let kind = match table {
            CalibrationTable::AmplitudeHigh => FWIFC_CALIB_AMPL_CH0,
            CalibrationTable::AmplitudeLow => FWIFC_CALIB_AMPL_CH1,
            CalibrationTable::RangeHigh => FWIFC_CALIB_RNG_CH0,
            CalibrationTable::RangeLow => FWIFC_CALIB_RNG_CH1,
        };

        let mut count = 0u32;
        let mut abscissa = ptr::null();
        let mut ordinate = ptr::null();
        // SAFETY: `file` is live and the out-pointers refer to locals.
        check(unsafe { fwifc_get_calib(file, kind, &mut count, &mut abscissa, &mut ordinate) })?;

        if count == 0 || abscissa.is_null() || ordinate.is_null() {
            visit(&[], &[]);
        } else {
            // SAFETY: both tables hold `count` doubles, valid until the next
            // call into the library.
            let (abscissa, ordinate) = unsafe {
                (
                    slice::from_raw_parts(abscissa, count as usize),
                    slice::from_raw_parts(ordinate, count as usize),
                )
            };
            visit(abscissa, ordinate);
        }
        Ok(())
    }

    fn close(&self, handle: RawHandle, kind: HandleKind) -> Status {
        let resource = {
            let mut resources = self.resources.borrow_mut();
            let live = resources.get(&handle.0).map_or(false, |r| r.kind() == kind);
            if live {
                resources.remove(&handle.0)
            } else {
                None
            }
        };
        match resource {
            // SAFETY: the handle was live and is now out of the table, so it is
            // closed exactly once.
            Some(Resource::File(file)) => unsafe { fwifc_close(file) },
            Some(_) => FWIFC_NO_ERROR,
            None => {
                debug!("Close of unknown {} handle {}", kind, handle);
                FWIFC_ERR_BAD_ARG
            }
        }
    }

    fn last_error(&self) -> String {
        let mut message = ptr::null();
        // SAFETY: `message` is a valid out-pointer; the string it receives is
        // copied immediately.
        unsafe {
            if fwifc_get_last_error(&mut message) != FWIFC_NO_ERROR {
                return String::new();
            }
            string(message)
        }
    }

    fn library_version(&self) -> Result<RawLibraryVersion, Status> {
        let mut api_major = 0u16;
        let mut api_minor = 0u16;
        let mut build_version = ptr::null();
        let mut build_tag = ptr::null();
        // SAFETY: every out-pointer refers to a local of the matching type; the
        // strings are copied before any other call.
        unsafe {
            check(fwifc_get_library_version(
                &mut api_major,
                &mut api_minor,
                &mut build_version,
                &mut build_tag,
            ))?;
            Ok(RawLibraryVersion {
                api_major,
                api_minor,
                build_version: string(build_version),
                build_tag: string(build_tag),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_library_is_pinned_to_one_thread() {
        let first = Fwifc::new().unwrap();
        let second = Fwifc::new().unwrap();

        let elsewhere = thread::spawn(|| Fwifc::new().map(drop)).join().unwrap();
        assert_eq!(elsewhere.unwrap_err().kind(), "invalid-state");

        drop(first);
        drop(second);
        thread::spawn(|| Fwifc::new().map(drop))
            .join()
            .unwrap()
            .unwrap();
    }
}
