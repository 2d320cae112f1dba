//! An in-memory stand-in for the vendor library.
//!
//! [`MemorySdk`] serves records from a [`Fixture`] and behaves like the vendor
//! where it matters to the safe layer:
//!
//! - handles are opaque numbers, and closing one that is not live is an error
//! - sample buffers are shared and overwritten as soon as a pulse callback
//!   returns, so a view kept past the callback would read garbage
//! - failures are reported as status codes with a last-error message
//!
//! It also keeps a [`Ledger`] of every acquisition and release, which is what
//! the crate's own tests assert against. Faults can be injected with
//! [`MemorySdk::inject`].
//!
//! `MemorySdk` is cheap to clone; clones share the same state, so a test can
//! keep one to inspect after handing another to [`SdfFile`](crate::SdfFile).

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use sdfifc_sys::{FWIFC_END_OF_FILE, FWIFC_ERR_BAD_ARG, FWIFC_NO_ERROR};

use super::{
    HandleKind, RawBlock, RawHandle, RawHeader, RawLibraryVersion, RawPulse, RawScanLine, Sdk,
    Status,
};
use crate::calibration::CalibrationTable;

/// Value written over the shared sample buffer after every pulse callback.
pub const SCRIBBLE: u16 = 0xDEAD;

/// One sample block of a fixture pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureBlock {
    /// Start of the sample block, in seconds.
    pub time_sosbl: f64,
    /// Raw channel number; values above 3 are invalid.
    pub channel: u32,
    /// The samples.
    pub samples: Vec<u16>,
}

/// One fixture pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct FixturePulse {
    /// Start of the range gate, in seconds.
    pub time_sorg: f64,
    /// External time, in seconds.
    pub time_external: f64,
    /// Origin vector.
    pub origin: [f64; 3],
    /// Direction vector.
    pub direction: [f64; 3],
    /// Mirror facet.
    pub facet: u16,
    /// Sample blocks.
    pub blocks: Vec<FixtureBlock>,
}

/// One fixture scan line.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureScanLine {
    /// External time of the scan line, in seconds.
    pub timestamp: f64,
    /// Mirror facet.
    pub facet: u16,
    /// Pulses, in file order.
    pub pulses: Vec<FixturePulse>,
}

/// The contents of one in-memory file.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// Format version reported by the header.
    pub format_version: u16,
    /// Instrument name.
    pub instrument: String,
    /// Instrument serial number.
    pub serial: String,
    /// Type of external time.
    pub epoch: String,
    /// Group velocity in m/s.
    pub v_group: f64,
    /// Sampling interval in seconds.
    pub sampling_time: f64,
    /// Whether external time was synchronized with GPS.
    pub gps_synchronized: bool,
    /// Number of mirror facets.
    pub num_facets: u16,
    /// Scan lines, in file order.
    pub scan_lines: Vec<FixtureScanLine>,
    /// Calibration tables as `(table, abscissa, ordinate)`.
    pub calibrations: Vec<(CalibrationTable, Vec<f64>, Vec<f64>)>,
}

impl Fixture {
    /// A file with one scan line per entry, each holding that many pulses.
    ///
    /// Pulse `i` (counting across the whole file) has a high-channel block of
    /// eight samples `10 * i + k` and a reference block of four samples.
    /// Every field is deterministic.
    pub fn with_pulses_per_line(counts: &[usize]) -> Self {
        let num_facets = 4;
        let mut next = 0u64;
        let scan_lines = counts
            .iter()
            .enumerate()
            .map(|(line, &count)| {
                let facet = (line % num_facets as usize) as u16;
                let pulses: Vec<FixturePulse> = (0..count)
                    .map(|_| {
                        let pulse = fixture_pulse(next, facet);
                        next += 1;
                        pulse
                    })
                    .collect();
                FixtureScanLine {
                    timestamp: pulses.first().map_or(0.0, |p| p.time_external),
                    facet,
                    pulses,
                }
            })
            .collect();

        let abscissa: Vec<f64> = (0..16u8).map(f64::from).collect();
        let calibrations = [
            CalibrationTable::AmplitudeHigh,
            CalibrationTable::AmplitudeLow,
            CalibrationTable::RangeHigh,
            CalibrationTable::RangeLow,
        ]
        .into_iter()
        .enumerate()
        .map(|(n, table)| {
            let ordinate = abscissa.iter().map(|x| x * (n + 1) as f64).collect();
            (table, abscissa.clone(), ordinate)
        })
        .collect();

        Fixture {
            format_version: 1,
            instrument: "Q680I".to_string(),
            serial: "9998212".to_string(),
            epoch: "UNKNOWN".to_string(),
            v_group: 299_706_720.0,
            sampling_time: 1e-9,
            gps_synchronized: true,
            num_facets,
            scan_lines,
            calibrations,
        }
    }

    /// Total number of pulses.
    pub fn pulse_count(&self) -> u64 {
        self.scan_lines.iter().map(|l| l.pulses.len() as u64).sum()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture::with_pulses_per_line(&[])
    }
}

fn fixture_pulse(index: u64, facet: u16) -> FixturePulse {
    let t = index as f64 * 1e-5;
    let base = (index * 10) as u16;
    FixturePulse {
        time_sorg: t,
        time_external: 1000.0 + t,
        origin: [0.0, 0.0, 0.0],
        direction: [1.0, 0.0, 0.0],
        facet,
        blocks: vec![
            FixtureBlock {
                time_sosbl: t,
                channel: 0,
                samples: (0..8).map(|k| base.wrapping_add(k)).collect(),
            },
            FixtureBlock {
                time_sosbl: t + 1e-7,
                channel: 3,
                samples: vec![base; 4],
            },
        ],
    }
}

/// A failure to report instead of the normal outcome of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every `open` fails with this status.
    Open(Status),
    /// Every `header` fails with this status.
    Header(Status),
    /// Advancing a scan-line cursor onto scan line `at` fails.
    ScanLine {
        /// Zero-based scan-line index.
        at: u64,
        /// Status to report.
        status: Status,
    },
    /// Advancing onto pulse `at` of scan line `line` fails.
    Pulse {
        /// Zero-based scan-line index.
        line: u64,
        /// Zero-based pulse index within the scan line.
        at: u64,
        /// Status to report.
        status: Status,
    },
    /// Closing a handle of this kind reports this status. The handle is
    /// released regardless.
    Close(HandleKind, Status),
}

/// A snapshot of handle and call bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    acquired: HashMap<HandleKind, u64>,
    released: HashMap<HandleKind, u64>,
    live: usize,
    /// Closes of handles that were not live.
    pub invalid_releases: u64,
    /// Calls to `header`.
    pub header_calls: u64,
    /// Calls to `next_scan_line`.
    pub scan_line_calls: u64,
    /// Calls to `next_pulse`.
    pub pulse_calls: u64,
}

impl Ledger {
    /// Handles acquired, per kind.
    pub fn acquired(&self, kind: HandleKind) -> u64 {
        self.acquired.get(&kind).copied().unwrap_or(0)
    }

    /// Handles released, per kind.
    pub fn released(&self, kind: HandleKind) -> u64 {
        self.released.get(&kind).copied().unwrap_or(0)
    }

    /// Handles currently live, of any kind.
    pub fn live(&self) -> usize {
        self.live
    }
}

#[derive(Debug)]
enum Resource {
    File,
    ScanLines { next: usize, current: Option<usize> },
    Pulses { line: usize, next: usize },
}

impl Resource {
    fn kind(&self) -> HandleKind {
        match self {
            Resource::File => HandleKind::File,
            Resource::ScanLines { .. } => HandleKind::ScanLineCursor,
            Resource::Pulses { .. } => HandleKind::PulseCursor,
        }
    }
}

#[derive(Debug)]
struct State {
    fixture: Fixture,
    faults: Vec<Fault>,
    resources: HashMap<u64, Resource>,
    next_id: u64,
    ledger: Ledger,
    last_error: String,
    sosbl_relative: Option<bool>,
}

impl State {
    fn fail(&mut self, code: Status, message: impl Into<String>) -> Status {
        self.last_error = message.into();
        code
    }

    fn insert(&mut self, resource: Resource) -> RawHandle {
        self.next_id += 1;
        let kind = resource.kind();
        self.resources.insert(self.next_id, resource);
        *self.ledger.acquired.entry(kind).or_insert(0) += 1;
        RawHandle(self.next_id)
    }

    fn expect_file(&mut self, handle: RawHandle) -> Result<(), Status> {
        match self.resources.get(&handle.0) {
            Some(Resource::File) => Ok(()),
            _ => Err(self.fail(FWIFC_ERR_BAD_ARG, format!("{} is not an open file", handle))),
        }
    }

    fn line_start(&self, line: usize) -> u64 {
        self.fixture.scan_lines[..line]
            .iter()
            .map(|l| l.pulses.len() as u64)
            .sum()
    }
}

/// A vendor stand-in backed by a [`Fixture`].
#[derive(Debug, Clone)]
pub struct MemorySdk {
    state: Rc<RefCell<State>>,
    buffer: Rc<RefCell<Vec<u16>>>,
}

impl MemorySdk {
    /// Serve `fixture`, with no faults.
    pub fn new(fixture: Fixture) -> Self {
        MemorySdk {
            state: Rc::new(RefCell::new(State {
                fixture,
                faults: Vec::new(),
                resources: HashMap::new(),
                next_id: 0,
                ledger: Ledger::default(),
                last_error: String::new(),
                sosbl_relative: None,
            })),
            buffer: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Report `fault` from now on.
    pub fn inject(&self, fault: Fault) {
        self.state.borrow_mut().faults.push(fault);
    }

    /// A snapshot of the bookkeeping so far.
    pub fn ledger(&self) -> Ledger {
        let state = self.state.borrow();
        let mut ledger = state.ledger.clone();
        ledger.live = state.resources.len();
        ledger
    }

    /// The sample-block time mode last set, if any.
    pub fn sosbl_relative(&self) -> Option<bool> {
        self.state.borrow().sosbl_relative
    }
}

impl Sdk for MemorySdk {
    fn open(&self, path: &CStr) -> Result<RawHandle, Status> {
        let mut state = self.state.borrow_mut();
        let fault = state.faults.iter().find_map(|f| match *f {
            Fault::Open(code) => Some(code),
            _ => None,
        });
        if let Some(code) = fault {
            return Err(state.fail(code, format!("cannot open {}", path.to_string_lossy())));
        }
        state.last_error.clear();
        Ok(state.insert(Resource::File))
    }

    fn header(&self, file: RawHandle) -> Result<RawHeader, Status> {
        let mut state = self.state.borrow_mut();
        state.ledger.header_calls += 1;
        state.expect_file(file)?;

        let fault = state.faults.iter().find_map(|f| match *f {
            Fault::Header(code) => Some(code),
            _ => None,
        });
        if let Some(code) = fault {
            return Err(state.fail(code, "header is unreadable"));
        }

        let fixture = &state.fixture;
        Ok(RawHeader {
            format_version: fixture.format_version,
            pulse_count: fixture.pulse_count(),
            scan_line_count: Some(fixture.scan_lines.len() as u64),
            instrument: fixture.instrument.clone(),
            serial: fixture.serial.clone(),
            epoch: fixture.epoch.clone(),
            capture_time: fixture.scan_lines.first().map_or(0.0, |l| l.timestamp),
            v_group: fixture.v_group,
            sampling_time: fixture.sampling_time,
            gps_synchronized: fixture.gps_synchronized,
            num_facets: fixture.num_facets,
        })
    }

    fn set_sosbl_relative(&self, file: RawHandle, relative: bool) -> Result<(), Status> {
        let mut state = self.state.borrow_mut();
        state.expect_file(file)?;
        state.sosbl_relative = Some(relative);
        Ok(())
    }

    fn begin_scan_lines(&self, file: RawHandle) -> Result<RawHandle, Status> {
        let mut state = self.state.borrow_mut();
        state.expect_file(file)?;
        Ok(state.insert(Resource::ScanLines {
            next: 0,
            current: None,
        }))
    }

    fn next_scan_line(&self, cursor: RawHandle) -> Result<RawScanLine, Status> {
        let mut state = self.state.borrow_mut();
        state.ledger.scan_line_calls += 1;

        let next = match state.resources.get(&cursor.0) {
            Some(Resource::ScanLines { next, .. }) => *next,
            _ => {
                return Err(state.fail(
                    FWIFC_ERR_BAD_ARG,
                    format!("{} is not a scan-line cursor", cursor),
                ))
            }
        };

        let fault = state.faults.iter().find_map(|f| match *f {
            Fault::ScanLine { at, status } if at == next as u64 => Some(status),
            _ => None,
        });
        if let Some(code) = fault {
            return Err(state.fail(code, format!("scan line {} is unreadable", next)));
        }

        let line = state.fixture.scan_lines.get(next).map(|l| RawScanLine {
            index: next as u64,
            timestamp: l.timestamp,
            facet: l.facet,
            pulse_count: l.pulses.len() as u64,
        });
        let (advanced, current) = match line {
            Some(_) => (next + 1, Some(next)),
            None => (next, None),
        };
        if let Some(Resource::ScanLines { next, current: cur }) =
            state.resources.get_mut(&cursor.0)
        {
            *next = advanced;
            *cur = current;
        }
        line.ok_or(FWIFC_END_OF_FILE)
    }

    fn begin_pulses(&self, scan_lines: RawHandle) -> Result<RawHandle, Status> {
        let mut state = self.state.borrow_mut();
        let line = match state.resources.get(&scan_lines.0) {
            Some(Resource::ScanLines {
                current: Some(line), ..
            }) => *line,
            _ => {
                return Err(state.fail(
                    FWIFC_ERR_BAD_ARG,
                    format!("{} is not on a scan line", scan_lines),
                ))
            }
        };
        Ok(state.insert(Resource::Pulses { line, next: 0 }))
    }

    fn next_pulse(
        &self,
        cursor: RawHandle,
        visit: &mut dyn FnMut(&RawPulse<'_>),
    ) -> Result<(), Status> {
        let (index, pulse) = {
            let mut state = self.state.borrow_mut();
            state.ledger.pulse_calls += 1;

            let (line, next) = match state.resources.get(&cursor.0) {
                Some(Resource::Pulses { line, next }) => (*line, *next),
                _ => {
                    return Err(state.fail(
                        FWIFC_ERR_BAD_ARG,
                        format!("{} is not a pulse cursor", cursor),
                    ))
                }
            };

            let fault = state.faults.iter().find_map(|f| match *f {
                Fault::Pulse { line: l, at, status } if l == line as u64 && at == next as u64 => {
                    Some(status)
                }
                _ => None,
            });
            if let Some(code) = fault {
                let reason = format!("pulse {} of scan line {} is unreadable", next, line);
                return Err(state.fail(code, reason));
            }

            let pulse = match state.fixture.scan_lines[line].pulses.get(next) {
                Some(pulse) => pulse.clone(),
                None => return Err(FWIFC_END_OF_FILE),
            };
            if let Some(Resource::Pulses { next, .. }) = state.resources.get_mut(&cursor.0) {
                *next += 1;
            }
            (state.line_start(line) + next as u64, pulse)
        };

        let mut buffer = self.buffer.borrow_mut();
        buffer.clear();
        let mut ranges = Vec::with_capacity(pulse.blocks.len());
        for block in &pulse.blocks {
            let start = buffer.len();
            buffer.extend_from_slice(&block.samples);
            ranges.push(start..buffer.len());
        }

        {
            let samples: &[u16] = &buffer;
            let blocks = pulse
                .blocks
                .iter()
                .zip(ranges)
                .map(|(block, range)| RawBlock {
                    time_sosbl: block.time_sosbl,
                    channel: block.channel,
                    samples: &samples[range],
                })
                .collect();
            let raw = RawPulse {
                index,
                time_sorg: pulse.time_sorg,
                time_external: pulse.time_external,
                origin: pulse.origin,
                direction: pulse.direction,
                synchronized: true,
                sync_lastsec: true,
                housekeeping: false,
                facet: pulse.facet,
                blocks,
            };
            visit(&raw);
        }

        buffer.iter_mut().for_each(|s| *s = SCRIBBLE);
        Ok(())
    }

    fn calibration(
        &self,
        file: RawHandle,
        table: CalibrationTable,
        visit: &mut dyn FnMut(&[f64], &[f64]),
    ) -> Result<(), Status> {
        let (abscissa, ordinate) = {
            let mut state = self.state.borrow_mut();
            state.expect_file(file)?;
            match state.fixture.calibrations.iter().find(|(t, _, _)| *t == table) {
                Some((_, abscissa, ordinate)) => (abscissa.clone(), ordinate.clone()),
                None => {
                    return Err(state.fail(
                        FWIFC_ERR_BAD_ARG,
                        format!("no calibration table {:?}", table),
                    ))
                }
            }
        };
        visit(&abscissa, &ordinate);
        Ok(())
    }

    fn close(&self, handle: RawHandle, kind: HandleKind) -> Status {
        let mut state = self.state.borrow_mut();
        let live = state.resources.get(&handle.0).map_or(false, |r| r.kind() == kind);
        if !live {
            state.ledger.invalid_releases += 1;
            return state.fail(FWIFC_ERR_BAD_ARG, format!("{} is not a live {}", handle, kind));
        }

        state.resources.remove(&handle.0);
        *state.ledger.released.entry(kind).or_insert(0) += 1;

        let fault = state.faults.iter().find_map(|f| match *f {
            Fault::Close(k, code) if k == kind => Some(code),
            _ => None,
        });
        match fault {
            Some(code) => state.fail(code, format!("closing {} failed", handle)),
            None => FWIFC_NO_ERROR,
        }
    }

    fn last_error(&self) -> String {
        self.state.borrow().last_error.clone()
    }

    fn library_version(&self) -> Result<RawLibraryVersion, Status> {
        Ok(RawLibraryVersion {
            api_major: 1,
            api_minor: 0,
            build_version: "memory".to_string(),
            build_tag: "fixture".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn path() -> CString {
        CString::new("scan.sdf").unwrap()
    }

    #[test]
    fn test_fixture_counts() {
        let fixture = Fixture::with_pulses_per_line(&[10, 12, 8]);
        assert_eq!(fixture.scan_lines.len(), 3);
        assert_eq!(fixture.pulse_count(), 30);
        assert_eq!(fixture.scan_lines[1].pulses[0].blocks[0].samples[0], 100);
    }

    #[test]
    fn test_buffer_scribbled_after_visit() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let file = sdk.open(&path()).unwrap();
        let lines = sdk.begin_scan_lines(file).unwrap();
        sdk.next_scan_line(lines).unwrap();
        let pulses = sdk.begin_pulses(lines).unwrap();

        let mut seen = Vec::new();
        sdk.next_pulse(pulses, &mut |p| seen = p.blocks[0].samples.to_vec())
            .unwrap();
        assert_eq!(seen, (0..8).collect::<Vec<u16>>());
        assert!(sdk.buffer.borrow().iter().all(|&s| s == SCRIBBLE));
        assert_eq!(sdk.next_pulse(pulses, &mut |_| {}), Err(FWIFC_END_OF_FILE));
    }

    #[test]
    fn test_close_unknown_handle() {
        let sdk = MemorySdk::new(Fixture::default());
        let file = sdk.open(&path()).unwrap();
        assert_eq!(sdk.close(file, HandleKind::File), FWIFC_NO_ERROR);
        assert_eq!(sdk.close(file, HandleKind::File), FWIFC_ERR_BAD_ARG);
        assert!(!sdk.last_error().is_empty());

        let ledger = sdk.ledger();
        assert_eq!(ledger.released(HandleKind::File), 1);
        assert_eq!(ledger.invalid_releases, 1);
    }

    #[test]
    fn test_pulses_need_current_line() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let file = sdk.open(&path()).unwrap();
        let lines = sdk.begin_scan_lines(file).unwrap();
        assert_eq!(sdk.begin_pulses(lines), Err(FWIFC_ERR_BAD_ARG));
    }
}
