//! Pulse traversal.
//!
//! Pulses are read one scan line at a time through [`Pulses`], created by
//! [`ScanLines::pulses()`](crate::ScanLines::pulses).

use std::fmt;
use std::marker::PhantomData;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::scan_line::ScanLine;
use crate::sdk::{RawHandle, RawPulse, Sdk};
use crate::status::{self, Signal};
use crate::waveform::Waveform;

/// One laser pulse and its digitized waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    /// Zero-based position of the pulse in the file.
    pub index: u64,
    /// The start of the range gate, in seconds.
    pub time_sorg: f64,
    /// The external time in seconds relative to epoch.
    pub time_external: f64,
    /// The origin vector, in meters.
    pub origin: [f64; 3],
    /// The direction vector (dimensionless).
    pub direction: [f64; 3],
    /// Is this pulse GPS synchronized?
    pub synchronized: bool,
    /// Has this pulse been synchronized within the last second?
    pub sync_lastsec: bool,
    /// Is this a housekeeping block?
    pub housekeeping: bool,
    /// The mirror facet number.
    pub facet: u16,
    /// The sample blocks, copied out of the vendor buffers.
    pub waveform: Waveform,
}

impl Pulse {
    /// Copy a vendor pulse view into an owned record.
    fn copy_from(raw: &RawPulse<'_>) -> Result<Pulse> {
        Ok(Pulse {
            index: raw.index,
            time_sorg: raw.time_sorg,
            time_external: raw.time_external,
            origin: raw.origin,
            direction: raw.direction,
            synchronized: raw.synchronized,
            sync_lastsec: raw.sync_lastsec,
            housekeeping: raw.housekeeping,
            facet: raw.facet,
            waveform: Waveform::copy_from(&raw.blocks)?,
        })
    }
}

impl fmt::Display for Pulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index: {}\ntime_sorg: {}\ntime_external: {}\norigin: {} {} {}\ndirection: {} {} {}\n\
             synchronized: {}\nsync_lastsec: {}\nhousekeeping: {}\nfacet: {}\nnblocks: {}",
            self.index,
            self.time_sorg,
            self.time_external,
            self.origin[0],
            self.origin[1],
            self.origin[2],
            self.direction[0],
            self.direction[1],
            self.direction[2],
            self.synchronized,
            self.sync_lastsec,
            self.housekeeping,
            self.facet,
            self.waveform.blocks().len()
        )
    }
}

/// Lazy, forward-only traversal of the pulses of one scan line.
///
/// Borrows the parent [`ScanLines`](crate::ScanLines) mutably: the scan-line
/// cursor cannot advance, and the file cannot close, while this is alive.
/// Same terminal behavior as the scan-line traversal.
pub struct Pulses<'l, S: Sdk> {
    cursor: Cursor<S>,
    scan_line: ScanLine,
    _scan_lines: PhantomData<&'l mut ()>,
}

impl<'l, S: Sdk> Pulses<'l, S> {
    pub(crate) fn new(handle: NativeHandle<S>, scan_line: ScanLine) -> Self {
        Pulses {
            cursor: Cursor::new(handle),
            scan_line,
            _scan_lines: PhantomData,
        }
    }

    /// The scan line these pulses belong to.
    pub fn scan_line(&self) -> &ScanLine {
        &self.scan_line
    }

    /// Advance to the next pulse.
    ///
    /// Returns `Ok(None)` at the end of the scan line. After the end, or after
    /// an error, every call returns the same result.
    pub fn try_next(&mut self) -> Result<Option<Pulse>> {
        self.cursor.step(advance::<S>)
    }

    /// Whether the scan line has no more pulses.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }
}

/// Advance the vendor cursor and copy the pulse before the callback returns.
fn advance<S: Sdk>(sdk: &S, cursor: RawHandle) -> std::result::Result<Pulse, Signal> {
    let mut copied = None;
    sdk.next_pulse(cursor, &mut |raw| copied = Some(Pulse::copy_from(raw)))
        .map_err(|code| status::from_sdk(sdk, code))?;

    match copied {
        Some(pulse) => Ok(pulse?),
        None => {
            let err = Error::invalid_state("vendor advanced the pulse cursor without a pulse");
            Err(err.into())
        }
    }
}

/// Yields a terminal error once, then `None`.
///
/// [`Pulses::try_next`] keeps returning the error instead.
impl<S: Sdk> Iterator for Pulses<'_, S> {
    type Item = Result<Pulse>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.iter_step(advance::<S>)
    }
}

impl<S: Sdk> std::iter::FusedIterator for Pulses<'_, S> {}

impl<S: Sdk> fmt::Debug for Pulses<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pulses")
            .field("handle", self.cursor.handle())
            .field("scan_line", &self.scan_line)
            .finish()
    }
}
