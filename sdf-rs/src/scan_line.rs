//! Scan-line traversal.
//!
//! A scan line groups the consecutive pulses captured during one sweep of a
//! mirror facet. [`ScanLines`] walks them in file order.

use std::marker::PhantomData;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::pulse::Pulses;
use crate::sdk::{HandleKind, RawHandle, RawScanLine, Sdk};
use crate::status;

/// One scan-line record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanLine {
    /// Zero-based position of the scan line in the file.
    pub index: u64,
    /// External time of the first pulse, in seconds.
    pub timestamp: f64,
    /// Mirror facet that produced the scan line.
    pub facet: u16,
    /// Number of pulses in the scan line.
    pub pulse_count: u64,
}

impl From<RawScanLine> for ScanLine {
    fn from(raw: RawScanLine) -> Self {
        ScanLine {
            index: raw.index,
            timestamp: raw.timestamp,
            facet: raw.facet,
            pulse_count: raw.pulse_count,
        }
    }
}

/// Lazy, forward-only traversal of the scan lines of a file.
///
/// Created by [`SdfFile::scan_lines()`](crate::SdfFile::scan_lines). Holds the
/// file mutably borrowed, so the file cannot be closed or traversed a second
/// time while this is alive.
///
/// Implements `Iterator`; use [`try_next`](Self::try_next) when you need the
/// terminal outcome repeated, and [`pulses`](Self::pulses) to descend into the
/// scan line last returned.
///
/// # Example
///
/// ```no_run
/// # fn example<S: sdf::sdk::Sdk>(mut file: sdf::SdfFile<S>) -> sdf::Result<()> {
/// let mut lines = file.scan_lines()?;
/// while let Some(line) = lines.try_next()? {
///     let pulses = lines.pulses()?.count();
///     println!("scan line {}: {} pulses", line.index, pulses);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ScanLines<'f, S: Sdk> {
    cursor: Cursor<S>,
    /// The scan line the vendor cursor currently sits on.
    current: Option<ScanLine>,
    _file: PhantomData<&'f mut ()>,
}

impl<'f, S: Sdk> ScanLines<'f, S> {
    pub(crate) fn new(handle: NativeHandle<S>) -> Self {
        ScanLines {
            cursor: Cursor::new(handle),
            current: None,
            _file: PhantomData,
        }
    }

    /// Advance to the next scan line.
    ///
    /// Returns `Ok(None)` at the end of the file. After the end, or after an
    /// error, every call returns the same result without touching the vendor
    /// library again.
    pub fn try_next(&mut self) -> Result<Option<ScanLine>> {
        let next = self.cursor.step(advance::<S>);
        self.current = next.as_ref().ok().copied().flatten();
        next
    }

    /// The scan line last returned, if the traversal is still on one.
    pub fn current(&self) -> Option<&ScanLine> {
        self.current.as_ref()
    }

    /// Whether the traversal has reached the end of the file.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// Start a traversal of the pulses of the scan line last returned.
    ///
    /// The pulse traversal borrows this one mutably, so the scan-line cursor
    /// cannot move while pulses are being read.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if no scan line has been returned yet, or the
    /// traversal has ended.
    pub fn pulses(&mut self) -> Result<Pulses<'_, S>> {
        let line = self
            .current
            .ok_or(Error::invalid_state("no current scan line to read pulses from"))?;

        let parent = self.cursor.handle();
        let scan_lines = parent.raw();
        let cursor = NativeHandle::acquire(
            parent.sdk_rc(),
            HandleKind::PulseCursor,
            "starting the pulse traversal",
            |sdk| sdk.begin_pulses(scan_lines),
        )?;
        Ok(Pulses::new(cursor, line))
    }
}

fn advance<S: Sdk>(sdk: &S, cursor: RawHandle) -> std::result::Result<ScanLine, status::Signal> {
    sdk.next_scan_line(cursor)
        .map(ScanLine::from)
        .map_err(|code| status::from_sdk(sdk, code))
}

/// Yields a terminal error once, then `None`.
///
/// Unlike [`ScanLines::try_next`], which keeps returning the same error, the
/// iterator ends after reporting it so that `collect` and `for` loops stop.
impl<S: Sdk> Iterator for ScanLines<'_, S> {
    type Item = Result<ScanLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.cursor.iter_step(advance::<S>);
        self.current = match &next {
            Some(Ok(line)) => Some(*line),
            _ => None,
        };
        next
    }
}

impl<S: Sdk> std::iter::FusedIterator for ScanLines<'_, S> {}

impl<S: Sdk> std::fmt::Debug for ScanLines<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLines")
            .field("handle", self.cursor.handle())
            .field("current", &self.current)
            .finish()
    }
}
