//! One-call queries over a whole file.
//!
//! Each function opens the file, does its work, and closes the file again,
//! reporting a failed close as an error. Nothing is materialized beyond one
//! pulse at a time.

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::file::{Metadata, OpenOptions, SdfFile};
use crate::pulse::Pulse;
use crate::scan_line::ScanLine;
use crate::sdk::Sdk;

/// Read the header of a file.
pub fn summarize<S: Sdk>(sdk: S, path: impl AsRef<Path>) -> Result<Metadata> {
    let file = SdfFile::open(sdk, path)?;
    let metadata = file.metadata().clone();
    file.close()?;
    Ok(metadata)
}

/// Stream every pulse of a file to `visit`, in file order.
///
/// Returns the number of pulses visited. A failure stops the traversal; the
/// pulses before it have already been visited.
///
/// # Example
///
/// ```
/// use sdf::query;
/// use sdf::sdk::memory::{Fixture, MemorySdk};
///
/// # let tmp = tempfile::NamedTempFile::new().unwrap();
/// let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[10, 12, 8]));
/// let mut samples = 0;
/// let count = query::for_each_pulse(sdk, tmp.path(), |_, pulse| {
///     samples += pulse.waveform.sample_count();
/// })?;
/// assert_eq!(count, 30);
/// # Ok::<(), sdf::Error>(())
/// ```
pub fn for_each_pulse<S, F>(sdk: S, path: impl AsRef<Path>, visit: F) -> Result<u64>
where
    S: Sdk,
    F: FnMut(&ScanLine, &Pulse),
{
    for_each_pulse_with(sdk, path, &OpenOptions::default(), visit)
}

/// [`for_each_pulse`] with explicit open options.
pub fn for_each_pulse_with<S, F>(
    sdk: S,
    path: impl AsRef<Path>,
    options: &OpenOptions,
    mut visit: F,
) -> Result<u64>
where
    S: Sdk,
    F: FnMut(&ScanLine, &Pulse),
{
    let mut file = SdfFile::open_with(sdk, path, options)?;
    let mut count = 0;
    {
        let mut lines = file.scan_lines()?;
        while let Some(line) = lines.try_next()? {
            let mut pulses = lines.pulses()?;
            while let Some(pulse) = pulses.try_next()? {
                visit(&line, &pulse);
                count += 1;
            }
        }
    }
    debug!("Visited {} pulses of {}", count, file.path().display());
    file.close()?;
    Ok(count)
}

/// Totals gathered by walking a whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    /// The header.
    pub metadata: Metadata,
    /// Scan lines walked, including empty ones.
    pub scan_lines: u64,
    /// Pulses walked.
    pub pulses: u64,
    /// Waveform samples across all pulses.
    pub samples: u64,
    /// External time of the first pulse.
    pub first_time: Option<f64>,
    /// External time of the last pulse.
    pub last_time: Option<f64>,
}

impl Survey {
    /// Seconds between the first and the last pulse.
    pub fn duration(&self) -> Option<f64> {
        Some(self.last_time? - self.first_time?)
    }
}

/// Walk a whole file and total it up.
pub fn survey<S: Sdk>(sdk: S, path: impl AsRef<Path>) -> Result<Survey> {
    survey_with(sdk, path, &OpenOptions::default())
}

/// [`survey`] with explicit open options.
pub fn survey_with<S: Sdk>(
    sdk: S,
    path: impl AsRef<Path>,
    options: &OpenOptions,
) -> Result<Survey> {
    let mut file = SdfFile::open_with(sdk, path, options)?;
    let mut survey = Survey {
        metadata: file.metadata().clone(),
        scan_lines: 0,
        pulses: 0,
        samples: 0,
        first_time: None,
        last_time: None,
    };

    {
        let mut lines = file.scan_lines()?;
        while lines.try_next()?.is_some() {
            survey.scan_lines += 1;
            for pulse in lines.pulses()? {
                let pulse = pulse?;
                survey.pulses += 1;
                survey.samples += pulse.waveform.sample_count() as u64;
                survey.first_time.get_or_insert(pulse.time_external);
                survey.last_time = Some(pulse.time_external);
            }
        }
    }

    file.close()?;
    Ok(survey)
}
