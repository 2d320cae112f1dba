//! Calibration tables.

use crate::error::{Error, Result};
use crate::waveform::Channel;

/// A type of calibration table, paired with the channel it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationKind {
    /// An amplitude calibration table.
    Amplitude(Channel),
    /// A range calibration table.
    Range(Channel),
}

/// The four tables the vendor library stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationTable {
    /// Amplitude, high-power channel.
    AmplitudeHigh,
    /// Amplitude, low-power channel.
    AmplitudeLow,
    /// Range, high-power channel.
    RangeHigh,
    /// Range, low-power channel.
    RangeLow,
}

impl CalibrationKind {
    /// The stored table for this kind.
    ///
    /// Only the high and low channels are calibrated.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdf::{CalibrationKind, CalibrationTable, Channel};
    /// assert_eq!(
    ///     CalibrationKind::Range(Channel::Low).table().unwrap(),
    ///     CalibrationTable::RangeLow
    /// );
    /// assert!(CalibrationKind::Amplitude(Channel::Saturation).table().is_err());
    /// ```
    pub fn table(&self) -> Result<CalibrationTable> {
        match *self {
            CalibrationKind::Amplitude(Channel::High) => Ok(CalibrationTable::AmplitudeHigh),
            CalibrationKind::Amplitude(Channel::Low) => Ok(CalibrationTable::AmplitudeLow),
            CalibrationKind::Range(Channel::High) => Ok(CalibrationTable::RangeHigh),
            CalibrationKind::Range(Channel::Low) => Ok(CalibrationTable::RangeLow),
            CalibrationKind::Amplitude(channel) | CalibrationKind::Range(channel) => {
                Err(Error::NoCalibrationTable { channel })
            }
        }
    }
}

/// One calibration table, copied out of the vendor library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    /// Monotonically increasing abscissa values, paired with `ordinate`.
    pub abscissa: Vec<f64>,
    /// Ordinate values.
    pub ordinate: Vec<f64>,
}

impl Calibration {
    /// Number of points in the table.
    pub fn len(&self) -> usize {
        self.abscissa.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.abscissa.is_empty()
    }

    /// Iterate over `(abscissa, ordinate)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.abscissa.iter().copied().zip(self.ordinate.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_for_calibrated_channels() {
        assert_eq!(
            CalibrationKind::Amplitude(Channel::High).table(),
            Ok(CalibrationTable::AmplitudeHigh)
        );
        assert_eq!(
            CalibrationKind::Amplitude(Channel::Low).table(),
            Ok(CalibrationTable::AmplitudeLow)
        );
        assert_eq!(
            CalibrationKind::Range(Channel::High).table(),
            Ok(CalibrationTable::RangeHigh)
        );
    }

    #[test]
    fn test_no_table_for_reference() {
        assert_eq!(
            CalibrationKind::Range(Channel::Reference).table(),
            Err(Error::NoCalibrationTable {
                channel: Channel::Reference
            })
        );
    }

    #[test]
    fn test_points() {
        let calib = Calibration {
            abscissa: vec![0.0, 1.0],
            ordinate: vec![10.0, 20.0],
        };
        assert_eq!(calib.len(), 2);
        assert_eq!(calib.points().last(), Some((1.0, 20.0)));
    }
}
