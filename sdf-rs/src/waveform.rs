//! Waveform samples of a pulse.
//!
//! The vendor library hands out sample blocks that point into a buffer it
//! overwrites on the next read. [`Waveform::copy_from`] is where those blocks
//! become owned data; it runs inside the SDK callback, before the cursor can
//! move.

use std::fmt;

use crate::error::{Error, Result};
use crate::sdk::RawBlock;

/// Information from one detector or set of detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The high-power channel.
    High,
    /// The low-power channel.
    Low,
    /// The saturation channel.
    Saturation,
    /// The reference channel (the outgoing pulse).
    Reference,
}

impl Channel {
    /// Returns the channel for a raw channel number.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdf::Channel;
    /// assert_eq!(Channel::High, Channel::from_u32(0).unwrap());
    /// assert_eq!(Channel::Reference, Channel::from_u32(3).unwrap());
    /// assert!(Channel::from_u32(4).is_err());
    /// ```
    pub fn from_u32(n: u32) -> Result<Channel> {
        match n {
            0 => Ok(Channel::High),
            1 => Ok(Channel::Low),
            2 => Ok(Channel::Saturation),
            3 => Ok(Channel::Reference),
            _ => Err(Error::InvalidChannel(n)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::High => "high",
            Channel::Low => "low",
            Channel::Saturation => "saturation",
            Channel::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// One block of consecutive samples from one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    /// Start of the sample block, in seconds.
    pub time_sosbl: f64,
    /// The channel the samples were digitized from.
    pub channel: Channel,
    /// The amplitude samples.
    pub samples: Vec<u16>,
}

impl fmt::Display for SampleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time_sosbl: {}\nchannel: {}\nsamples: ",
            self.time_sosbl, self.channel
        )?;
        for (i, sample) in self.samples.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", sample)?;
        }
        Ok(())
    }
}

/// The digitized returned-energy profile of one pulse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    blocks: Vec<SampleBlock>,
}

impl Waveform {
    /// Copy vendor sample blocks into owned memory.
    ///
    /// Must be called while the blocks are still valid. Fails if a block has
    /// an unknown channel number.
    pub(crate) fn copy_from(raw: &[RawBlock<'_>]) -> Result<Waveform> {
        let mut blocks = Vec::with_capacity(raw.len());
        for block in raw {
            blocks.push(SampleBlock {
                time_sosbl: block.time_sosbl,
                channel: Channel::from_u32(block.channel)?,
                samples: block.samples.to_vec(),
            });
        }
        Ok(Waveform { blocks })
    }

    /// All sample blocks, in vendor order.
    pub fn blocks(&self) -> &[SampleBlock] {
        &self.blocks
    }

    /// The blocks from one channel.
    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = &SampleBlock> + '_ {
        self.blocks.iter().filter(move |b| b.channel == channel)
    }

    /// Every sample of every block, in block order.
    pub fn samples(&self) -> impl Iterator<Item = u16> + '_ {
        self.blocks.iter().flat_map(|b| b.samples.iter().copied())
    }

    /// Total number of samples across all blocks.
    pub fn sample_count(&self) -> usize {
        self.blocks.iter().map(|b| b.samples.len()).sum()
    }

    /// Whether the pulse carried no samples.
    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_from_owns_samples() {
        let mut buffer = vec![1u16, 2, 3, 4, 5];
        let waveform = {
            let raw = [
                RawBlock {
                    time_sosbl: 0.5,
                    channel: 3,
                    samples: &buffer[..2],
                },
                RawBlock {
                    time_sosbl: 1.5,
                    channel: 0,
                    samples: &buffer[2..],
                },
            ];
            Waveform::copy_from(&raw).unwrap()
        };

        buffer.iter_mut().for_each(|s| *s = 0);

        assert_eq!(waveform.blocks().len(), 2);
        assert_eq!(waveform.blocks()[0].channel, Channel::Reference);
        assert_eq!(waveform.samples().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(waveform.sample_count(), 5);
        assert_eq!(waveform.channel(Channel::High).count(), 1);
    }

    #[test]
    fn test_copy_from_rejects_unknown_channel() {
        let raw = [RawBlock {
            time_sosbl: 0.0,
            channel: 7,
            samples: &[],
        }];
        assert_eq!(Waveform::copy_from(&raw), Err(Error::InvalidChannel(7)));
    }

    #[test]
    fn test_block_display() {
        let block = SampleBlock {
            time_sosbl: 2.0,
            channel: Channel::Low,
            samples: vec![7, 8, 9],
        };
        assert_eq!(block.to_string(), "time_sosbl: 2\nchannel: low\nsamples: 7, 8, 9");
    }
}
