pub mod address;

use std::fmt;

use log::debug;

use crate::carrier::Carrier;
use crate::error::{Result, StegoError};

/// Number of low bits per subchannel used to carry frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// 1 bit per subchannel.
    L0 = 0,
    /// 2 bits per subchannel.
    L1 = 1,
    /// 4 bits per subchannel.
    L2 = 2,
}

/// Precomputed bit arithmetic for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelParams {
    pub bits_per_subchannel: u32,
    pub mask: u8,
    pub subchannels_per_byte: usize,
}

const LEVEL_TABLE: [LevelParams; 3] = [
    LevelParams {
        bits_per_subchannel: 1,
        mask: 0b0001,
        subchannels_per_byte: 8,
    },
    LevelParams {
        bits_per_subchannel: 2,
        mask: 0b0011,
        subchannels_per_byte: 4,
    },
    LevelParams {
        bits_per_subchannel: 4,
        mask: 0b1111,
        subchannels_per_byte: 2,
    },
];

impl Level {
    /// Levels in the order they are tried: least disruptive first.
    pub const ALL: [Level; 3] = [Level::L0, Level::L1, Level::L2];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn params(self) -> &'static LevelParams {
        &LEVEL_TABLE[self as usize]
    }
}

impl TryFrom<u8> for Level {
    type Error = StegoError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Level::L0),
            1 => Ok(Level::L1),
            2 => Ok(Level::L2),
            other => Err(StegoError::InvalidLevel(other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.as_u8())
    }
}

impl LevelParams {
    /// Fold `subchannels_per_byte` samples into one byte. The first sample
    /// lands in the most significant chunk.
    pub fn decode_byte(&self, samples: impl IntoIterator<Item = u8>) -> u8 {
        samples
            .into_iter()
            .take(self.subchannels_per_byte)
            .fold(0u8, |acc, sample| {
                (acc << self.bits_per_subchannel) | (sample & self.mask)
            })
    }

    /// Split a byte into `subchannels_per_byte` chunks, most significant first.
    pub fn encode_byte(&self, byte: u8) -> impl Iterator<Item = u8> {
        let bits = self.bits_per_subchannel;
        let mask = self.mask;
        (0..self.subchannels_per_byte)
            .rev()
            .map(move |i| (byte >> (i as u32 * bits)) & mask)
    }

    /// Replace the low bits of `sample` with `chunk`, keeping the high bits.
    pub fn embed(&self, sample: u8, chunk: u8) -> u8 {
        (sample & !self.mask) | (chunk & self.mask)
    }
}

/// Pick the lowest level whose capacity holds `packed_size` bytes.
pub fn choose_level(packed_size: usize, carrier: &Carrier) -> Result<Level> {
    for level in Level::ALL {
        let capacity = carrier.capacity_bytes(level);
        if packed_size <= capacity {
            debug!("{} bytes fit at {} (capacity {})", packed_size, level, capacity);
            return Ok(level);
        }
    }

    Err(StegoError::PayloadTooLarge {
        required: packed_size,
        available: carrier.capacity_bytes(Level::L2),
    })
}
