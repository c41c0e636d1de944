//! Sample value type and its 16-byte wire record.
//!
//! ```text
//! offset  size  field
//! 0       8     timestamp_ns  (u64, little-endian)
//! 8       4     temp_mc       (i32, little-endian)
//! 12      4     flags         (u32, little-endian)
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::DeviceError;
use crate::limits::TEMPERATURE_MC;

/// Size of one encoded sample record. No padding.
pub const SAMPLE_SIZE: usize = 16;

/// Status bits carried by every sample.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SampleFlags(u32);

impl SampleFlags {
    /// Produced by the generator since the last consume.
    pub const NEW: Self = Self(1 << 0);
    /// Reading exceeded the alert threshold.
    pub const THRESHOLD_HIGH: Self = Self(1 << 1);
    /// Raw reading fell outside the valid range and was clamped.
    pub const OUT_OF_RANGE: Self = Self(1 << 2);

    const ALL: u32 = Self::NEW.0 | Self::THRESHOLD_HIGH.0 | Self::OUT_OF_RANGE.0;
    const NAMES: [(Self, &'static str); 3] = [
        (Self::NEW, "NEW"),
        (Self::THRESHOLD_HIGH, "THRESHOLD_HIGH"),
        (Self::OUT_OF_RANGE, "OUT_OF_RANGE"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Drops any bit without a name.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for SampleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SampleFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Debug for SampleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(empty)");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// One temperature measurement. Copied out to readers, never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    timestamp_ns: u64,
    temp_mc: i32,
    flags: SampleFlags,
}

impl Sample {
    pub fn new(timestamp_ns: u64, temp_mc: i32, flags: SampleFlags) -> Self {
        Self {
            timestamp_ns,
            temp_mc,
            flags,
        }
    }

    /// Reading reported before the generator first fires.
    pub fn initial() -> Self {
        Self::new(0, TEMPERATURE_MC.default, SampleFlags::empty())
    }

    #[inline]
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    #[inline]
    pub fn temp_mc(&self) -> i32 {
        self.temp_mc
    }

    #[inline]
    pub fn flags(&self) -> SampleFlags {
        self.flags
    }

    #[inline]
    pub fn is_alert(&self) -> bool {
        self.flags.contains(SampleFlags::THRESHOLD_HIGH)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SAMPLE_SIZE);
        buf.put_u64_le(self.timestamp_ns);
        buf.put_i32_le(self.temp_mc);
        buf.put_u32_le(self.flags.bits());
        buf.freeze()
    }

    /// Writes the record into the front of `out`, returning the bytes written.
    pub fn write_to(&self, out: &mut [u8]) -> Result<usize, DeviceError> {
        if out.len() < SAMPLE_SIZE {
            return Err(DeviceError::InvalidArgument(format!(
                "buffer of {} bytes cannot hold a {SAMPLE_SIZE}-byte sample",
                out.len()
            )));
        }
        out[..SAMPLE_SIZE].copy_from_slice(&self.encode());
        Ok(SAMPLE_SIZE)
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, DeviceError> {
        if buf.len() < SAMPLE_SIZE {
            return Err(DeviceError::InvalidArgument(format!(
                "sample record needs {SAMPLE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        let timestamp_ns = buf.get_u64_le();
        let temp_mc = buf.get_i32_le();
        let flags = SampleFlags::from_bits_truncate(buf.get_u32_le());
        Ok(Self::new(timestamp_ns, temp_mc, flags))
    }
}
