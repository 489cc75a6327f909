use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SCALE_EXPONENT: u8 = 4;

/// Power-of-two downscale exponent: level `n` shrinks by `2^n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ScaleLevel(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScaleLevelError {
    #[error("scale exponent {exponent} is out of range (expected 0..={MAX_SCALE_EXPONENT})")]
    OutOfRange { exponent: u8 },
}

impl ScaleLevel {
    pub const FULL: Self = Self(0);
    pub const HALF: Self = Self(1);
    pub const QUARTER: Self = Self(2);
    pub const EIGHTH: Self = Self(3);
    pub const SIXTEENTH: Self = Self(MAX_SCALE_EXPONENT);

    pub fn new(exponent: u8) -> Result<Self, ScaleLevelError> {
        if exponent > MAX_SCALE_EXPONENT {
            return Err(ScaleLevelError::OutOfRange { exponent });
        }
        Ok(Self(exponent))
    }

    pub const fn exponent(self) -> u8 {
        self.0
    }

    pub const fn factor(self) -> u32 {
        1 << self.0
    }

    pub const fn downscale(self, value: u32) -> u32 {
        value >> self.0
    }

    /// Same as [`downscale`](Self::downscale) for signed world positions;
    /// rounds toward negative infinity.
    pub const fn downscale_signed(self, value: i32) -> i32 {
        value >> self.0
    }

    pub const fn sample_count(self, value: u32) -> u32 {
        value.div_ceil(self.factor())
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub const fn finer(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub const fn coarser(self) -> Self {
        if self.0 >= MAX_SCALE_EXPONENT {
            self
        } else {
            Self(self.0 + 1)
        }
    }
}

impl TryFrom<u8> for ScaleLevel {
    type Error = ScaleLevelError;

    fn try_from(exponent: u8) -> Result<Self, Self::Error> {
        Self::new(exponent)
    }
}

impl From<ScaleLevel> for u8 {
    fn from(level: ScaleLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ScaleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.factor())
    }
}
