use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

/// How the generator produces the next reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Constant 27.5 °C.
    #[default]
    Normal,
    /// Uniform noise in [25.0, 30.0) °C.
    Noisy,
    /// +0.1 °C per tick, wrapping to 0 past 100 °C.
    Ramp,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Normal, Mode::Noisy, Mode::Ramp];

    /// Canonical name accepted by [`Mode::from_str`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = DeviceError;

    /// Case-sensitive exact match against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                DeviceError::InvalidArgument(format!(
                    "unknown mode {s:?}, expected one of normal|noisy|ramp"
                ))
            })
    }
}
