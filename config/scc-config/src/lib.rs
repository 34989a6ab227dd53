use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const DEFAULT_MASTER_CLOCK: u32 = 3_579_545;

pub const DEFAULT_OUTPUT_FREQUENCY: u32 = 44_100;

/// Which member of the SCC family is being emulated.
///
/// The K051649 wires channel 5 to the same waveform RAM as channel 4, so writes to the fourth
/// waveform bank also land in the fifth. The K052539 gives every channel its own bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SccVariant {
    #[default]
    K051649,
    K052539,
}

impl SccVariant {
    pub const ALL: [Self; 2] = [Self::K051649, Self::K052539];

    #[inline]
    #[must_use]
    pub fn shares_last_waveform(self) -> bool {
        self == Self::K051649
    }
}

impl Display for SccVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::K051649 => write!(f, "K051649"),
            Self::K052539 => write!(f, "K052539"),
        }
    }
}

impl FromStr for SccVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "k051649" => Ok(Self::K051649),
            "k052539" => Ok(Self::K052539),
            _ => Err(format!("invalid SccVariant string: '{s}'")),
        }
    }
}

const ROUTE_LEFT: u8 = 1 << 0;
const ROUTE_RIGHT: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputRoute {
    Left,
    Right,
    #[default]
    Both,
    None,
}

impl OutputRoute {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Both, Self::None];

    /// Decode a route from its bitmask form; bit 0 is left and bit 1 is right.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & (ROUTE_LEFT | ROUTE_RIGHT) {
            ROUTE_LEFT => Self::Left,
            ROUTE_RIGHT => Self::Right,
            0 => Self::None,
            _ => Self::Both,
        }
    }

    #[must_use]
    pub fn to_bits(self) -> u8 {
        match self {
            Self::Left => ROUTE_LEFT,
            Self::Right => ROUTE_RIGHT,
            Self::Both => ROUTE_LEFT | ROUTE_RIGHT,
            Self::None => 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn routes_left(self) -> bool {
        self.to_bits() & ROUTE_LEFT != 0
    }

    #[inline]
    #[must_use]
    pub fn routes_right(self) -> bool {
        self.to_bits() & ROUTE_RIGHT != 0
    }
}

impl Display for OutputRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
            Self::Both => write!(f, "Both"),
            Self::None => write!(f, "None"),
        }
    }
}

impl FromStr for OutputRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "both" => Ok(Self::Both),
            "none" => Ok(Self::None),
            _ => Err(format!("invalid OutputRoute string: '{s}'")),
        }
    }
}

/// Settings that live outside the chip's register file.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SccConfig {
    pub variant: SccVariant,
    pub gain: f64,
    pub route: OutputRoute,
}

impl Default for SccConfig {
    fn default() -> Self {
        Self { variant: SccVariant::default(), gain: 1.0, route: OutputRoute::default() }
    }
}
