//! TOML register-write scripts.
//!
//! A script is an optional set of chip settings plus a list of register writes, each tagged with
//! the output frame at which it should take effect:
//!
//! ```toml
//! clock = 3579545
//! duration = 1.5
//!
//! [[writes]]
//! at = 0
//! kind = "frequency_value"
//! channel = 0
//! value = 0x1FF
//! ```

use anyhow::{anyhow, Context};
use k051649::{K051649, NUM_CHANNELS, WAVEFORM_LEN};
use scc_config::{OutputRoute, SccVariant};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegisterWrite {
    Waveform { offset: u8, data: u8 },
    WaveformTable { channel: u8, samples: Vec<i8> },
    Volume { offset: u8, data: u8 },
    Frequency { offset: u8, data: u8 },
    FrequencyValue { channel: u8, value: u16 },
    Keyonoff { data: u8 },
    Reset,
}

impl RegisterWrite {
    pub fn apply(&self, chip: &mut K051649) {
        match self {
            &Self::Waveform { offset, data } => chip.write_waveform(offset, data),
            Self::WaveformTable { channel, samples } => {
                for (i, &sample) in samples.iter().take(WAVEFORM_LEN).enumerate() {
                    chip.write_waveform(32 * channel + i as u8, sample as u8);
                }
            }
            &Self::Volume { offset, data } => chip.write_volume(offset, data),
            &Self::Frequency { offset, data } => chip.write_frequency(offset, data),
            &Self::FrequencyValue { channel, value } => {
                chip.write_frequency(2 * channel, value as u8);
                chip.write_frequency(2 * channel + 1, (value >> 8) as u8);
            }
            &Self::Keyonoff { data } => chip.write_keyonoff(data),
            Self::Reset => chip.reset(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self {
            Self::WaveformTable { channel, samples } => {
                validate_channel(*channel)?;
                if samples.len() != WAVEFORM_LEN {
                    return Err(anyhow!(
                        "waveform table must have {WAVEFORM_LEN} samples, has {}",
                        samples.len()
                    ));
                }
            }
            Self::FrequencyValue { channel, value } => {
                validate_channel(*channel)?;
                if *value > 0xFFF {
                    return Err(anyhow!("frequency {value:#X} does not fit in 12 bits"));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn validate_channel(channel: u8) -> anyhow::Result<()> {
    if usize::from(channel) >= NUM_CHANNELS {
        return Err(anyhow!("channel {channel} out of range, must be 0-{}", NUM_CHANNELS - 1));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduledWrite {
    /// Output frame at which the write takes effect
    #[serde(default)]
    pub at: u64,
    #[serde(flatten)]
    pub write: RegisterWrite,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    pub clock: Option<u32>,
    pub sample_rate: Option<u32>,
    pub variant: Option<SccVariant>,
    pub gain: Option<f64>,
    pub route: Option<OutputRoute>,
    /// Length of the rendered output in seconds
    pub duration: Option<f64>,
    #[serde(default)]
    pub writes: Vec<ScheduledWrite>,
}

impl Script {
    /// Parse and validate a script. Writes are returned sorted by frame; writes scheduled for
    /// the same frame keep their file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a write names an invalid channel, waveform
    /// length, or frequency.
    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let mut script: Self = toml::from_str(source).context("Invalid register script")?;

        for (i, scheduled) in script.writes.iter().enumerate() {
            scheduled.write.validate().with_context(|| format!("Invalid write #{i}"))?;
        }
        script.writes.sort_by_key(|scheduled| scheduled.at);

        Ok(script)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Unable to read script '{}'", path.display()))?;
        Self::parse(&source).with_context(|| format!("Unable to load script '{}'", path.display()))
    }

    /// Frame just past the last scheduled write.
    #[must_use]
    pub fn last_write_frame(&self) -> u64 {
        self.writes.last().map_or(0, |scheduled| scheduled.at + 1)
    }
}
