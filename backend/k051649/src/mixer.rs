//! Saturating mix-down table.
//!
//! Summing five voices can exceed the 16-bit output range. Rather than clipping every mixed
//! sample, the mix is looked up in a table that scales by a fixed gain and saturates at the
//! signed 16-bit limits.

use crate::NUM_CHANNELS;

const TABLE_GAIN: i32 = 8;

const HALF_LEN: usize = 256 * NUM_CHANNELS;

pub const MIXER_TABLE_LEN: usize = 2 * HALF_LEN;

#[derive(Debug, Clone)]
pub struct MixerTable {
    // Index HALF_LEN holds the entry for a zero mix
    entries: Box<[i16; MIXER_TABLE_LEN]>,
}

impl MixerTable {
    #[must_use]
    pub fn new(voices: usize) -> Self {
        let mut entries = Box::new([0_i16; MIXER_TABLE_LEN]);

        let voices = voices.clamp(1, NUM_CHANNELS) as i32;
        let count = 256 * voices;
        let scale = |i: i32| (i * TABLE_GAIN * 16 / voices).min(i16::MAX.into()) as i16;
        // The most negative index has no positive counterpart and stays zero
        for i in 0..count {
            let value = scale(i);
            entries[HALF_LEN + i as usize] = value;
            entries[HALF_LEN - i as usize] = -value;
        }

        log::debug!("Built mixer table for {voices} voices");

        Self { entries }
    }

    /// Look up a mixed sample. Indices outside the table are clamped to its first or last entry.
    #[inline]
    #[must_use]
    pub fn lookup(&self, mix: i32) -> i32 {
        let index = mix.saturating_add(HALF_LEN as i32).clamp(0, MIXER_TABLE_LEN as i32 - 1);
        self.entries[index as usize].into()
    }

    #[must_use]
    pub fn range() -> (i32, i32) {
        (-(HALF_LEN as i32), HALF_LEN as i32 - 1)
    }
}

impl Default for MixerTable {
    fn default() -> Self {
        Self::new(NUM_CHANNELS)
    }
}
