use bincode::{Decode, Encode};
use scc_common::num::GetBit;

pub const WAVEFORM_LEN: usize = 32;

const WAVEFORM_INDEX_MASK: u64 = (WAVEFORM_LEN as u64) - 1;

// Phase counter carries 16 fractional bits
pub(crate) const FREQ_BASE_BITS: u32 = 16;

const FREQUENCY_MASK: u32 = 0x0FFF;
const VOLUME_MASK: u32 = 0x0F;

// Frequency register values 0-8 halt the channel
pub const HALT_THRESHOLD: u32 = 9;

/// One of the five SCC voices.
///
/// The layout is fixed so the channel list can be handed to a save-state writer as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, Encode, Decode)]
pub struct Channel {
    counter: u64,
    frequency: u32,
    volume: u32,
    key: u32,
    waveform: [i8; WAVEFORM_LEN],
    _padding: [u8; 4],
}

impl Channel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: 0,
            frequency: 0,
            volume: 0,
            key: 0,
            waveform: [0; WAVEFORM_LEN],
            _padding: [0; 4],
        }
    }

    #[inline]
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// 12-bit frequency (period) register.
    #[inline]
    #[must_use]
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    #[inline]
    #[must_use]
    pub fn volume(&self) -> u32 {
        self.volume
    }

    #[inline]
    #[must_use]
    pub fn key_on(&self) -> bool {
        self.key != 0
    }

    #[inline]
    #[must_use]
    pub fn waveform(&self) -> &[i8; WAVEFORM_LEN] {
        &self.waveform
    }

    #[inline]
    #[must_use]
    pub fn halted(&self) -> bool {
        self.frequency < HALT_THRESHOLD
    }

    pub(crate) fn write_waveform(&mut self, index: usize, sample: i8) {
        self.waveform[index & (WAVEFORM_LEN - 1)] = sample;
    }

    pub(crate) fn read_waveform(&self, index: usize) -> i8 {
        self.waveform[index & (WAVEFORM_LEN - 1)]
    }

    pub(crate) fn write_volume(&mut self, value: u8) {
        self.volume = u32::from(value) & VOLUME_MASK;
    }

    pub(crate) fn set_key(&mut self, key_on: bool) {
        self.key = key_on.into();
    }

    pub(crate) fn write_frequency(&mut self, high: bool, value: u8) {
        // A halted channel restarts on the next waveform step rather than mid-sample
        if self.halted() {
            self.counter |= (1 << FREQ_BASE_BITS) - 1;
        }

        self.frequency = if high {
            (self.frequency & 0x0FF) | ((u32::from(value) << 8) & 0xF00)
        } else {
            (self.frequency & 0xF00) | u32::from(value)
        };
    }

    /// Advance the phase counter by one output sample and return the gated, attenuated
    /// waveform sample at the new position.
    #[inline]
    pub(crate) fn clock(&mut self, step: u64, amplitude: i32) -> i32 {
        self.counter = self.counter.wrapping_add(step);
        let position = waveform_position(self.counter);
        (i32::from(self.waveform[position]) * amplitude) >> 3
    }

    /// Between updates the counter is held as a signed 32-bit value; drop the high bits and
    /// sign-extend.
    #[inline]
    pub(crate) fn store_counter(&mut self) {
        self.counter = i64::from(self.counter as i32) as u64;
    }

    /// Volume gated by the key bit.
    #[inline]
    pub(crate) fn amplitude(&self) -> i32 {
        (self.volume * self.key) as i32
    }

    /// Re-apply register masks after the raw bytes were overwritten from a snapshot.
    pub(crate) fn sanitize(&mut self) {
        self.frequency &= FREQUENCY_MASK;
        self.volume &= VOLUME_MASK;
        self.key &= 1;
        self._padding = [0; 4];
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

/// Waveform RAM index selected by a phase counter value (integer bits 16-20).
#[inline]
#[must_use]
pub fn waveform_position(counter: u64) -> usize {
    (counter.bits(16..=20) & WAVEFORM_INDEX_MASK) as usize
}
