//! Konami 051649 (SCC) five-channel wavetable sound generator, as used in Haunted Castle and
//! City Bomber, and the register-compatible K052539.
//!
//! Each channel plays a 32-sample signed 8-bit waveform from its own RAM bank. A 12-bit
//! frequency register sets the waveform step rate, a 4-bit register sets the volume, and a shared
//! register gates the channels on and off. On the K051649 the fifth channel has no waveform RAM of
//! its own and plays whatever is written to the fourth channel's bank.
//!
//! Mixed output is produced at the host sample rate by stepping each channel's phase counter once
//! per output sample (no band-limiting), then passing the channel sum through a saturating lookup
//! table.

mod channel;
mod mixer;
mod snapshot;


pub use channel::{waveform_position, Channel, HALT_THRESHOLD, WAVEFORM_LEN};
pub use mixer::{MixerTable, MIXER_TABLE_LEN};
pub use scc_config::{OutputRoute, SccConfig, SccVariant};
pub use snapshot::{
    Snapshot, SnapshotAreaMut, SnapshotError, SNAPSHOT_AREA_NAME, SNAPSHOT_LEN,
    SNAPSHOT_MIN_VERSION,
};

use crate::channel::FREQ_BASE_BITS;
use scc_common::audio::clip_i16;
use scc_common::num::GetBit;
use std::array;

pub const NUM_CHANNELS: usize = 5;

// Native sample rate is the master clock divided by 16
const CLOCK_DIVIDER: u32 = 16;

// Fixed-point scale of the native-to-host rate ratio
const UPDATE_STEP_SCALE: f32 = 32768.0;

// Waveform RAM offsets at or above this address belong to the fourth channel's bank, which the
// K051649 also routes to the fifth channel
const SHARED_WAVEFORM_OFFSET: u8 = 0x60;

macro_rules! require_init {
    ($self:expr, $op:literal $(, $ret:expr)?) => {
        if !$self.initialized {
            log::error!(concat!("K051649 ", $op, " called without init"));
            return $($ret)?;
        }
    };
}

#[derive(Debug, Clone)]
pub struct K051649 {
    channels: [Channel; NUM_CHANNELS],
    variant: SccVariant,
    master_clock: u32,
    rate: u32,
    output_frequency: u32,
    update_step: u32,
    gain: f64,
    route: OutputRoute,
    mixer_table: Option<MixerTable>,
    mix_buffer: Vec<i16>,
    initialized: bool,
}

impl K051649 {
    /// Create and initialize a chip driven by `master_clock` Hz, producing output at
    /// `output_frequency` Hz.
    #[must_use]
    pub fn new(master_clock: u32, output_frequency: u32) -> Self {
        let mut chip = Self {
            channels: array::from_fn(|_| Channel::new()),
            variant: SccVariant::default(),
            master_clock: 0,
            rate: 0,
            output_frequency: 0,
            update_step: 0,
            gain: 1.0,
            route: OutputRoute::default(),
            mixer_table: None,
            mix_buffer: Vec::new(),
            initialized: false,
        };
        chip.init(master_clock, output_frequency);
        chip
    }

    /// Create a chip from a full configuration.
    #[must_use]
    pub fn with_config(master_clock: u32, output_frequency: u32, config: &SccConfig) -> Self {
        let mut chip = Self::new(master_clock, output_frequency);
        chip.apply_config(config);
        chip
    }

    /// (Re)initialize the chip. Gain and routing return to their defaults and every channel is
    /// cleared.
    pub fn init(&mut self, master_clock: u32, output_frequency: u32) {
        self.rate = master_clock / CLOCK_DIVIDER;
        self.master_clock = master_clock;
        self.output_frequency = output_frequency;
        self.gain = 1.0;
        self.route = OutputRoute::Both;

        self.update_step =
            ((self.rate as f32 / output_frequency as f32) * UPDATE_STEP_SCALE) as i32 as u32;

        // One second of native-rate samples; update() never needs more than this per pass
        self.mix_buffer = vec![0; self.rate as usize];
        self.mixer_table = Some(MixerTable::new(NUM_CHANNELS));

        self.initialized = true;

        log::info!(
            "K051649 initialized: clock {master_clock} Hz, native rate {} Hz, output {output_frequency} Hz, update step {}",
            self.rate,
            self.update_step
        );

        self.reset();
    }

    /// Clear every channel's registers, phase counter, and waveform RAM.
    pub fn reset(&mut self) {
        require_init!(self, "reset");

        for channel in &mut self.channels {
            *channel = Channel::new();
        }
    }

    /// Release the mix buffer and mixer table. Every call other than `init` logs an error until
    /// the chip is initialized again.
    pub fn exit(&mut self) {
        require_init!(self, "exit");

        self.mix_buffer = Vec::new();
        self.mixer_table = None;
        self.update_step = 0;
        self.initialized = false;

        log::info!("K051649 shut down");
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    #[must_use]
    pub fn master_clock(&self) -> u32 {
        self.master_clock
    }

    /// Native output rate (master clock / 16).
    #[inline]
    #[must_use]
    pub fn native_rate(&self) -> u32 {
        self.rate
    }

    #[inline]
    #[must_use]
    pub fn output_frequency(&self) -> u32 {
        self.output_frequency
    }

    /// Native-to-host rate ratio in 1/32768 units.
    #[inline]
    #[must_use]
    pub fn update_step(&self) -> u32 {
        self.update_step
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    #[inline]
    #[must_use]
    pub fn variant(&self) -> SccVariant {
        self.variant
    }

    #[inline]
    #[must_use]
    pub fn gain(&self) -> f64 {
        self.gain
    }

    #[inline]
    #[must_use]
    pub fn output_route(&self) -> OutputRoute {
        self.route
    }

    pub fn set_variant(&mut self, variant: SccVariant) {
        require_init!(self, "set_variant");

        self.variant = variant;
    }

    pub fn set_route(&mut self, gain: f64, route: OutputRoute) {
        require_init!(self, "set_route");

        self.gain = gain;
        self.route = route;
    }

    pub fn set_gain(&mut self, gain: f64) {
        require_init!(self, "set_gain");

        self.gain = gain;
    }

    pub fn set_output_route(&mut self, route: OutputRoute) {
        require_init!(self, "set_output_route");

        self.route = route;
    }

    pub fn apply_config(&mut self, config: &SccConfig) {
        require_init!(self, "apply_config");

        self.variant = config.variant;
        self.gain = config.gain;
        self.route = config.route;

        log::debug!(
            "K051649 config: variant {}, gain {}, route {}",
            config.variant,
            config.gain,
            config.route
        );
    }

    /// Waveform RAM write through the configured variant's address decoding.
    pub fn write_waveform(&mut self, offset: u8, data: u8) {
        if self.variant.shares_last_waveform() {
            self.write_waveform_k051649(offset, data);
        } else {
            self.write_waveform_k052539(offset, data);
        }
    }

    /// K051649 waveform RAM write; the fourth channel's bank is mirrored into the fifth channel.
    pub fn write_waveform_k051649(&mut self, offset: u8, data: u8) {
        require_init!(self, "write_waveform_k051649");

        if !self.write_waveform_bank(offset, data) {
            return;
        }

        if offset >= SHARED_WAVEFORM_OFFSET {
            self.channels[4].write_waveform(offset.into(), data as i8);
        }
    }

    /// K052539 waveform RAM write; every channel has its own bank.
    pub fn write_waveform_k052539(&mut self, offset: u8, data: u8) {
        require_init!(self, "write_waveform_k052539");

        self.write_waveform_bank(offset, data);
    }

    fn write_waveform_bank(&mut self, offset: u8, data: u8) -> bool {
        let Some(channel) = self.channels.get_mut(usize::from(offset >> 5)) else {
            log::trace!("Ignoring waveform write to unmapped offset {offset:02X}");
            return false;
        };

        channel.write_waveform(offset.into(), data as i8);

        log::trace!("Waveform write: offset {offset:02X}, sample {}", data as i8);

        true
    }

    #[must_use]
    pub fn read_waveform(&self, offset: u8) -> u8 {
        require_init!(self, "read_waveform", 0);

        match self.channels.get(usize::from(offset >> 5)) {
            Some(channel) => channel.read_waveform(offset.into()) as u8,
            None => 0,
        }
    }

    pub fn write_volume(&mut self, offset: u8, data: u8) {
        require_init!(self, "write_volume");

        let channel_idx = usize::from(offset & 0x07);
        let Some(channel) = self.channels.get_mut(channel_idx) else {
            log::trace!("Ignoring volume write to unmapped channel {channel_idx}");
            return;
        };

        channel.write_volume(data);

        log::trace!("Channel {channel_idx} volume: {}", channel.volume());
    }

    /// Frequency register write. Bit 0 of the offset selects the high nibble, the remaining bits
    /// select the channel.
    pub fn write_frequency(&mut self, offset: u8, data: u8) {
        require_init!(self, "write_frequency");

        let channel_idx = usize::from(offset >> 1);
        let Some(channel) = self.channels.get_mut(channel_idx) else {
            log::trace!("Ignoring frequency write to unmapped channel {channel_idx}");
            return;
        };

        channel.write_frequency(offset.bit(0), data);

        log::trace!("Channel {channel_idx} frequency: {:03X}", channel.frequency());
    }

    pub fn write_keyonoff(&mut self, data: u8) {
        require_init!(self, "write_keyonoff");

        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.set_key(data.bit(i as u8));
        }

        log::trace!("Key on/off: {:05b}", data & 0x1F);
    }

    // Phase counter increment per output sample. The arithmetic (single precision, operation
    // order, integer division of the native rate) determines pitch and must not be simplified.
    fn phase_step(&self, frequency: u32) -> u64 {
        let step = ((((self.master_clock as f32 / ((frequency + 1) * 16) as f32)
            * (1_u32 << FREQ_BASE_BITS) as f32)
            / (self.rate / 32) as f32)
            * self.update_step as f32)
            / UPDATE_STEP_SCALE;
        // Sign-extend so wrapping addition matches a signed 32-bit accumulator in the low bits
        i64::from(step as i32) as u64
    }

    /// Mix `samples` stereo frames into `buffer`, which holds interleaved left/right samples.
    ///
    /// Output is added to the buffer's existing contents and clipped, so other sources can be
    /// mixed into the same buffer before or after this call.
    pub fn update(&mut self, buffer: &mut [i16], samples: usize) {
        if !self.initialized {
            log::error!("K051649 update called without init");
        }

        let buffer_frames = buffer.len() / 2;
        if samples > buffer_frames {
            log::warn!(
                "K051649 update requested {samples} frames but buffer only holds {buffer_frames}"
            );
        }
        let samples = samples.min(buffer_frames);

        let steps: [Option<u64>; NUM_CHANNELS] = array::from_fn(|i| {
            let channel = &self.channels[i];
            (!channel.halted()).then(|| self.phase_step(channel.frequency()))
        });

        let chunk_len = self.mix_buffer.len();
        if chunk_len == 0 {
            return;
        }

        for frames in buffer[..2 * samples].chunks_mut(2 * chunk_len) {
            self.render_chunk(frames, &steps);
        }
    }

    fn render_chunk(&mut self, frames: &mut [i16], steps: &[Option<u64>; NUM_CHANNELS]) {
        let Self { channels, mixer_table, mix_buffer, gain, route, .. } = self;
        let Some(mixer_table) = mixer_table else { return };

        let mix = &mut mix_buffer[..frames.len() / 2];
        mix.fill(0);

        for (channel, &step) in channels.iter_mut().zip(steps) {
            let Some(step) = step else { continue };

            let amplitude = channel.amplitude();
            for sample in mix.iter_mut() {
                *sample += channel.clock(step, amplitude) as i16;
            }
            channel.store_counter();
        }

        let (route_left, route_right) = (route.routes_left(), route.routes_right());
        for (frame, &mixed) in frames.chunks_exact_mut(2).zip(mix.iter()) {
            let output = clip_i16(mixer_table.lookup(mixed.into()));
            let output = clip_i16((f64::from(output) * *gain) as i32);

            let sample_l = if route_left { output } else { 0 };
            let sample_r = if route_right { output } else { 0 };

            frame[0] = clip_i16(i32::from(frame[0]) + sample_l) as i16;
            frame[1] = clip_i16(i32::from(frame[1]) + sample_r) as i16;
        }
    }

    /// Byte view of the channel list for a save-state writer.
    #[must_use]
    pub fn snapshot_describe(&self) -> Snapshot<'_> {
        if !self.initialized {
            log::error!("K051649 snapshot_describe called without init");
        }

        snapshot::describe(&self.channels)
    }

    /// Mutable byte view of the channel list for a save-state loader that copies in place.
    /// Registers are re-masked when the view is dropped.
    pub fn snapshot_area_mut(&mut self) -> SnapshotAreaMut<'_> {
        if !self.initialized {
            log::error!("K051649 snapshot_area_mut called without init");
        }

        snapshot::area_mut(&mut self.channels)
    }

    /// Load channel state previously captured with [`snapshot_describe`](Self::snapshot_describe).
    ///
    /// # Errors
    ///
    /// Returns an error if the chip is not initialized or `bytes` is not exactly
    /// [`SNAPSHOT_LEN`] bytes long.
    pub fn restore_snapshot(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        require_init!(self, "restore_snapshot", Err(SnapshotError::Uninitialized));

        snapshot::restore(&mut self.channels, bytes)
    }
}
