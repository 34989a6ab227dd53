use hound::{SampleFormat, WavSpec, WavWriter};
use scc_common::audio::AudioOutput;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// 16-bit stereo WAV file sink.
pub struct WavOutput {
    writer: WavWriter<BufWriter<File>>,
    frames_written: u64,
}

impl WavOutput {
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, hound::Error> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;

        Ok(Self { writer, frames_written: 0 })
    }

    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write the final header lengths and close the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn finalize(self) -> Result<(), hound::Error> {
        self.writer.finalize()
    }
}

impl AudioOutput for WavOutput {
    type Err = hound::Error;

    #[inline]
    fn push_frame(&mut self, sample_l: i16, sample_r: i16) -> Result<(), Self::Err> {
        self.writer.write_sample(sample_l)?;
        self.writer.write_sample(sample_r)?;
        self.frames_written += 1;

        Ok(())
    }
}
