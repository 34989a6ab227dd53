//! Shared output-sample helpers

/// Clamp a mixed sample into the signed 16-bit output range.
#[inline]
#[must_use]
pub fn clip_i16(sample: i32) -> i32 {
    sample.clamp(i16::MIN.into(), i16::MAX.into())
}

pub trait AudioOutput {
    type Err;

    /// Push a signed 16-bit stereo frame.
    ///
    /// # Errors
    ///
    /// This method will return an error if it is unable to push the frame to the output.
    fn push_frame(&mut self, sample_l: i16, sample_r: i16) -> Result<(), Self::Err>;

    /// Push every frame from an interleaved stereo buffer.
    ///
    /// A trailing unpaired sample is ignored.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`push_frame`](Self::push_frame).
    fn push_interleaved(&mut self, buffer: &[i16]) -> Result<(), Self::Err> {
        for frame in buffer.chunks_exact(2) {
            self.push_frame(frame[0], frame[1])?;
        }

        Ok(())
    }
}
