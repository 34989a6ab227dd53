use crate::script::ScheduledWrite;
use k051649::K051649;
use scc_common::audio::AudioOutput;

/// Drive `chip` for `total_frames` output frames, applying each scheduled write at the start of
/// the first chunk whose starting frame is at or past the write's frame.
///
/// Writes must be sorted by frame. Each chunk holds `chunk_frames` frames, so register changes
/// take effect at chunk granularity.
///
/// # Errors
///
/// Propagates any error from the audio output.
pub fn render<A: AudioOutput>(
    chip: &mut K051649,
    writes: &[ScheduledWrite],
    total_frames: u64,
    chunk_frames: usize,
    output: &mut A,
) -> Result<(), A::Err> {
    let chunk_frames = chunk_frames.max(1);
    let mut buffer = vec![0_i16; 2 * chunk_frames];
    let mut pending = writes.iter().peekable();

    let mut frame = 0_u64;
    while frame < total_frames {
        while let Some(scheduled) = pending.next_if(|scheduled| scheduled.at <= frame) {
            log::debug!("Frame {frame}: applying {:?}", scheduled.write);
            scheduled.write.apply(chip);
        }

        let frames = (total_frames - frame).min(chunk_frames as u64) as usize;
        let buffer = &mut buffer[..2 * frames];
        buffer.fill(0);

        chip.update(buffer, frames);
        output.push_interleaved(buffer)?;

        frame += frames as u64;
    }

    if pending.peek().is_some() {
        log::warn!("{} scheduled writes fall after the end of the output", pending.count());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{RegisterWrite, Script};
    use std::convert::Infallible;

    #[derive(Default)]
    struct VecOutput(Vec<(i16, i16)>);

    impl AudioOutput for VecOutput {
        type Err = Infallible;

        fn push_frame(&mut self, sample_l: i16, sample_r: i16) -> Result<(), Self::Err> {
            self.0.push((sample_l, sample_r));
            Ok(())
        }
    }

    fn square_wave_writes(at: u64) -> Vec<ScheduledWrite> {
        let samples = (0..32).map(|i| if i < 16 { 127 } else { -128 }).collect();
        [
            RegisterWrite::WaveformTable { channel: 0, samples },
            RegisterWrite::FrequencyValue { channel: 0, value: 0x1FF },
            RegisterWrite::Volume { offset: 0, data: 15 },
            RegisterWrite::Keyonoff { data: 0x01 },
        ]
        .into_iter()
        .map(|write| ScheduledWrite { at, write })
        .collect()
    }

    #[test]
    fn silent_without_writes() {
        let mut chip = K051649::new(3_579_545, 44_100);
        let mut output = VecOutput::default();

        render(&mut chip, &[], 1000, 735, &mut output).unwrap();

        assert_eq!(output.0.len(), 1000);
        assert!(output.0.iter().all(|&frame| frame == (0, 0)));
    }

    #[test]
    fn square_wave() {
        let mut chip = K051649::new(3_579_545, 44_100);
        let mut output = VecOutput::default();

        render(&mut chip, &square_wave_writes(0), 4410, 735, &mut output).unwrap();

        assert_eq!(output.0.len(), 4410);
        assert_eq!(output.0[0], (6092, 6092));
        assert!(output.0.iter().all(|&(l, r)| l == r && (l == 6092 || l == -6144)));
        assert!(output.0.contains(&(-6144, -6144)));
    }

    #[test]
    fn writes_apply_at_chunk_boundaries() {
        let mut chip = K051649::new(3_579_545, 44_100);
        let mut output = VecOutput::default();

        // Frame 150 falls inside the third 100-frame chunk, so the tone starts at frame 200
        render(&mut chip, &square_wave_writes(150), 400, 100, &mut output).unwrap();

        assert!(output.0[..200].iter().all(|&frame| frame == (0, 0)));
        assert_eq!(output.0[200], (6092, 6092));
    }

    #[test]
    fn script_settings_flow_through() {
        let script = Script::parse(
            r#"
            [[writes]]
            kind = "waveform_table"
            channel = 1
            samples = [
                127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127,
                127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127, 127,
            ]

            [[writes]]
            kind = "frequency_value"
            channel = 1
            value = 0x100

            [[writes]]
            kind = "volume"
            offset = 1
            data = 15

            [[writes]]
            kind = "keyonoff"
            data = 0x02
            "#,
        )
        .unwrap();

        let mut chip = K051649::new(3_579_545, 44_100);
        chip.set_output_route(scc_config::OutputRoute::Right);
        let mut output = VecOutput::default();

        render(&mut chip, &script.writes, 64, 16, &mut output).unwrap();

        assert!(output.0.iter().all(|&frame| frame == (0, 6092)));
    }
}
