mod render;
mod script;
mod state;
mod wav;

use crate::script::Script;
use crate::wav::WavOutput;
use anyhow::{anyhow, Context};
use clap::Parser;
use env_logger::Env;
use k051649::K051649;
use scc_config::{
    OutputRoute, SccConfig, SccVariant, DEFAULT_MASTER_CLOCK, DEFAULT_OUTPUT_FREQUENCY,
};
use std::path::PathBuf;

const DEFAULT_DURATION_SECS: f64 = 2.0;

// The phase step divides by (clock / 16) / 32
const MIN_MASTER_CLOCK: u32 = 512;

#[derive(Parser)]
struct Args {
    /// Register-write script (TOML)
    #[arg(short = 's', long)]
    script: Option<PathBuf>,

    /// Output WAV file path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Chip master clock in Hz [default: 3579545]
    #[arg(long)]
    clock: Option<u32>,

    /// Output sample rate in Hz [default: 44100]
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Chip variant (K051649 / K052539)
    #[arg(long)]
    variant: Option<SccVariant>,

    /// Stereo routing (Left / Right / Both / None)
    #[arg(long)]
    route: Option<OutputRoute>,

    /// Output gain multiplier
    #[arg(long, allow_negative_numbers = true)]
    gain: Option<f64>,

    /// Update calls per second; register writes take effect at this granularity
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    /// Output length in seconds; overrides the script's duration [default: 2.0]
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<f64>,

    /// Write the final channel state to this file
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Restore channel state from this file before rendering
    #[arg(long)]
    load_state: Option<PathBuf>,
}

struct RenderSettings {
    master_clock: u32,
    sample_rate: u32,
    config: SccConfig,
    total_frames: u64,
    chunk_frames: usize,
}

impl Args {
    fn settings(&self, script: &Script) -> anyhow::Result<RenderSettings> {
        let master_clock = self.clock.or(script.clock).unwrap_or(DEFAULT_MASTER_CLOCK);
        if master_clock < MIN_MASTER_CLOCK {
            return Err(anyhow!(
                "master clock must be at least {MIN_MASTER_CLOCK} Hz, was {master_clock}"
            ));
        }

        let sample_rate =
            self.sample_rate.or(script.sample_rate).unwrap_or(DEFAULT_OUTPUT_FREQUENCY);
        if sample_rate == 0 {
            return Err(anyhow!("sample rate must be positive"));
        }

        if self.frame_rate == 0 {
            return Err(anyhow!("frame rate must be positive"));
        }

        let duration = self.duration.or(script.duration).unwrap_or(DEFAULT_DURATION_SECS);
        if !duration.is_finite() || duration < 0.0 {
            return Err(anyhow!(
                "duration must be a non-negative number of seconds, was {duration}"
            ));
        }

        let config = SccConfig {
            variant: self.variant.or(script.variant).unwrap_or_default(),
            gain: self.gain.or(script.gain).unwrap_or(1.0),
            route: self.route.or(script.route).unwrap_or_default(),
        };

        Ok(RenderSettings {
            master_clock,
            sample_rate,
            config,
            total_frames: (duration * f64::from(sample_rate)).round() as u64,
            chunk_frames: (sample_rate / self.frame_rate).max(1) as usize,
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => {
            log::warn!("No script given; rendering silence");
            Script::default()
        }
    };

    let settings = args.settings(&script)?;

    let mut chip =
        K051649::with_config(settings.master_clock, settings.sample_rate, &settings.config);

    if let Some(path) = &args.load_state {
        state::load_state(&mut chip, path)
            .with_context(|| format!("Unable to load state from '{}'", path.display()))?;
    }

    if script.last_write_frame() > settings.total_frames {
        log::warn!(
            "Script schedules writes up to frame {} but only {} frames will be rendered",
            script.last_write_frame(),
            settings.total_frames
        );
    }

    log::info!(
        "Rendering {} frames at {} Hz ({}, route {}, gain {}) to '{}'",
        settings.total_frames,
        settings.sample_rate,
        settings.config.variant,
        settings.config.route,
        settings.config.gain,
        args.output.display()
    );

    let mut output = WavOutput::create(&args.output, settings.sample_rate)
        .with_context(|| format!("Unable to create WAV file '{}'", args.output.display()))?;
    render::render(
        &mut chip,
        &script.writes,
        settings.total_frames,
        settings.chunk_frames,
        &mut output,
    )
    .context("Error writing WAV samples")?;

    let frames_written = output.frames_written();
    output.finalize().context("Unable to finalize WAV file")?;

    log::info!("Wrote {frames_written} frames");

    if let Some(path) = &args.save_state {
        state::save_state(&chip, path)
            .with_context(|| format!("Unable to save state to '{}'", path.display()))?;
    }

    chip.exit();

    Ok(())
}
