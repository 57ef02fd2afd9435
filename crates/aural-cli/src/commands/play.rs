//! Plays a positioned source through the speakers.

use std::path::PathBuf;
use std::time::Duration;

use aural_engine::{Device, OutputMode, SourceState, render_block};
use aural_io::CpalBackend;
use clap::Args;

use super::common::{load_or_synthesize, parse_position};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_FRAMES: usize = 256;

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play; omit to play a synthesized tone
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Tone frequency in Hz, used when no file is given
    #[arg(long, default_value = "440.0")]
    tone_hz: f32,

    /// Tone duration in seconds, used when no file is given
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Source position as "x,y,z"
    #[arg(long, default_value = "0,0,2", value_parser = parse_position)]
    position: [f32; 3],

    /// Loop playback
    #[arg(short, long)]
    r#loop: bool,

    /// Output device name (default device if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let buffer = load_or_synthesize(args.file.as_deref(), Some(args.tone_hz), args.duration, SAMPLE_RATE)?;
    let frames = buffer.sample_length();

    let mut device = Device::new(Box::new(CpalBackend::new()), SAMPLE_RATE, BLOCK_FRAMES, OutputMode::Stereo);
    device.open(args.output.as_deref())?;

    let ctx_idx = device.add_context(1, 0);
    let src_idx = {
        let ctx = &mut device.contexts[ctx_idx];
        let src_idx = ctx.gen_source()?;
        let source = ctx.source_mut(src_idx)?;
        source.position = args.position;
        source.looping = args.r#loop;
        source.queue_buffers([buffer])?;
        source.play(src_idx);
        source.publish();
        src_idx
    };

    println!("Playing at {:?}{}", args.position, if args.r#loop { " (looping)" } else { "" });

    // A looping source never signals end-of-data on its own, so cap total
    // playback at a fixed number of repeats rather than waiting forever.
    const LOOP_REPEATS: usize = 3;
    let max_frames = if args.r#loop { frames * LOOP_REPEATS } else { usize::MAX };

    let block_duration = Duration::from_secs_f64(f64::from(BLOCK_FRAMES as u32) / f64::from(SAMPLE_RATE));
    let mut rendered = 0usize;
    loop {
        render_block(&mut device, BLOCK_FRAMES);
        let interleaved = interleave(&device.mix_buffers.real_out, BLOCK_FRAMES);
        device.backend_mut().write_output(&interleaved);
        std::thread::sleep(block_duration);
        rendered += BLOCK_FRAMES;

        if rendered >= max_frames {
            break;
        }
        let state = device.contexts[ctx_idx].source_mut(src_idx)?.state();
        if state != SourceState::Playing {
            break;
        }
    }

    device.close()?;
    Ok(())
}

fn interleave(real_out: &[Vec<f32>], frames: usize) -> Vec<f32> {
    let channels = real_out.len();
    let mut out = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        for ch in real_out {
            out.push(ch[frame]);
        }
    }
    out
}
