//! Renders a positioned source offline to a WAV file, via the loopback
//! backend (no platform audio device needed).

use std::path::PathBuf;

use aural_engine::{Device, OutputMode, SourceState, render_block};
use aural_io::{LoopbackBackend, WavSpec, write_wav};
use clap::Args;

use super::common::{load_or_synthesize, parse_position};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_FRAMES: usize = 256;

#[derive(Args)]
pub struct RenderArgs {
    /// WAV file to render; omit to render a synthesized tone
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Tone frequency in Hz, used when no input file is given
    #[arg(long, default_value = "440.0")]
    tone_hz: f32,

    /// Tone duration in seconds, used when no input file is given
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Source position as "x,y,z"
    #[arg(long, default_value = "0,0,2", value_parser = parse_position)]
    position: [f32; 3],

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let buffer = load_or_synthesize(args.input.as_deref(), Some(args.tone_hz), args.duration, SAMPLE_RATE)?;
    let frames = buffer.sample_length();

    let mut device = Device::new(Box::new(LoopbackBackend::new()), SAMPLE_RATE, BLOCK_FRAMES, OutputMode::Stereo);
    device.open(None)?;

    let ctx_idx = device.add_context(1, 0);
    let src_idx = {
        let ctx = &mut device.contexts[ctx_idx];
        let src_idx = ctx.gen_source()?;
        let source = ctx.source_mut(src_idx)?;
        source.position = args.position;
        source.queue_buffers([buffer])?;
        source.play(src_idx);
        source.publish();
        src_idx
    };

    let channels = device.mix_buffers.real_out.len();
    let mut mixed = Vec::with_capacity((frames + BLOCK_FRAMES) * channels);
    let mut rendered = 0usize;
    while rendered < frames + BLOCK_FRAMES {
        render_block(&mut device, BLOCK_FRAMES);
        let interleaved = interleave(&device.mix_buffers.real_out, BLOCK_FRAMES);
        device.backend_mut().write_output(&interleaved);
        mixed.extend_from_slice(&interleaved);
        rendered += BLOCK_FRAMES;

        if device.contexts[ctx_idx].source_mut(src_idx)?.state() != SourceState::Playing {
            break;
        }
    }
    device.close()?;

    let planar = deinterleave(&mixed, channels);
    write_wav(&args.output, &planar, WavSpec { channels: channels as u16, sample_rate: SAMPLE_RATE, bits_per_sample: 32 })?;
    println!("Rendered {} frames to {}", mixed.len() / channels.max(1), args.output.display());
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

fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels.max(1);
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            planar[ch].push(s);
        }
    }
    planar
}
