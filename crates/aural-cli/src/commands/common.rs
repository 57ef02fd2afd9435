//! Shared helpers: buffer loading/synthesis and position-argument parsing.

use std::path::Path;

use aural_core::SampleFormat;
use aural_engine::Buffer;

/// Parses a `"x,y,z"` position argument.
pub fn parse_position(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    let [x, y, z] = parts[..] else {
        return Err(format!("expected \"x,y,z\", got \"{s}\""));
    };
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("bad coordinate \"{v}\": {e}"));
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

/// Loads a WAV file, or synthesizes a mono sine tone if none is given.
pub fn load_or_synthesize(file: Option<&Path>, tone_hz: Option<f32>, duration_secs: f32, sample_rate: u32) -> anyhow::Result<Buffer> {
    if let Some(path) = file {
        let (planar, spec) = aural_io::read_wav(path)?;
        return Ok(Buffer::new(spec.sample_rate, SampleFormat::F32, planar, 0, 0)?);
    }

    let freq = tone_hz.unwrap_or(440.0);
    let frames = (duration_secs.max(0.0) * sample_rate as f32) as usize;
    let samples: Vec<f32> = (0..frames)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect();
    Ok(Buffer::new(sample_rate, SampleFormat::F32, vec![samples], 0, 0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_accepts_three_floats() {
        assert_eq!(parse_position("1,-2.5,3").unwrap(), [1.0, -2.5, 3.0]);
    }

    #[test]
    fn parse_position_rejects_wrong_arity() {
        assert!(parse_position("1,2").is_err());
    }

    #[test]
    fn synthesize_produces_expected_frame_count() {
        let buffer = load_or_synthesize(None, Some(440.0), 1.0, 48000).unwrap();
        assert_eq!(buffer.sample_length(), 48000);
    }
}
