//! Errors surfaced by the DSP primitives themselves (decode/format
//! mismatches). Most of `aural-core`'s hot path is infallible by
//! construction — callers size buffers correctly up front — so this enum
//! only covers the sample loader's input-validation surface.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("source buffer too short for {frame_count} frames of format {format:?}")]
    TruncatedSource {
        frame_count: usize,
        format: &'static str,
    },
    #[error("block_align {block_align} too small to hold an ADPCM header for {channels} channel(s)")]
    BlockTooSmall { block_align: usize, channels: usize },
}
