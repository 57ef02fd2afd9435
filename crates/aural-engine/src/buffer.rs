//! Immutable sample data plus loop/format metadata, and the buffer-queue
//! chain a [`crate::source::Source`] walks during mixing.
//!
//! Grounded on spec.md §3's Buffer/"Buffer queue item" entities.

use std::sync::Arc;

use aural_core::SampleFormat;

/// Immutable, reference-counted sample data. Cloning a `Buffer` is cheap
/// (an `Arc` bump) — multiple sources and queue items can share one.
#[derive(Debug, Clone)]
pub struct Buffer {
    inner: Arc<BufferData>,
}

#[derive(Debug)]
struct BufferData {
    frequency: u32,
    format: SampleFormat,
    channels: u16,
    /// Decoded, per-channel float samples: `samples[channel][frame]`.
    samples: Vec<Vec<f32>>,
    loop_start: usize,
    loop_end: usize,
}

/// Raised when constructing a [`Buffer`] from metadata that violates its
/// own invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("loop_start ({loop_start}) must be <= loop_end ({loop_end})")]
    LoopStartAfterEnd { loop_start: usize, loop_end: usize },
    #[error("loop_end ({loop_end}) must be <= sample length ({length})")]
    LoopEndBeyondLength { loop_end: usize, length: usize },
}

impl Buffer {
    /// Builds a buffer from already-decoded per-channel float samples.
    /// `loop_start <= loop_end <= sample_length` is enforced per spec.md
    /// §3's Buffer invariant.
    pub fn new(
        frequency: u32,
        format: SampleFormat,
        samples: Vec<Vec<f32>>,
        loop_start: usize,
        loop_end: usize,
    ) -> Result<Self, BufferError> {
        let length = samples.first().map_or(0, Vec::len);
        if loop_start > loop_end {
            return Err(BufferError::LoopStartAfterEnd { loop_start, loop_end });
        }
        if loop_end > length {
            return Err(BufferError::LoopEndBeyondLength { loop_end, length });
        }
        let channels = samples.len() as u16;
        Ok(Self {
            inner: Arc::new(BufferData {
                frequency,
                format,
                channels,
                samples,
                loop_start,
                loop_end,
            }),
        })
    }

    pub fn frequency(&self) -> u32 {
        self.inner.frequency
    }

    pub fn format(&self) -> SampleFormat {
        self.inner.format
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn sample_length(&self) -> usize {
        self.inner.samples.first().map_or(0, Vec::len)
    }

    pub fn loop_start(&self) -> usize {
        self.inner.loop_start
    }

    pub fn loop_end(&self) -> usize {
        self.inner.loop_end
    }

    /// Reference count currently held by sources/queue items.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Reads `count` samples of `channel` starting at `start`, clamped to
    /// the buffer's length (the caller silence-fills any shortfall).
    pub fn read_channel(&self, channel: usize, start: usize, dst: &mut [f32]) -> usize {
        let Some(chan) = self.inner.samples.get(channel) else {
            return 0;
        };
        let available = chan.len().saturating_sub(start);
        let n = available.min(dst.len());
        dst[..n].copy_from_slice(&chan[start..start + n]);
        n
    }
}

/// A single buffer-queue element, held in a [`crate::source::Source`]'s
/// `VecDeque` queue. A STATIC source holds exactly one of these; a
/// STREAMING source holds several, appended by `queue` and trimmed by
/// `unqueue` (only once the item has been fully consumed).
#[derive(Debug, Clone)]
pub struct BufferQueueItem {
    pub buffer: Option<Buffer>,
}

impl BufferQueueItem {
    pub fn new(buffer: Buffer) -> Self {
        Self { buffer: Some(buffer) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_loop_start_after_end() {
        let err = Buffer::new(44100, SampleFormat::F32, vec![vec![0.0; 10]], 5, 2).unwrap_err();
        assert_eq!(err, BufferError::LoopStartAfterEnd { loop_start: 5, loop_end: 2 });
    }

    #[test]
    fn rejects_loop_end_beyond_length() {
        let err = Buffer::new(44100, SampleFormat::F32, vec![vec![0.0; 10]], 0, 20).unwrap_err();
        assert_eq!(err, BufferError::LoopEndBeyondLength { loop_end: 20, length: 10 });
    }

    #[test]
    fn read_channel_clamps_at_end_of_data() {
        let buf = Buffer::new(44100, SampleFormat::F32, vec![vec![1.0, 2.0, 3.0]], 0, 3).unwrap();
        let mut dst = [0.0f32; 5];
        let n = buf.read_channel(0, 1, &mut dst);
        assert_eq!(n, 2);
        assert_eq!(&dst[..2], &[2.0, 3.0]);
    }

    #[test]
    fn cloning_shares_storage_and_bumps_refcount() {
        let buf = Buffer::new(44100, SampleFormat::F32, vec![vec![0.0; 4]], 0, 4).unwrap();
        let clone = buf.clone();
        assert_eq!(buf.ref_count(), 2);
        drop(clone);
        assert_eq!(buf.ref_count(), 1);
    }
}
