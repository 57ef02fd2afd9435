//! Application-visible sound emitters: attributes, buffer queue, and the
//! state machine spec.md §4.9 describes.
//!
//! The queue is a `VecDeque<BufferQueueItem>` rather than the boxed
//! singly-linked chain spec.md's data model describes literally — Rust's
//! ownership rules make a hand-rolled pointer chain awkward without
//! `unsafe`, which this workspace denies outside `aural-core::propagation`,
//! and a deque gives the same "append at tail, consume from head, never
//! remove an unconsumed item" semantics the source actually needs.

use std::collections::VecDeque;

use aural_core::{FreeList, Mailbox};
use aural_spatial::DistanceModel;

use crate::buffer::{Buffer, BufferQueueItem};
use crate::error::AlError;
use crate::voice::MAX_SENDS;

/// A source's binding toward one of its `MAX_SENDS` auxiliary sends:
/// which effect slot it routes to (`None` if unbound) and the per-send
/// gain, per spec.md's "Aux send" glossary entry.
#[derive(Debug, Clone, Copy)]
pub struct AuxSend {
    pub slot: Option<usize>,
    pub gain: f32,
}

impl Default for AuxSend {
    fn default() -> Self {
        Self { slot: None, gain: 1.0 }
    }
}

/// Whether a source holds one fixed buffer (`Static`), a growable queue
/// (`Streaming`), or has not yet been assigned a buffer (`Undetermined`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    Undetermined,
    Static,
    Streaming,
}

/// Source playback state, per spec.md §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Application-facing source attributes (API-thread-owned copy).
#[derive(Debug, Clone)]
pub struct Source {
    pub pitch: f32,
    pub gain: f32,
    pub min_gain: f32,
    pub max_gain: f32,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
    pub outer_gain: f32,
    pub outer_gain_hf: f32,
    pub reference_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub direction: [f32; 3],
    pub head_relative: bool,
    pub looping: bool,
    /// `None` means "use the context's distance model".
    pub distance_model: Option<DistanceModel>,
    pub radius: f32,
    pub stereo_pan: f32,
    pub sends: [AuxSend; MAX_SENDS],

    source_type: SourceType,
    state: SourceState,
    queue: VecDeque<BufferQueueItem>,
    /// Offset into the head-of-queue buffer, in sample frames.
    offset: usize,
    processed_count: usize,
    voice_index: Option<usize>,

    mailbox: Mailbox<SourceProps>,
    free_list: FreeList<SourceProps>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            gain: 1.0,
            min_gain: 0.0,
            max_gain: 1.0,
            inner_cone_angle: 360.0,
            outer_cone_angle: 360.0,
            outer_gain: 0.0,
            outer_gain_hf: 1.0,
            reference_distance: 1.0,
            max_distance: f32::MAX,
            rolloff_factor: 1.0,
            position: [0.0; 3],
            velocity: [0.0; 3],
            direction: [0.0; 3],
            head_relative: false,
            looping: false,
            distance_model: None,
            radius: 0.0,
            stereo_pan: 0.0,
            sends: [AuxSend::default(); MAX_SENDS],
            source_type: SourceType::default(),
            state: SourceState::default(),
            queue: VecDeque::new(),
            offset: 0,
            processed_count: 0,
            voice_index: None,
            mailbox: Mailbox::new(),
            free_list: FreeList::new(),
        }
    }
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn voice_index(&self) -> Option<usize> {
        self.voice_index
    }

    pub fn buffers_processed(&self) -> usize {
        self.processed_count
    }

    pub fn buffers_queued(&self) -> usize {
        self.queue.len()
    }

    /// `AL_BUFFER` set on a STATIC/UNDETERMINED source: assigns the single
    /// buffer and fixes the source as STATIC. Fails if the source is
    /// currently PLAYING or PAUSED (spec.md §3's STATIC-set invariant).
    pub fn set_static_buffer(&mut self, buffer: Option<Buffer>) -> Result<(), AlError> {
        if matches!(self.state, SourceState::Playing | SourceState::Paused) {
            return Err(AlError::InvalidOperation);
        }
        self.queue.clear();
        self.processed_count = 0;
        self.offset = 0;
        match buffer {
            Some(b) => {
                self.queue.push_back(BufferQueueItem::new(b));
                self.source_type = SourceType::Static;
            }
            None => self.source_type = SourceType::Undetermined,
        }
        Ok(())
    }

    /// `alSourceQueueBuffers`: only legal on STREAMING or UNDETERMINED
    /// sources.
    pub fn queue_buffers(&mut self, buffers: impl IntoIterator<Item = Buffer>) -> Result<(), AlError> {
        if self.source_type == SourceType::Static {
            return Err(AlError::InvalidOperation);
        }
        self.source_type = SourceType::Streaming;
        for b in buffers {
            self.queue.push_back(BufferQueueItem::new(b));
        }
        Ok(())
    }

    /// `alSourceUnqueueBuffers`: removes up to `count` already-processed
    /// items from the head of the queue. Fails without mutation if fewer
    /// than `count` items are processed, or if the source is looping
    /// (testable property 8).
    pub fn unqueue_buffers(&mut self, count: usize) -> Result<Vec<Buffer>, AlError> {
        if self.looping || count > self.processed_count {
            return Err(AlError::InvalidValue);
        }
        let mut removed = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(item) = self.queue.pop_front() {
                self.processed_count -= 1;
                if let Some(buf) = item.buffer {
                    removed.push(buf);
                }
            }
        }
        Ok(removed)
    }

    /// Marks the head-of-queue item consumed and advances to the next,
    /// called by the voice mixer when playback passes the end of a
    /// buffer. Returns `false` once the queue is exhausted and the source
    /// is not looping (the voice should stop).
    pub fn advance_queue(&mut self) -> bool {
        if self.looping && self.source_type == SourceType::Static {
            let loop_start = self.current_buffer().map_or(0, Buffer::loop_start);
            self.offset = loop_start;
            return true;
        }
        self.processed_count += 1;
        self.offset = 0;
        !self.queue.is_empty() && self.processed_count < self.queue.len()
    }

    pub fn current_buffer(&self) -> Option<&Buffer> {
        self.queue.get(self.processed_count).and_then(|item| item.buffer.as_ref())
    }

    /// `AL_AUXILIARY_SEND_FILTER`: binds (or unbinds, with `slot: None`)
    /// send `send` to an effect slot with the given gain.
    pub fn set_aux_send(&mut self, send: usize, slot: Option<usize>, gain: f32) -> Result<(), AlError> {
        let entry = self.sends.get_mut(send).ok_or(AlError::InvalidValue)?;
        entry.slot = slot;
        entry.gain = gain;
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Seeks the playback offset directly, used by `AL_SEC_OFFSET`-style
    /// setters and to resume mid-buffer after a rewind-and-replay.
    pub fn offset_to(&mut self, frame: usize) {
        self.offset = frame;
    }

    /// Reads up to `dst.len()` samples of `channel` (wrapped modulo the
    /// current buffer's channel count) starting at the playback offset,
    /// stopping at the loop end (if looping) or the buffer's end.
    /// Advances the offset by the amount actually read.
    pub fn read_into(&mut self, channel: usize, dst: &mut [f32]) -> usize {
        let Some(buf) = self.current_buffer() else {
            return 0;
        };
        let channels = buf.channels().max(1) as usize;
        let src_channel = channel % channels;
        let limit = if self.looping && self.source_type == SourceType::Static {
            buf.loop_end()
        } else {
            buf.sample_length()
        };
        let available = limit.saturating_sub(self.offset);
        let n = available.min(dst.len());
        if n == 0 {
            return 0;
        }
        buf.read_channel(src_channel, self.offset, &mut dst[..n]);
        self.offset += n;
        n
    }

    /// `Play` from any state: allocates a voice (via `voice_index`), seeds
    /// resampler/HRTF history to zero by virtue of being a fresh
    /// [`crate::voice::Voice`], and applies any pending offset.
    pub fn play(&mut self, voice_index: usize) {
        self.state = SourceState::Playing;
        self.voice_index = Some(voice_index);
    }

    /// `Pause` from PLAYING -> PAUSED; no-op otherwise.
    pub fn pause(&mut self) {
        if self.state == SourceState::Playing {
            self.state = SourceState::Paused;
        }
    }

    /// `Stop` from {PLAYING, PAUSED} -> STOPPED; keeps the queue, clears
    /// the voice assignment.
    pub fn stop(&mut self) {
        if matches!(self.state, SourceState::Playing | SourceState::Paused) {
            self.state = SourceState::Stopped;
            self.voice_index = None;
        }
    }

    /// `Rewind` from any state -> INITIAL; keeps the queue, resets offset.
    pub fn rewind(&mut self) {
        self.state = SourceState::Initial;
        self.voice_index = None;
        self.offset = 0;
        self.processed_count = 0;
    }

    /// Called by the mixer when the queue is exhausted mid-block and the
    /// source is not looping: PLAYING -> STOPPED implicitly.
    pub fn stop_from_mixer(&mut self) {
        self.state = SourceState::Stopped;
        self.voice_index = None;
    }

    pub fn snapshot(&self) -> SourceProps {
        SourceProps {
            pitch: self.pitch,
            gain: self.gain.clamp(self.min_gain, self.max_gain),
            inner_cone_angle: self.inner_cone_angle.to_radians(),
            outer_cone_angle: self.outer_cone_angle.to_radians(),
            outer_gain: self.outer_gain,
            outer_gain_hf: self.outer_gain_hf,
            reference_distance: self.reference_distance,
            max_distance: self.max_distance,
            rolloff_factor: self.rolloff_factor,
            position: self.position,
            velocity: self.velocity,
            direction: self.direction,
            head_relative: self.head_relative,
            distance_model: self.distance_model,
            radius: self.radius,
            stereo_pan: self.stereo_pan,
            sends: self.sends,
        }
    }

    /// Publishes the current attributes to the mixer's mailbox, recycling
    /// a freed snapshot when available.
    pub fn publish(&self) {
        let props = self.snapshot();
        let boxed = match self.free_list.pop() {
            Some(mut recycled) => {
                recycled = props;
                Box::new(recycled)
            }
            None => Box::new(props),
        };
        if let Some(previous) = self.mailbox.publish(boxed) {
            self.free_list.push(*previous);
        }
    }

    /// Mixer-side: exchanges out a pending snapshot, if any.
    pub fn take_update(&self) -> Option<Box<SourceProps>> {
        self.mailbox.take()
    }

    pub fn recycle(&self, props: SourceProps) {
        self.free_list.push(props);
    }
}

/// Plain-data record consumed by the per-voice parameter-update
/// procedure (spec.md §4.8).
#[derive(Debug, Clone, Copy)]
pub struct SourceProps {
    pub pitch: f32,
    pub gain: f32,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
    pub outer_gain: f32,
    pub outer_gain_hf: f32,
    pub reference_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub direction: [f32; 3],
    pub head_relative: bool,
    pub distance_model: Option<DistanceModel>,
    pub radius: f32,
    pub stereo_pan: f32,
    pub sends: [AuxSend; MAX_SENDS],
}

#[cfg(test)]
mod tests {
    use super::*;
    use aural_core::SampleFormat;
    use crate::buffer::Buffer;

    fn test_buffer() -> Buffer {
        Buffer::new(44100, SampleFormat::F32, vec![vec![0.0; 100]], 0, 100).unwrap()
    }

    #[test]
    fn static_buffer_rejected_while_playing() {
        let mut src = Source::new();
        src.queue_buffers([test_buffer()]).unwrap();
        src.play(0);
        assert_eq!(src.set_static_buffer(Some(test_buffer())), Err(AlError::InvalidOperation));
    }

    #[test]
    fn queueing_on_static_source_fails() {
        let mut src = Source::new();
        src.set_static_buffer(Some(test_buffer())).unwrap();
        assert_eq!(src.queue_buffers([test_buffer()]), Err(AlError::InvalidOperation));
    }

    #[test]
    fn unqueue_fails_when_nothing_processed() {
        let mut src = Source::new();
        src.queue_buffers([test_buffer(), test_buffer()]).unwrap();
        assert_eq!(src.unqueue_buffers(1), Err(AlError::InvalidValue));
    }

    #[test]
    fn unqueue_fails_on_looping_source() {
        let mut src = Source::new();
        src.looping = true;
        src.queue_buffers([test_buffer()]).unwrap();
        assert_eq!(src.unqueue_buffers(1), Err(AlError::InvalidValue));
    }

    #[test]
    fn advance_queue_tracks_processed_count_and_end_of_queue() {
        let mut src = Source::new();
        src.queue_buffers([test_buffer(), test_buffer()]).unwrap();
        assert!(src.advance_queue());
        assert_eq!(src.buffers_processed(), 1);
        assert!(!src.advance_queue());
        assert_eq!(src.buffers_processed(), 2);
    }

    #[test]
    fn read_into_wraps_at_loop_end_for_static_looping_source() {
        let buf = Buffer::new(44100, SampleFormat::F32, vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]], 1, 4).unwrap();
        let mut src = Source::new();
        src.looping = true;
        src.set_static_buffer(Some(buf)).unwrap();
        src.offset_to(3);
        let mut dst = [0.0f32; 2];
        let n = src.read_into(0, &mut dst);
        assert_eq!(n, 1);
        assert_eq!(dst[..1], [4.0]);
        assert!(src.advance_queue());
        assert_eq!(src.offset(), 1);
    }

    #[test]
    fn play_pause_stop_rewind_transitions() {
        let mut src = Source::new();
        src.queue_buffers([test_buffer()]).unwrap();
        src.play(3);
        assert_eq!(src.state(), SourceState::Playing);
        assert_eq!(src.voice_index(), Some(3));
        src.pause();
        assert_eq!(src.state(), SourceState::Paused);
        src.stop();
        assert_eq!(src.state(), SourceState::Stopped);
        assert_eq!(src.voice_index(), None);
        src.rewind();
        assert_eq!(src.state(), SourceState::Initial);
    }
}
