//! A context: the listener, plus fixed-capacity source/effect-slot/voice
//! pools it exclusively owns, per spec.md §3 and §5's ownership model.
//!
//! Deferred updates (`alcSuspendContext`/`alcProcessContext`) and the
//! generation counter that forces a full voice-parameter recompute after a
//! listener/distance-model change both live here, per spec.md §4.9.

use aural_spatial::DistanceModel;

use crate::effect_slot::EffectSlot;
use crate::error::{AlError, ErrorLatch};
use crate::listener::{Listener, ListenerSlot};
use crate::source::Source;
use crate::voice::Voice;

/// Whether deferred updates (batched between `alcSuspendContext` and
/// `alcProcessContext`) are currently being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeferState {
    #[default]
    Immediate,
    /// Updates publish to their mailboxes as usual but the parameter
    /// engine is told to skip consuming them until resumed.
    Holding,
}

/// Monotonic counter bumped whenever a context-wide change (listener
/// move, distance model, doppler factor) invalidates every voice's
/// cached panning/filter parameters. Per spec.md §4.9's even/odd
/// convention: readers treat an odd value as "update in progress".
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateCount(u64);

impl UpdateCount {
    pub fn begin(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn end(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_settled(&self) -> bool {
        self.0 % 2 == 0
    }
}

/// A fixed-capacity slot that may or may not currently hold a live entity,
/// keyed by a stable index the application-facing handle refers to.
pub struct Slot<T> {
    pub value: T,
    pub in_use: bool,
}

/// Exclusive owner of one listener, a fixed pool of sources, effect
/// slots, and voices. Contexts never share entities: each is rendered by
/// exactly one device's mixer thread.
pub struct Context {
    pub listener: Listener,
    pub listener_slot: ListenerSlot,
    pub sources: Vec<Slot<Source>>,
    pub effect_slots: Vec<Slot<EffectSlot>>,
    max_effect_slots: usize,
    pub voices: Vec<Option<Voice>>,

    pub distance_model: DistanceModel,
    pub doppler_factor: f32,
    pub speed_of_sound: f32,

    pub defer_state: DeferState,
    pub update_count: UpdateCount,
    pub errors: ErrorLatch<AlError>,
}

impl Context {
    pub fn new(max_sources: usize, max_effect_slots: usize) -> Self {
        Self {
            listener: Listener::default(),
            listener_slot: ListenerSlot::new(),
            sources: (0..max_sources)
                .map(|_| Slot {
                    value: Source::new(),
                    in_use: false,
                })
                .collect(),
            effect_slots: Vec::with_capacity(max_effect_slots),
            max_effect_slots,
            voices: (0..max_sources).map(|_| None).collect(),
            distance_model: DistanceModel::Inverse { clamped: true },
            doppler_factor: 1.0,
            speed_of_sound: aural_spatial::bformat::SPEED_OF_SOUND,
            defer_state: DeferState::Immediate,
            update_count: UpdateCount::default(),
            errors: ErrorLatch::new(),
        }
    }

    /// `alGenSources`: reserves the first free slot, returning its stable
    /// index, or `OutOfMemory` once every slot is in use.
    pub fn gen_source(&mut self) -> Result<usize, AlError> {
        let slot = self.sources.iter_mut().enumerate().find(|(_, s)| !s.in_use);
        match slot {
            Some((idx, slot)) => {
                slot.value = Source::new();
                slot.in_use = true;
                Ok(idx)
            }
            None => Err(AlError::OutOfMemory),
        }
    }

    /// `alDeleteSources`: frees the slot. Fails if the source is currently
    /// PLAYING or PAUSED (it must be stopped first).
    pub fn delete_source(&mut self, index: usize) -> Result<(), AlError> {
        let slot = self.sources.get_mut(index).ok_or(AlError::InvalidName)?;
        if !slot.in_use {
            return Err(AlError::InvalidName);
        }
        if matches!(slot.value.state(), crate::source::SourceState::Playing | crate::source::SourceState::Paused) {
            return Err(AlError::InvalidOperation);
        }
        slot.in_use = false;
        self.voices[index] = None;
        Ok(())
    }

    pub fn source(&self, index: usize) -> Result<&Source, AlError> {
        self.sources.get(index).filter(|s| s.in_use).map(|s| &s.value).ok_or(AlError::InvalidName)
    }

    pub fn source_mut(&mut self, index: usize) -> Result<&mut Source, AlError> {
        self.sources.get_mut(index).filter(|s| s.in_use).map(|s| &mut s.value).ok_or(AlError::InvalidName)
    }

    /// `alGenAuxiliaryEffectSlots`: reserves a free slot (reusing a
    /// previously deleted one where possible), sizing its wet buffer to
    /// `update_size` samples. Fails once `max_effect_slots` are in use.
    pub fn gen_effect_slot(&mut self, update_size: usize) -> Result<usize, AlError> {
        if let Some((idx, slot)) = self.effect_slots.iter_mut().enumerate().find(|(_, s)| !s.in_use) {
            slot.value = EffectSlot::new(update_size);
            slot.in_use = true;
            return Ok(idx);
        }
        if self.effect_slots.len() >= self.max_effect_slots {
            return Err(AlError::OutOfMemory);
        }
        self.effect_slots.push(Slot {
            value: EffectSlot::new(update_size),
            in_use: true,
        });
        Ok(self.effect_slots.len() - 1)
    }

    /// `alDeleteAuxiliaryEffectSlots`: frees the slot. Existing sends still
    /// bound to it simply stop finding an in-use target on the next render.
    pub fn delete_effect_slot(&mut self, index: usize) -> Result<(), AlError> {
        let slot = self.effect_slots.get_mut(index).ok_or(AlError::InvalidName)?;
        if !slot.in_use {
            return Err(AlError::InvalidName);
        }
        slot.in_use = false;
        Ok(())
    }

    pub fn effect_slot(&self, index: usize) -> Result<&EffectSlot, AlError> {
        self.effect_slots.get(index).filter(|s| s.in_use).map(|s| &s.value).ok_or(AlError::InvalidName)
    }

    pub fn effect_slot_mut(&mut self, index: usize) -> Result<&mut EffectSlot, AlError> {
        self.effect_slots.get_mut(index).filter(|s| s.in_use).map(|s| &mut s.value).ok_or(AlError::InvalidName)
    }

    /// Begins deferred-update batching: published snapshots still queue
    /// in their mailboxes but the parameter engine won't consume them
    /// until [`Self::resume_updates`].
    pub fn suspend_updates(&mut self) {
        self.defer_state = DeferState::Holding;
    }

    pub fn resume_updates(&mut self) {
        self.defer_state = DeferState::Immediate;
    }

    pub fn updates_held(&self) -> bool {
        self.defer_state == DeferState::Holding
    }

    /// Publishes the listener's current attributes and bumps the
    /// generation counter, forcing every voice to recompute its
    /// panning/filter parameters on the next render.
    pub fn commit_listener(&mut self) {
        self.listener_slot.publish(self.listener.snapshot());
        self.update_count.begin();
        self.update_count.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_source_reuses_freed_slots() {
        let mut ctx = Context::new(2, 1);
        let a = ctx.gen_source().unwrap();
        let b = ctx.gen_source().unwrap();
        assert_eq!(ctx.gen_source(), Err(AlError::OutOfMemory));
        ctx.delete_source(a).unwrap();
        let c = ctx.gen_source().unwrap();
        assert_eq!(c, a);
        assert_ne!(b, c);
    }

    #[test]
    fn delete_source_rejects_playing_source() {
        let mut ctx = Context::new(1, 0);
        let idx = ctx.gen_source().unwrap();
        ctx.source_mut(idx).unwrap().play(0);
        assert_eq!(ctx.delete_source(idx), Err(AlError::InvalidOperation));
    }

    #[test]
    fn update_count_is_settled_after_commit() {
        let mut ctx = Context::new(1, 0);
        ctx.commit_listener();
        assert!(ctx.update_count.is_settled());
    }

    #[test]
    fn suspend_holds_updates_until_resumed() {
        let mut ctx = Context::new(1, 0);
        assert!(!ctx.updates_held());
        ctx.suspend_updates();
        assert!(ctx.updates_held());
        ctx.resume_updates();
        assert!(!ctx.updates_held());
    }

    #[test]
    fn gen_effect_slot_reuses_freed_slots() {
        let mut ctx = Context::new(1, 2);
        let a = ctx.gen_effect_slot(64).unwrap();
        let b = ctx.gen_effect_slot(64).unwrap();
        assert_eq!(ctx.gen_effect_slot(64), Err(AlError::OutOfMemory));
        ctx.delete_effect_slot(a).unwrap();
        let c = ctx.gen_effect_slot(64).unwrap();
        assert_eq!(c, a);
        assert_ne!(b, c);
    }

    #[test]
    fn delete_effect_slot_rejects_unused_index() {
        let mut ctx = Context::new(1, 1);
        assert_eq!(ctx.delete_effect_slot(0), Err(AlError::InvalidName));
        let idx = ctx.gen_effect_slot(64).unwrap();
        ctx.delete_effect_slot(idx).unwrap();
        assert_eq!(ctx.delete_effect_slot(idx), Err(AlError::InvalidName));
    }

    #[test]
    fn effect_slot_accessors_reject_freed_index() {
        let mut ctx = Context::new(1, 1);
        let idx = ctx.gen_effect_slot(64).unwrap();
        assert!(ctx.effect_slot(idx).is_ok());
        ctx.delete_effect_slot(idx).unwrap();
        assert_eq!(ctx.effect_slot(idx).err(), Some(AlError::InvalidName));
        assert_eq!(ctx.effect_slot_mut(idx).err(), Some(AlError::InvalidName));
    }
}
