//! Auxiliary effect slots: a wet buffer plus a polymorphic effect-state
//! object, per spec.md §3's EffectSlot entity and §6's backend-contract
//! `EffectState` capability set.
//!
//! Effect DSP bodies (reverb, chorus, ...) are an explicit non-goal; this
//! module provides the trait contract and a silence-passthrough reference
//! implementation, matching spec.md's "only the abstract interface" scope.

use aural_core::{FreeList, Mailbox};

/// Capability set every effect implementation exposes, per spec.md §6.
pub trait EffectState: Send {
    /// Called when the owning device's format/update-size changes.
    fn device_update(&mut self, sample_rate: u32, update_size: usize);

    /// Called when the slot's effect-specific parameters change.
    fn update(&mut self, props: &EffectSlotProps);

    /// Reads `wet_in` (the slot's accumulated wet buffer) and writes
    /// `out_channels` output channels.
    fn process(&mut self, wet_in: &[f32], out_channels: &mut [&mut [f32]]);
}

/// Reference effect implementation: passes the wet buffer straight to
/// output channel 0 and leaves the rest silent. Stands in for reverb/
/// chorus/echo bodies, which are out of scope.
#[derive(Debug, Default)]
pub struct PassthroughEffect;

impl EffectState for PassthroughEffect {
    fn device_update(&mut self, _sample_rate: u32, _update_size: usize) {}

    fn update(&mut self, _props: &EffectSlotProps) {}

    fn process(&mut self, wet_in: &[f32], out_channels: &mut [&mut [f32]]) {
        if let Some(first) = out_channels.first_mut() {
            let n = first.len().min(wet_in.len());
            for i in 0..n {
                first[i] += wet_in[i];
            }
        }
    }
}

/// Which effect type a slot currently hosts. Bodies beyond `None` are out
/// of scope; this enum exists so the parameter engine can route
/// per-send room-rolloff/decay-time/air-absorption fields correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectType {
    #[default]
    None,
    Reverb,
    Chorus,
    Echo,
}

/// Plain-data record the effect-slot-update procedure applies.
#[derive(Debug, Clone, Copy)]
pub struct EffectSlotProps {
    pub gain: f32,
    pub aux_send_auto: bool,
    pub effect_type: EffectType,
    pub room_rolloff_factor: f32,
    pub decay_time: f32,
    pub air_absorption_gain_hf: f32,
}

impl Default for EffectSlotProps {
    fn default() -> Self {
        Self {
            gain: 1.0,
            aux_send_auto: true,
            effect_type: EffectType::None,
            room_rolloff_factor: 0.0,
            decay_time: 1.49,
            air_absorption_gain_hf: 0.994,
        }
    }
}

/// A shared post-processing unit: receives per-source sends into its wet
/// buffer, processes, and writes to its own output channels.
pub struct EffectSlot {
    pub wet_buffer: Vec<f32>,
    pub state: Box<dyn EffectState>,
    pub props: EffectSlotProps,

    mailbox: Mailbox<EffectSlotProps>,
    free_list: FreeList<EffectSlotProps>,
}

impl EffectSlot {
    pub fn new(update_size: usize) -> Self {
        Self {
            wet_buffer: vec![0.0; update_size],
            state: Box::new(PassthroughEffect),
            props: EffectSlotProps::default(),
            mailbox: Mailbox::new(),
            free_list: FreeList::new(),
        }
    }

    pub fn publish(&self, props: EffectSlotProps) {
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

    /// The effect-slot-update procedure: symmetric to the listener update,
    /// additionally re-running the effect state's `update` hook so it can
    /// react to the new parameters.
    pub fn update(&mut self) -> bool {
        let Some(props) = self.mailbox.take() else {
            return false;
        };
        self.props = *props;
        self.state.update(&self.props);
        self.free_list.push(*props);
        true
    }

    pub fn clear_wet_buffer(&mut self) {
        self.wet_buffer.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_effect_copies_wet_into_first_channel() {
        let mut effect = PassthroughEffect;
        let wet = [1.0f32, 2.0, 3.0];
        let mut ch0 = [0.0f32; 3];
        let mut out: [&mut [f32]; 1] = [&mut ch0];
        effect.process(&wet, &mut out);
        assert_eq!(ch0, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn update_applies_published_props() {
        let mut slot = EffectSlot::new(16);
        let mut props = EffectSlotProps::default();
        props.gain = 0.25;
        slot.publish(props);
        assert!(slot.update());
        assert_eq!(slot.props.gain, 0.25);
        assert!(!slot.update());
    }
}
