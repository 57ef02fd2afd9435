//! The per-context listener: application-facing state plus the property
//! snapshot the parameter engine consumes.
//!
//! Grounded on spec.md §3's Listener entity and §4.9's property
//! propagation: the API thread publishes a [`ListenerProps`] snapshot
//! through a [`Mailbox`]; the parameter engine exchanges it out once per
//! block.

use aural_core::{FreeList, Mailbox};

/// Application-facing listener state (the API-thread-owned copy).
#[derive(Debug, Clone, Copy)]
pub struct Listener {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub forward: [f32; 3],
    pub up: [f32; 3],
    pub gain: f32,
    pub meters_per_unit: f32,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            velocity: [0.0; 3],
            forward: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            gain: 1.0,
            meters_per_unit: 1.0,
        }
    }
}

impl Listener {
    /// Takes a snapshot for the mailbox.
    pub fn snapshot(&self) -> ListenerProps {
        ListenerProps {
            position: self.position,
            velocity: self.velocity,
            forward: self.forward,
            up: self.up,
            gain: self.gain,
            meters_per_unit: self.meters_per_unit,
        }
    }
}

/// The plain-data record the mixer thread consumes: every field the
/// parameter engine's listener-update procedure needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerProps {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub forward: [f32; 3],
    pub up: [f32; 3],
    pub gain: f32,
    pub meters_per_unit: f32,
}

/// Mixer-side derived parameters, recomputed by the listener-update
/// procedure whenever a new [`ListenerProps`] snapshot arrives.
#[derive(Debug, Clone, Copy)]
pub struct ListenerParams {
    pub orientation: aural_spatial::Orientation,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub gain: f32,
    pub meters_per_unit: f32,
}

impl Default for ListenerParams {
    fn default() -> Self {
        Self {
            orientation: aural_spatial::Orientation::identity(),
            position: [0.0; 3],
            velocity: [0.0; 3],
            gain: 1.0,
            meters_per_unit: 1.0,
        }
    }
}

/// Per-context listener mailbox plus its mixer-side derived params.
///
/// A [`FreeList`] recycles snapshots the mixer has already consumed so the
/// API thread usually reuses an allocation rather than making a fresh one
/// on every `publish` (spec.md §4.9's "bound by preallocating one snapshot
/// per entity").
pub struct ListenerSlot {
    mailbox: Mailbox<ListenerProps>,
    free_list: FreeList<ListenerProps>,
    pub params: ListenerParams,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::new(),
            free_list: FreeList::new(),
            params: ListenerParams::default(),
        }
    }

    /// API-thread side: publishes a new snapshot, recycling a freed one
    /// from the free list if available.
    pub fn publish(&self, props: ListenerProps) {
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

    /// Mixer-side: the listener-update procedure from spec.md §4.8.
    /// Returns `true` if a new snapshot was applied (forces per-voice
    /// recomputation).
    pub fn update(&mut self) -> bool {
        let Some(props) = self.mailbox.take() else {
            return false;
        };
        let orientation = aural_spatial::Orientation::from_forward_up(props.forward, props.up);
        self.params = ListenerParams {
            velocity: orientation.rotate(props.velocity),
            orientation,
            position: props.position,
            gain: props.gain,
            meters_per_unit: props.meters_per_unit,
        };
        self.free_list.push(*props);
        true
    }
}

impl Default for ListenerSlot {
    fn default() -> Self {
        Self::new()
    }
}
