//! Aural Engine - the device/context/source entity model and render loop
//! for the aural 3D positional audio rendering core.
//!
//! Ties `aural-core`'s DSP primitives and `aural-spatial`'s spatialization
//! math into the object model spec.md §3 describes: a [`device::Device`]
//! owns a [`backend::Backend`] and a list of [`context::Context`]s, each
//! of which exclusively owns a [`listener::Listener`], a pool of
//! [`source::Source`]s, [`effect_slot::EffectSlot`]s, and the
//! [`voice::Voice`]s currently mixing their playing sources.
//!
//! # Modules
//!
//! - [`error`] - `AL_*`/`ALC_*` error kinds and the latch that holds them
//! - [`config`] - environment-variable configuration (`AURAL_*`)
//! - [`buffer`] - immutable sample data and buffer-queue items
//! - [`listener`] - per-context listener state and its property mailbox
//! - [`source`] - application-facing sound emitters and their state machine
//! - [`effect_slot`] - auxiliary effect slots and the effect-state contract
//! - [`voice`] - the per-block load/resample/filter/mix algorithm
//! - [`params`] - the parameter engine translating property snapshots into
//!   voice mixer state
//! - [`context`] - the per-context entity pools and deferred-update state
//! - [`device`] - device-owned mix buffers and the backend handle
//! - [`backend`] - the pull-model device backend contract
//! - [`render`] - the per-block render loop tying everything together

pub mod backend;
pub mod buffer;
pub mod config;
pub mod context;
pub mod device;
pub mod effect_slot;
pub mod error;
pub mod listener;
pub mod params;
pub mod render;
pub mod source;
pub mod voice;

pub use backend::{Backend, BackendError, ClockLatency};
pub use buffer::{Buffer, BufferError, BufferQueueItem};
pub use config::Config;
pub use context::Context;
pub use device::{Device, OutputMode};
pub use effect_slot::{EffectSlot, EffectSlotProps, EffectState, EffectType};
pub use error::{AlError, AlcError, ErrorLatch};
pub use listener::{Listener, ListenerParams, ListenerProps, ListenerSlot};
pub use render::render_block;
pub use source::{Source, SourceProps, SourceState, SourceType};
pub use voice::{PanningMode, Voice};
