//! OpenAL/ALC-shaped error kinds.
//!
//! Grounded on spec.md §7's error-kind table. Setters validate fully
//! before mutating; on failure they return an [`AlError`]/[`AlcError`]
//! without side effects. The mixer itself never raises errors.

use thiserror::Error;

/// Per-context (`AL_*`) error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlError {
    #[error("invalid name: unknown object handle")]
    InvalidName,
    #[error("invalid enum: unrecognized enum value")]
    InvalidEnum,
    #[error("invalid value: value out of range for this parameter")]
    InvalidValue,
    #[error("invalid operation: object state does not permit this call")]
    InvalidOperation,
    #[error("out of memory")]
    OutOfMemory,
}

/// Per-device (`ALC_*`) error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlcError {
    #[error("invalid device handle")]
    InvalidDevice,
    #[error("invalid context handle")]
    InvalidContext,
    #[error("invalid enum: unrecognized attribute")]
    InvalidEnum,
    #[error("invalid value: attribute value out of range")]
    InvalidValue,
    #[error("out of memory")]
    OutOfMemory,
}

/// Latched error state: the most recent unread error, if any. Matches
/// OpenAL's "sticky until read" semantics — `take` both returns and clears
/// it.
#[derive(Debug, Default)]
pub struct ErrorLatch<E> {
    pending: Option<E>,
}

impl<E: Copy> ErrorLatch<E> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Records `err`, but only if no error is already latched — matches
    /// the reference's "first error wins until read" behavior.
    pub fn set(&mut self, err: E) {
        if self.pending.is_none() {
            self.pending = Some(err);
        }
    }

    /// Returns and clears the latched error.
    pub fn take(&mut self) -> Option<E> {
        self.pending.take()
    }
}
