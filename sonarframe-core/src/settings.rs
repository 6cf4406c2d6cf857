//! This module contains the [`ParserSettings`] structure used to customise the 7K stream
//! parser's behaviour.
//!
//! NB: few real devices emit a perfectly compliant stream, so resync and timestamp floors are
//! left tunable here rather than hard-coded into the state machine.
use crate::enums::FrameMode;
use crate::MAX_FRAME_BYTES;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
/// Settings that govern a single [`crate`]-level parse session: which frame shape to expect, how
/// large the parser's fixed internal buffer is, whether resync is enabled, and the timestamp
/// floor frames must clear to be accepted.
///
/// This structure does not allow direct manipulation of fields, since the buffer size and frame
/// mode are fixed for the lifetime of a parser instance; use the constructor and getters.
pub struct ParserSettings {
    pub(crate) frame_mode: FrameMode,
    pub(crate) buffer_capacity: usize,
    pub(crate) resync_enabled: bool,
    /// Frames whose 7K-epoch time converts to a seconds-of-day value `<= newer_than` are rejected
    /// as stale. `<= 0.0` disables the check.
    pub(crate) newer_than: f64,
}

impl ParserSettings {
    /// Constructs parser settings with resync enabled and no timestamp floor.
    pub fn new(frame_mode: FrameMode, buffer_capacity: usize) -> Self {
        ParserSettings {
            frame_mode,
            buffer_capacity,
            resync_enabled: true,
            newer_than: 0.0,
        }
    }

    pub fn with_resync_enabled(mut self, enabled: bool) -> Self {
        self.resync_enabled = enabled;
        self
    }

    pub fn with_newer_than(mut self, newer_than: f64) -> Self {
        self.newer_than = newer_than;
        self
    }

    pub fn frame_mode(&self) -> FrameMode {
        self.frame_mode
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn resync_enabled(&self) -> bool {
        self.resync_enabled
    }

    pub fn newer_than(&self) -> f64 {
        self.newer_than
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings::new(FrameMode::NetStream, MAX_FRAME_BYTES as usize)
    }
}
