//! Error Handling
//!
//! Error types for the rasterizer core using `thiserror`.
//!
//! # Error Categories
//! - **Bounds errors**: slot indices outside the shared object table
//! - **Stream errors**: vertex streams too short for the requested vertex count
//! - **Capability errors**: the backend or driver cannot satisfy a request
//! - **Allocation errors**: the object table cannot grow any further

use crate::object::{ObjectKind, Slot};
use thiserror::Error;

/// Rasterizer core error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Slot index is not covered by the object table.
    #[error("slot {slot} is out of range (table holds {len} slots)")]
    SlotOutOfRange { slot: Slot, len: usize },

    /// The shared object table could not be grown.
    ///
    /// Not recoverable locally: the caller must treat it as a hard failure.
    #[error("object table cannot grow past {len} slots while allocating {kind:?}")]
    SlotTableExhausted { kind: ObjectKind, len: usize },

    /// A strided stream does not hold enough bytes for the vertex count.
    #[error("{attribute} stream holds {available} bytes, {required} required")]
    StreamTooShort {
        attribute: &'static str,
        required: usize,
        available: usize,
    },

    /// A required input stream is absent.
    #[error("missing {0} input")]
    MissingInput(&'static str),

    /// No valid object of this kind lives at the slot.
    #[error("no {kind:?} at slot {slot}")]
    MissingObject { kind: ObjectKind, slot: Slot },

    /// The image needs more tiles per axis than the tiler allows.
    #[error("sprite of {width}x{height} needs more than {max_tiles} tiles per axis")]
    SpriteTooLarge {
        width: u32,
        height: u32,
        max_tiles: usize,
    },

    /// The backend refused to create or load an object.
    #[error("backend rejected {kind:?} at slot {slot}")]
    BackendRejected { kind: ObjectKind, slot: Slot },

    /// The descriptor is unusable (zero-sized texture, empty shader, ...).
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A caller-supplied argument is inconsistent with itself.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RasterError {
    /// Create a stream-length error.
    #[cold]
    pub fn stream_too_short(attribute: &'static str, required: usize, available: usize) -> Self {
        Self::StreamTooShort {
            attribute,
            required,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;
