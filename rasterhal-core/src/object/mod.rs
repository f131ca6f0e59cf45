//! Resource slots shared across contexts.
//!
//! - [`types`]: occupancy bits, resource kinds and slot numbers
//! - [`registry`]: the shared allocator and its broadcast surface
//! - [`desc`]: descriptors stored by each context
//! - [`tables`]: per-context, slot-indexed descriptor arenas

pub mod desc;
pub mod registry;
pub mod tables;
pub mod types;

pub use desc::{
    BufferFlags, ImageFormat, ImageView, IndexBufferDesc, ObjectDesc, ShaderDesc, ShaderFlags,
    SpriteDesc, SpriteTile, TextureDesc, TextureFlags, VertexBufferDesc,
};
pub use registry::{ObjectRegistry, SharedRegistry, SlotObserver};
pub use tables::{ObjectTable, ObjectTables, RemovedObject};
pub use types::{ObjectKind, ObjectType, Slot};
