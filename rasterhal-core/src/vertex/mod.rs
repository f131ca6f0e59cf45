//! Vertex format codec.
//!
//! Maps draw flags to packed vertex layouts and moves attribute data
//! between client streams and packed buffers.

pub mod format;
pub mod pack;
pub mod stream;

pub use format::{
    encode_format, size_of, AttributeSlot, DrawFlags, PositionKind, TexCoordDims, VertexFormat,
    VertexLayout, MAX_STAGES,
};
pub use pack::{pack_vertices, DEFAULT_DIFFUSE, DEFAULT_POINT_SIZE, DEFAULT_SPECULAR};
pub use stream::{unpack_layout, Stream, VertexStreams};
