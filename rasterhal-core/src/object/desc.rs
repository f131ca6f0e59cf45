//! Resource descriptors stored in the per-context object tables.
//!
//! Every descriptor carries a `VALID` bit. A descriptor without it is
//! present in the table but invisible to the `*_data` accessors.

use super::types::{ObjectKind, Slot};
use crate::pixel::PixelFormat;
use crate::vertex::VertexFormat;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureFlags: u32 {
        const VALID = 0x0001;
        const MANAGED = 0x0002;
        const RENDER_TARGET = 0x0004;
        const CUBEMAP = 0x0008;
        const SPRITE = 0x0010;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferFlags: u32 {
        const VALID = 0x0001;
        const DYNAMIC = 0x0002;
        const WRITE_ONLY = 0x0004;
        const SYSTEM_MEMORY = 0x0008;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShaderFlags: u32 {
        const VALID = 0x0001;
    }
}

/// Dimensions and pixel layout of an image or texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormat {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl ImageFormat {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
        }
    }
}

/// Borrowed pixel data handed to texture uploads.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub format: ImageFormat,
    /// Bytes per row.
    pub pitch: usize,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub flags: TextureFlags,
    pub format: ImageFormat,
    pub mipmap_count: u32,
}

impl TextureDesc {
    pub fn new(format: ImageFormat) -> Self {
        Self {
            flags: TextureFlags::empty(),
            format,
            mipmap_count: 0,
        }
    }
}

/// One power-of-two texture tile of a sprite.
///
/// `x, y, w, h` locate the tile in the logical image; `sw, sh` are the
/// dimensions of the backing texture (never smaller than `w, h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteTile {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub sw: u32,
    pub sh: u32,
    pub texture: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDesc {
    pub flags: TextureFlags,
    /// Logical (untiled) image format.
    pub format: ImageFormat,
    pub tiles: Vec<SpriteTile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferDesc {
    pub flags: BufferFlags,
    pub format: VertexFormat,
    pub vertex_size: u32,
    pub max_vertex_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBufferDesc {
    pub flags: BufferFlags,
    pub max_index_count: u32,
}

/// Vertex or pixel shader; `function` is the backend-specific byte code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDesc {
    pub flags: ShaderFlags,
    pub function: Vec<u8>,
}

/// Creation request for `RasterizerContext::create_object`.
#[derive(Debug, Clone)]
pub enum ObjectDesc {
    Texture(TextureDesc),
    /// Only `format` and `flags` are read; tiles are computed on creation.
    Sprite(SpriteDesc),
    VertexBuffer(VertexBufferDesc),
    IndexBuffer(IndexBufferDesc),
    VertexShader(ShaderDesc),
    PixelShader(ShaderDesc),
}

impl ObjectDesc {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Texture(_) => ObjectKind::Texture,
            Self::Sprite(_) => ObjectKind::Sprite,
            Self::VertexBuffer(_) => ObjectKind::VertexBuffer,
            Self::IndexBuffer(_) => ObjectKind::IndexBuffer,
            Self::VertexShader(_) => ObjectKind::VertexShader,
            Self::PixelShader(_) => ObjectKind::PixelShader,
        }
    }
}
