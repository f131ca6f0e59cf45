//! Backend callback surface.
//!
//! A context forwards object creation, texture uploads, deletions and render
//! state changes to a [`RasterBackend`]. Concrete GPU backends live outside
//! this crate; [`NullBackend`] accepts everything.

mod null;

pub use null::{NullBackend, NullStats};

use crate::error::Result;
use crate::object::{
    ImageView, IndexBufferDesc, ObjectKind, ShaderDesc, Slot, TextureDesc, VertexBufferDesc,
};
use crate::state::RenderState;

pub trait RasterBackend {
    /// Allocate device storage for a texture of `desc.format`.
    fn create_texture(&mut self, slot: Slot, desc: &TextureDesc) -> Result<()>;

    /// Upload pixels into an existing texture.
    fn load_texture(&mut self, slot: Slot, image: &ImageView<'_>) -> Result<()>;

    fn create_vertex_buffer(&mut self, slot: Slot, desc: &VertexBufferDesc) -> Result<()>;

    fn create_index_buffer(&mut self, slot: Slot, desc: &IndexBufferDesc) -> Result<()>;

    /// `kind` is either [`ObjectKind::VertexShader`] or [`ObjectKind::PixelShader`].
    fn create_shader(&mut self, slot: Slot, kind: ObjectKind, desc: &ShaderDesc) -> Result<()>;

    /// Release device storage of an object. Unknown objects are ignored.
    fn delete_object(&mut self, slot: Slot, kind: ObjectKind);

    fn set_render_state(&mut self, state: RenderState, value: u32);
}
