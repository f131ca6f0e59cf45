// Backend that accepts every request and only counts them.

use super::RasterBackend;
use crate::error::Result;
use crate::object::{
    ImageView, IndexBufferDesc, ObjectKind, ShaderDesc, Slot, TextureDesc, VertexBufferDesc,
};
use crate::state::RenderState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullStats {
    pub textures_created: u32,
    pub textures_loaded: u32,
    pub bytes_uploaded: u64,
    pub vertex_buffers_created: u32,
    pub index_buffers_created: u32,
    pub shaders_created: u32,
    pub objects_deleted: u32,
    pub state_changes: u32,
}

#[derive(Debug, Default)]
pub struct NullBackend {
    stats: NullStats,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> NullStats {
        self.stats
    }
}

impl Drop for NullBackend {
    fn drop(&mut self) {
        log::debug!("null backend released: {:?}", self.stats);
    }
}

impl RasterBackend for NullBackend {
    fn create_texture(&mut self, slot: Slot, desc: &TextureDesc) -> Result<()> {
        log::trace!(
            "null: texture {} {}x{}",
            slot,
            desc.format.width,
            desc.format.height
        );
        self.stats.textures_created += 1;
        Ok(())
    }

    fn load_texture(&mut self, _slot: Slot, image: &ImageView<'_>) -> Result<()> {
        self.stats.textures_loaded += 1;
        self.stats.bytes_uploaded += image.data.len() as u64;
        Ok(())
    }

    fn create_vertex_buffer(&mut self, _slot: Slot, _desc: &VertexBufferDesc) -> Result<()> {
        self.stats.vertex_buffers_created += 1;
        Ok(())
    }

    fn create_index_buffer(&mut self, _slot: Slot, _desc: &IndexBufferDesc) -> Result<()> {
        self.stats.index_buffers_created += 1;
        Ok(())
    }

    fn create_shader(&mut self, _slot: Slot, _kind: ObjectKind, _desc: &ShaderDesc) -> Result<()> {
        self.stats.shaders_created += 1;
        Ok(())
    }

    fn delete_object(&mut self, _slot: Slot, _kind: ObjectKind) {
        self.stats.objects_deleted += 1;
    }

    fn set_render_state(&mut self, _state: RenderState, _value: u32) {
        self.stats.state_changes += 1;
    }
}
