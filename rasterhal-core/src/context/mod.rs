//! Rasterizer contexts
//!
//! A context is the per-surface unit of work. It owns the descriptors of
//! every object created through it, indexed by slots of the shared registry,
//! plus its transform pipeline, render-state cache and current material.
//!
//! The descriptor tables sit behind an `Rc<RefCell<_>>` registered with the
//! registry as a [`SlotObserver`]: table growth and slot releases made by any
//! context (or any linked rasterizer) reach every table synchronously.
//! Borrows of the tables are never held across a registry call. Broadcasts
//! that arrive while a descriptor borrow is outstanding are queued by the
//! registry and applied before the tables are next touched.

mod dynamic_vb;
mod sprite;

pub use dynamic_vb::dynamic_vb_slot;

use crate::backend::RasterBackend;
use crate::config::RasterizerConfig;
use crate::driver::DriverCaps;
use crate::error::{RasterError, Result};
use crate::material::Material;
use crate::object::{
    BufferFlags, IndexBufferDesc, ObjectDesc, ObjectKind, ObjectTables, ObjectType,
    RemovedObject, ShaderDesc, ShaderFlags, SharedRegistry, Slot, SlotObserver, SpriteDesc,
    TextureDesc, TextureFlags, VertexBufferDesc,
};
use crate::state::{RenderState, RenderStateCache};
use crate::transform::{
    BoundingBox, BoxVisibility, ClipFlags, MatrixDirty, Rect, TransformData, TransformKind,
    TransformPipeline, Viewport,
};
use crate::vertex::size_of;
use glam::Mat4;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Descriptor tables and backend of one context.
struct ContextObjects {
    tables: ObjectTables,
    backend: Box<dyn RasterBackend>,
    /// Tile textures of deleted sprites whose slots are still allocated.
    orphaned_tiles: Vec<Slot>,
}

impl ContextObjects {
    /// Drop the descriptor of `kind` at `slot` and its device storage.
    fn drop_object(&mut self, slot: Slot, kind: ObjectKind) -> bool {
        match self.tables.remove(slot, kind) {
            Some(RemovedObject::Sprite(sprite)) => {
                self.orphan_tiles(&sprite);
                true
            }
            Some(_) => {
                self.backend.delete_object(slot, kind);
                true
            }
            None => false,
        }
    }

    fn orphan_tiles(&mut self, sprite: &SpriteDesc) {
        self.orphaned_tiles.extend(
            sprite
                .tiles
                .iter()
                .map(|t| t.texture)
                .filter(|s| !s.is_null()),
        );
    }
}

impl SlotObserver for ContextObjects {
    fn on_resize(&mut self, len: usize) {
        self.tables.resize(len);
    }

    fn on_release(&mut self, slot: Slot, kind: ObjectKind) {
        self.drop_object(slot, kind);
    }
}

pub struct RasterizerContext {
    id: ContextId,
    registry: SharedRegistry,
    objects: Rc<RefCell<ContextObjects>>,
    caps: DriverCaps,
    config: RasterizerConfig,
    pipeline: TransformPipeline,
    states: RenderStateCache,
    material: Material,
}

impl RasterizerContext {
    pub fn new(
        id: ContextId,
        registry: SharedRegistry,
        backend: Box<dyn RasterBackend>,
        caps: DriverCaps,
        config: RasterizerConfig,
    ) -> Self {
        let len = registry.borrow().len();
        let objects = Rc::new(RefCell::new(ContextObjects {
            tables: ObjectTables::new(len),
            backend,
            orphaned_tiles: Vec::new(),
        }));
        let observer: Rc<RefCell<dyn SlotObserver>> = objects.clone();
        registry.borrow_mut().register_observer(Rc::downgrade(&observer));

        Self {
            id,
            registry,
            objects,
            caps,
            config,
            pipeline: TransformPipeline::new(),
            states: RenderStateCache::new(),
            material: Material::default(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn caps(&self) -> &DriverCaps {
        &self.caps
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Number of slots covered by this context's tables.
    pub fn table_len(&self) -> usize {
        self.objects().tables.len()
    }

    /// Apply registry broadcasts queued while the tables were borrowed.
    fn catch_up(&self) {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.deliver_pending();
        }
    }

    fn objects(&self) -> Ref<'_, ContextObjects> {
        self.catch_up();
        self.objects.borrow()
    }

    fn objects_mut(&self) -> RefMut<'_, ContextObjects> {
        self.catch_up();
        self.objects.borrow_mut()
    }

    // ── Object indices ──────────────────────────────────────────

    /// Allocate a slot for `kind`, mirrored on linked rasterizers.
    pub fn create_object_index(&mut self, kind: ObjectKind) -> Result<Slot> {
        self.registry.borrow_mut().acquire(kind, true)
    }

    /// Release a slot; every context drops its descriptor there.
    pub fn release_object_index(&mut self, slot: Slot, kind: ObjectKind) -> bool {
        let released = self.registry.borrow_mut().release(slot, kind, true);
        self.settle();
        released
    }

    /// Release the slots of tile textures left behind by deleted sprites.
    pub(crate) fn settle(&mut self) {
        loop {
            let tiles = std::mem::take(&mut self.objects_mut().orphaned_tiles);
            if tiles.is_empty() {
                break;
            }
            let mut registry = self.registry.borrow_mut();
            for tile in tiles {
                registry.release(tile, ObjectKind::Texture, true);
            }
        }
    }

    // ── Object lifecycle ────────────────────────────────────────

    /// Create the object described by `desc` at `slot`.
    ///
    /// Any object of the same kind already at `slot` is deleted first. On
    /// failure the slot holds no descriptor of that kind.
    pub fn create_object(&mut self, slot: Slot, desc: ObjectDesc) -> Result<()> {
        let len = self.table_len();
        if slot.index() >= len {
            log::warn!("create_object: slot {} out of range ({} slots)", slot, len);
            return Err(RasterError::SlotOutOfRange { slot, len });
        }
        self.delete_object(slot, desc.kind());

        match desc {
            ObjectDesc::Sprite(sprite) => self.create_sprite(slot, sprite.format, sprite.flags),
            ObjectDesc::Texture(texture) => self.create_texture(slot, texture),
            ObjectDesc::VertexBuffer(vb) => self.create_vertex_buffer(slot, vb),
            ObjectDesc::IndexBuffer(ib) => self.create_index_buffer(slot, ib),
            ObjectDesc::VertexShader(shader) => {
                self.create_shader(slot, ObjectKind::VertexShader, shader)
            }
            ObjectDesc::PixelShader(shader) => {
                self.create_shader(slot, ObjectKind::PixelShader, shader)
            }
        }
    }

    fn create_texture(&mut self, slot: Slot, mut desc: TextureDesc) -> Result<()> {
        if desc.format.width == 0 || desc.format.height == 0 {
            return Err(RasterError::InvalidDescriptor(format!(
                "texture of {}x{}",
                desc.format.width, desc.format.height
            )));
        }
        self.backend_create(slot, ObjectKind::Texture, |backend| {
            backend.create_texture(slot, &desc)
        })?;
        desc.flags |= TextureFlags::VALID;
        self.insert(slot, |tables| tables.textures.insert(slot, desc).map(drop).map_err(drop));
        Ok(())
    }

    fn create_vertex_buffer(&mut self, slot: Slot, mut desc: VertexBufferDesc) -> Result<()> {
        if !self.caps.vertex_buffers {
            return Err(RasterError::BackendRejected {
                kind: ObjectKind::VertexBuffer,
                slot,
            });
        }
        if desc.vertex_size == 0 {
            desc.vertex_size = size_of(desc.format);
        }
        if desc.max_vertex_count == 0 || desc.vertex_size == 0 {
            return Err(RasterError::InvalidDescriptor(
                "vertex buffer without vertices".to_string(),
            ));
        }
        self.backend_create(slot, ObjectKind::VertexBuffer, |backend| {
            backend.create_vertex_buffer(slot, &desc)
        })?;
        desc.flags |= BufferFlags::VALID;
        self.insert(slot, |tables| {
            tables.vertex_buffers.insert(slot, desc).map(drop).map_err(drop)
        });
        Ok(())
    }

    fn create_index_buffer(&mut self, slot: Slot, mut desc: IndexBufferDesc) -> Result<()> {
        if desc.max_index_count == 0 {
            return Err(RasterError::InvalidDescriptor(
                "index buffer without indices".to_string(),
            ));
        }
        self.backend_create(slot, ObjectKind::IndexBuffer, |backend| {
            backend.create_index_buffer(slot, &desc)
        })?;
        desc.flags |= BufferFlags::VALID;
        self.insert(slot, |tables| {
            tables.index_buffers.insert(slot, desc).map(drop).map_err(drop)
        });
        Ok(())
    }

    fn create_shader(&mut self, slot: Slot, kind: ObjectKind, mut desc: ShaderDesc) -> Result<()> {
        if desc.function.is_empty() {
            return Err(RasterError::InvalidDescriptor("empty shader".to_string()));
        }
        self.backend_create(slot, kind, |backend| backend.create_shader(slot, kind, &desc))?;
        desc.flags |= ShaderFlags::VALID;
        self.insert(slot, |tables| {
            let table = match kind {
                ObjectKind::PixelShader => &mut tables.pixel_shaders,
                _ => &mut tables.vertex_shaders,
            };
            table.insert(slot, desc).map(drop).map_err(drop)
        });
        Ok(())
    }

    fn backend_create(
        &mut self,
        slot: Slot,
        kind: ObjectKind,
        create: impl FnOnce(&mut dyn RasterBackend) -> Result<()>,
    ) -> Result<()> {
        let result = create(self.objects_mut().backend.as_mut());
        if let Err(ref e) = result {
            log::warn!("Backend failed to create {:?} at {}: {}", kind, slot, e);
        }
        result
    }

    fn insert(
        &mut self,
        slot: Slot,
        store: impl FnOnce(&mut ObjectTables) -> std::result::Result<(), ()>,
    ) {
        if store(&mut self.objects_mut().tables).is_err() {
            log::warn!("Descriptor for slot {} dropped: table too short", slot);
        }
    }

    /// Delete the object of `kind` at `slot`. The slot stays allocated.
    pub fn delete_object(&mut self, slot: Slot, kind: ObjectKind) -> bool {
        if slot.index() >= self.table_len() {
            return false;
        }
        let deleted = self.objects_mut().drop_object(slot, kind);
        self.settle();
        deleted
    }

    /// Delete every object whose kind is in `mask`.
    pub fn flush_objects(&mut self, mask: ObjectType) -> bool {
        {
            let mut objects = self.objects_mut();
            for kind in ObjectKind::in_mask(mask) {
                for (slot, removed) in objects.tables.drain(kind) {
                    match removed {
                        RemovedObject::Sprite(sprite) => objects.orphan_tiles(&sprite),
                        _ => objects.backend.delete_object(slot, kind),
                    }
                }
            }
        }
        self.settle();
        log::debug!("Context {:?} flushed {:?}", self.id, mask);
        true
    }

    // ── Descriptor access ───────────────────────────────────────

    pub fn texture_data(&self, slot: Slot) -> Option<Ref<'_, TextureDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .textures
                .get(slot)
                .filter(|d| d.flags.contains(TextureFlags::VALID))
        })
        .ok()
    }

    pub fn sprite_data(&self, slot: Slot) -> Option<Ref<'_, SpriteDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .sprites
                .get(slot)
                .filter(|d| d.flags.contains(TextureFlags::VALID))
        })
        .ok()
    }

    pub fn vertex_buffer_data(&self, slot: Slot) -> Option<Ref<'_, VertexBufferDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .vertex_buffers
                .get(slot)
                .filter(|d| d.flags.contains(BufferFlags::VALID))
        })
        .ok()
    }

    pub fn index_buffer_data(&self, slot: Slot) -> Option<Ref<'_, IndexBufferDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .index_buffers
                .get(slot)
                .filter(|d| d.flags.contains(BufferFlags::VALID))
        })
        .ok()
    }

    pub fn vertex_shader_data(&self, slot: Slot) -> Option<Ref<'_, ShaderDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .vertex_shaders
                .get(slot)
                .filter(|d| d.flags.contains(ShaderFlags::VALID))
        })
        .ok()
    }

    pub fn pixel_shader_data(&self, slot: Slot) -> Option<Ref<'_, ShaderDesc>> {
        Ref::filter_map(self.objects(), |o| {
            o.tables
                .pixel_shaders
                .get(slot)
                .filter(|d| d.flags.contains(ShaderFlags::VALID))
        })
        .ok()
    }

    // ── Transform pipeline ──────────────────────────────────────

    pub fn set_transform(&mut self, kind: TransformKind, matrix: Mat4) {
        self.pipeline.set_transform(kind, matrix);
    }

    pub fn update_matrices(&mut self, required: MatrixDirty) -> MatrixDirty {
        self.pipeline.update_matrices(required)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.pipeline.set_viewport(viewport);
    }

    pub fn viewport(&self) -> &Viewport {
        self.pipeline.viewport()
    }

    pub fn transform_vertices(
        &mut self,
        count: usize,
        data: &mut TransformData<'_>,
    ) -> Result<ClipFlags> {
        self.pipeline.transform_vertices(count, data)
    }

    pub fn compute_box_visibility(
        &mut self,
        bbox: &BoundingBox,
        world_space: bool,
        extents: Option<&mut Rect>,
    ) -> BoxVisibility {
        self.pipeline.compute_box_visibility(bbox, world_space, extents)
    }

    pub fn pipeline(&mut self) -> &mut TransformPipeline {
        &mut self.pipeline
    }

    // ── Render states and material ──────────────────────────────

    /// Record a render state, forwarding it to the backend on a cache miss.
    pub fn set_render_state(&mut self, state: RenderState, value: u32) -> bool {
        if !self.states.set(state, value) {
            return false;
        }
        self.objects_mut().backend.set_render_state(state, value);
        true
    }

    pub fn render_state(&self, state: RenderState) -> u32 {
        self.states.get(state)
    }

    pub fn flush_render_state_cache(&mut self) {
        self.states.flush();
    }

    pub fn render_states(&self) -> &RenderStateCache {
        &self.states
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl Drop for RasterizerContext {
    fn drop(&mut self) {
        self.flush_objects(ObjectType::all());
    }
}

impl std::fmt::Debug for RasterizerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterizerContext")
            .field("id", &self.id)
            .field("slots", &self.table_len())
            .field("states", &self.states)
            .finish()
    }
}
