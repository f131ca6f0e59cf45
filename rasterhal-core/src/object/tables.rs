//! Per-context descriptor arenas, one per resource kind.
//!
//! Every arena has the same length as the shared object table; the registry
//! keeps them congruent through `SlotObserver::on_resize`.

use super::desc::{
    BufferFlags, IndexBufferDesc, ShaderDesc, ShaderFlags, SpriteDesc, TextureDesc, TextureFlags,
    VertexBufferDesc,
};
use super::types::{ObjectKind, Slot};

/// Slot-indexed arena. `None` is a tombstone.
#[derive(Debug)]
pub struct ObjectTable<T> {
    entries: Vec<Option<T>>,
}

impl<T> ObjectTable<T> {
    pub fn new(len: usize) -> Self {
        let mut entries = Vec::with_capacity(len);
        entries.resize_with(len, || None);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grow to `len` entries. Never shrinks.
    pub fn resize(&mut self, len: usize) {
        if len > self.entries.len() {
            self.entries.resize_with(len, || None);
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.entries.get(slot.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.entries.get_mut(slot.index()).and_then(Option::as_mut)
    }

    /// Store `value` at `slot`, returning the previous occupant.
    /// Out-of-range slots are refused and hand the value back.
    pub fn insert(&mut self, slot: Slot, value: T) -> Result<Option<T>, T> {
        match self.entries.get_mut(slot.index()) {
            Some(entry) => Ok(entry.replace(value)),
            None => Err(value),
        }
    }

    pub fn remove(&mut self, slot: Slot) -> Option<T> {
        self.entries.get_mut(slot.index()).and_then(Option::take)
    }

    /// Tombstone every entry, yielding the removed values with their slots.
    pub fn drain(&mut self) -> Vec<(Slot, T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, entry)| entry.take().map(|v| (Slot::from(i), v)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.as_ref().map(|v| (Slot::from(i), v)))
    }
}

/// A descriptor taken out of an [`ObjectTables`] entry.
#[derive(Debug)]
pub enum RemovedObject {
    Texture(TextureDesc),
    Sprite(SpriteDesc),
    VertexBuffer(VertexBufferDesc),
    IndexBuffer(IndexBufferDesc),
    VertexShader(ShaderDesc),
    PixelShader(ShaderDesc),
}

/// All descriptor arenas of one context.
#[derive(Debug)]
pub struct ObjectTables {
    pub textures: ObjectTable<TextureDesc>,
    pub sprites: ObjectTable<SpriteDesc>,
    pub vertex_buffers: ObjectTable<VertexBufferDesc>,
    pub index_buffers: ObjectTable<IndexBufferDesc>,
    pub vertex_shaders: ObjectTable<ShaderDesc>,
    pub pixel_shaders: ObjectTable<ShaderDesc>,
}

impl ObjectTables {
    pub fn new(len: usize) -> Self {
        Self {
            textures: ObjectTable::new(len),
            sprites: ObjectTable::new(len),
            vertex_buffers: ObjectTable::new(len),
            index_buffers: ObjectTable::new(len),
            vertex_shaders: ObjectTable::new(len),
            pixel_shaders: ObjectTable::new(len),
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn resize(&mut self, len: usize) {
        self.textures.resize(len);
        self.sprites.resize(len);
        self.vertex_buffers.resize(len);
        self.index_buffers.resize(len);
        self.vertex_shaders.resize(len);
        self.pixel_shaders.resize(len);
    }

    pub fn remove(&mut self, slot: Slot, kind: ObjectKind) -> Option<RemovedObject> {
        match kind {
            ObjectKind::Texture => self.textures.remove(slot).map(RemovedObject::Texture),
            ObjectKind::Sprite => self.sprites.remove(slot).map(RemovedObject::Sprite),
            ObjectKind::VertexBuffer => self
                .vertex_buffers
                .remove(slot)
                .map(RemovedObject::VertexBuffer),
            ObjectKind::IndexBuffer => self
                .index_buffers
                .remove(slot)
                .map(RemovedObject::IndexBuffer),
            ObjectKind::VertexShader => self
                .vertex_shaders
                .remove(slot)
                .map(RemovedObject::VertexShader),
            ObjectKind::PixelShader => self
                .pixel_shaders
                .remove(slot)
                .map(RemovedObject::PixelShader),
        }
    }

    /// Tombstone every entry of `kind`.
    pub fn drain(&mut self, kind: ObjectKind) -> Vec<(Slot, RemovedObject)> {
        fn wrap<T>(
            items: Vec<(Slot, T)>,
            f: fn(T) -> RemovedObject,
        ) -> Vec<(Slot, RemovedObject)> {
            items.into_iter().map(|(s, v)| (s, f(v))).collect()
        }
        match kind {
            ObjectKind::Texture => wrap(self.textures.drain(), RemovedObject::Texture),
            ObjectKind::Sprite => wrap(self.sprites.drain(), RemovedObject::Sprite),
            ObjectKind::VertexBuffer => {
                wrap(self.vertex_buffers.drain(), RemovedObject::VertexBuffer)
            }
            ObjectKind::IndexBuffer => wrap(self.index_buffers.drain(), RemovedObject::IndexBuffer),
            ObjectKind::VertexShader => {
                wrap(self.vertex_shaders.drain(), RemovedObject::VertexShader)
            }
            ObjectKind::PixelShader => wrap(self.pixel_shaders.drain(), RemovedObject::PixelShader),
        }
    }

    /// Whether a descriptor of `kind` exists at `slot` and carries its valid bit.
    pub fn is_valid(&self, slot: Slot, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Texture => self
                .textures
                .get(slot)
                .is_some_and(|d| d.flags.contains(TextureFlags::VALID)),
            ObjectKind::Sprite => self
                .sprites
                .get(slot)
                .is_some_and(|d| d.flags.contains(TextureFlags::VALID)),
            ObjectKind::VertexBuffer => self
                .vertex_buffers
                .get(slot)
                .is_some_and(|d| d.flags.contains(BufferFlags::VALID)),
            ObjectKind::IndexBuffer => self
                .index_buffers
                .get(slot)
                .is_some_and(|d| d.flags.contains(BufferFlags::VALID)),
            ObjectKind::VertexShader => self
                .vertex_shaders
                .get(slot)
                .is_some_and(|d| d.flags.contains(ShaderFlags::VALID)),
            ObjectKind::PixelShader => self
                .pixel_shaders
                .get(slot)
                .is_some_and(|d| d.flags.contains(ShaderFlags::VALID)),
        }
    }
}
