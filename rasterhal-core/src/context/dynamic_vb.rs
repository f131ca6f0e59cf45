// Pool of dynamic vertex buffers living in the reserved vertex-buffer slots.

use super::RasterizerContext;
use crate::object::{BufferFlags, ObjectDesc, Slot, VertexBufferDesc};
use crate::vertex::{size_of, VertexFormat};

const HASHED_ATTRIBUTES: VertexFormat = VertexFormat::RASTERPOS
    .union(VertexFormat::NORMAL)
    .union(VertexFormat::DIFFUSE)
    .union(VertexFormat::SPECULAR)
    .union(VertexFormat::TEXMASK);

/// Pool slot for `format` and `key` within `[1, reserved)`.
///
/// Returns [`Slot::NULL`] when the reserved range holds no usable slot.
pub fn dynamic_vb_slot(format: VertexFormat, key: u32, reserved: usize) -> Slot {
    if reserved < 2 {
        return Slot::NULL;
    }
    let bits = (format & HASHED_ATTRIBUTES).bits() >> 2;
    let hash = bits ^ key.wrapping_mul(0x9E37_79B9);
    Slot(1 + hash % (reserved as u32 - 1))
}

impl RasterizerContext {
    /// Vertex buffer able to hold `count` vertices of `format`.
    ///
    /// A pooled buffer with the same layout and enough room is reused as is;
    /// anything else at the pool slot is replaced. Returns [`Slot::NULL`] when
    /// the device has no vertex buffers or creation fails.
    pub fn get_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        count: u32,
        vertex_size: u32,
        key: u32,
    ) -> Slot {
        if !self.caps.vertex_buffers {
            return Slot::NULL;
        }
        let vertex_size = if vertex_size == 0 { size_of(format) } else { vertex_size };
        let reserved = self.registry.borrow().reserved_vertex_buffers();
        let slot = dynamic_vb_slot(format, key, reserved);
        if slot.is_null() {
            return Slot::NULL;
        }

        let reusable = self.vertex_buffer_data(slot).is_some_and(|vb| {
            vb.format == format && vb.vertex_size == vertex_size && vb.max_vertex_count >= count
        });
        if reusable {
            return slot;
        }

        let capacity = count
            .saturating_add(self.config.dynamic_vb_slack)
            .max(self.config.dynamic_vb_min_capacity);
        let desc = VertexBufferDesc {
            flags: BufferFlags::DYNAMIC | BufferFlags::WRITE_ONLY,
            format,
            vertex_size,
            max_vertex_count: capacity,
        };
        match self.create_object(slot, ObjectDesc::VertexBuffer(desc)) {
            Ok(()) => {
                log::debug!(
                    "Dynamic vertex buffer {} created for {} vertices",
                    slot,
                    capacity
                );
                slot
            }
            Err(e) => {
                log::warn!("Dynamic vertex buffer {} unavailable: {}", slot, e);
                Slot::NULL
            }
        }
    }
}
