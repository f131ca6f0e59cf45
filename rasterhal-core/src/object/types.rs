use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Occupancy mask of one slot: one bit per resource kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectType: u8 {
        const TEXTURE = 0x01;
        const SPRITE = 0x02;
        const VERTEX_BUFFER = 0x04;
        const INDEX_BUFFER = 0x08;
        const VERTEX_SHADER = 0x10;
        const PIXEL_SHADER = 0x20;
    }
}

/// A single resource kind. Several kinds may share one slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Texture = 0,
    Sprite = 1,
    VertexBuffer = 2,
    IndexBuffer = 3,
    VertexShader = 4,
    PixelShader = 5,
}

impl ObjectKind {
    pub const COUNT: usize = 6;

    pub const ALL: [ObjectKind; Self::COUNT] = [
        ObjectKind::Texture,
        ObjectKind::Sprite,
        ObjectKind::VertexBuffer,
        ObjectKind::IndexBuffer,
        ObjectKind::VertexShader,
        ObjectKind::PixelShader,
    ];

    /// Occupancy bit of this kind.
    pub const fn bit(self) -> ObjectType {
        ObjectType::from_bits_truncate(1 << self as u8)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kinds present in `mask`, in declaration order.
    pub fn in_mask(mask: ObjectType) -> impl Iterator<Item = ObjectKind> {
        Self::ALL.into_iter().filter(move |k| mask.contains(k.bit()))
    }
}

/// Index into the shared object table.
///
/// Slot 0 is the null slot: allocation hints start above it, so a zero slot
/// always means "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Slot(pub u32);

impl Slot {
    pub const NULL: Slot = Slot(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for Slot {
    fn from(index: usize) -> Self {
        Slot(index as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_bits_are_distinct() {
        let mut seen = ObjectType::empty();
        for kind in ObjectKind::ALL {
            assert!(!seen.intersects(kind.bit()));
            seen |= kind.bit();
        }
        assert_eq!(seen, ObjectType::all());
        assert_eq!(ObjectKind::VertexBuffer.bit(), ObjectType::VERTEX_BUFFER);
    }

    #[test]
    fn kinds_in_mask() {
        let kinds: Vec<_> =
            ObjectKind::in_mask(ObjectType::SPRITE | ObjectType::PIXEL_SHADER).collect();
        assert_eq!(kinds, vec![ObjectKind::Sprite, ObjectKind::PixelShader]);
    }
}
