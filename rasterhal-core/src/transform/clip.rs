// Frustum clip codes

use bitflags::bitflags;
use glam::Vec4;

bitflags! {
    /// Frustum half-spaces violated by a clip-space vertex.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClipFlags: u32 {
        /// `x < -w`
        const LEFT = 0x01;
        /// `x > w`
        const RIGHT = 0x02;
        /// `y > w`
        const TOP = 0x04;
        /// `y < -w`
        const BOTTOM = 0x08;
        /// `z < 0`
        const FRONT = 0x10;
        /// `z > w`
        const BACK = 0x20;

        const ALL = 0x3F;
    }
}

impl ClipFlags {
    /// Classify a clip-space vertex against the six frustum planes.
    pub fn classify(v: Vec4) -> Self {
        let mut flags = Self::empty();
        if -v.w > v.x {
            flags |= Self::LEFT;
        }
        if v.x > v.w {
            flags |= Self::RIGHT;
        }
        if -v.w > v.y {
            flags |= Self::BOTTOM;
        }
        if v.y > v.w {
            flags |= Self::TOP;
        }
        if v.z < 0.0 {
            flags |= Self::FRONT;
        }
        if v.z > v.w {
            flags |= Self::BACK;
        }
        flags
    }
}

/// Running OR/AND reduction of clip codes over a set of vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipAccumulator {
    pub or: ClipFlags,
    pub and: ClipFlags,
}

impl Default for ClipAccumulator {
    fn default() -> Self {
        Self {
            or: ClipFlags::empty(),
            and: ClipFlags::ALL,
        }
    }
}

impl ClipAccumulator {
    pub fn add(&mut self, flags: ClipFlags) {
        self.or |= flags;
        self.and &= flags;
    }

    /// Every vertex lies outside one common plane.
    pub fn all_outside(&self) -> bool {
        !self.and.is_empty()
    }
}
