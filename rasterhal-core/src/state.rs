//! Render-state cache
//!
//! Tracks the last value sent to the backend for every render state so that
//! redundant changes can be dropped before they reach the driver.

use serde::{Deserialize, Serialize};

/// Number of entries in the state table. Every [`RenderState`] is below it.
pub const STATE_COUNT: usize = 256;

/// Render-state enumerants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum RenderState {
    Antialias = 2,
    TexturePerspective = 4,
    ZEnable = 7,
    FillMode = 8,
    ShadeMode = 9,
    LinePattern = 10,
    ZWriteEnable = 14,
    AlphaTestEnable = 15,
    SrcBlend = 19,
    DestBlend = 20,
    CullMode = 22,
    ZFunc = 23,
    AlphaRef = 24,
    AlphaFunc = 25,
    DitherEnable = 26,
    AlphaBlendEnable = 27,
    FogEnable = 28,
    SpecularEnable = 29,
    FogColor = 34,
    FogPixelMode = 35,
    FogStart = 36,
    FogEnd = 37,
    FogDensity = 38,
    EdgeAntialias = 40,
    ZBias = 47,
    RangeFogEnable = 48,
    StencilEnable = 52,
    StencilFail = 53,
    StencilZFail = 54,
    StencilPass = 55,
    StencilFunc = 56,
    StencilRef = 57,
    StencilMask = 58,
    StencilWriteMask = 59,
    TextureFactor = 60,
    Wrap0 = 128,
    Wrap1 = 129,
    Wrap2 = 130,
    Wrap3 = 131,
    Wrap4 = 132,
    Wrap5 = 133,
    Wrap6 = 134,
    Wrap7 = 135,
    Clipping = 136,
    Lighting = 137,
    Ambient = 139,
    FogVertexMode = 140,
    ColorVertex = 141,
    LocalViewer = 142,
    NormalizeNormals = 143,
    ClipPlaneEnable = 152,
    InverseWinding = 253,
    TextureTarget = 254,
}

impl RenderState {
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Initial value of the state after a cache flush.
    pub const fn default_value(self) -> u32 {
        match self {
            Self::ShadeMode => 2,
            Self::SrcBlend => 2,
            Self::AlphaFunc => 8,
            Self::StencilFunc => 8,
            Self::StencilMask | Self::StencilWriteMask => 0xFFFF_FFFF,
            Self::ZEnable => 1,
            Self::FillMode => 3,
            Self::ZWriteEnable => 1,
            Self::DestBlend => 1,
            Self::CullMode => 3,
            Self::ZFunc => 4,
            Self::StencilFail | Self::StencilZFail | Self::StencilPass => 1,
            Self::TextureFactor => 0xFF00_0000,
            Self::Clipping => 1,
            Self::Lighting => 1,
            Self::LocalViewer => 1,
            Self::NormalizeNormals => 1,
            _ => 0,
        }
    }

    pub const ALL: [RenderState; 53] = [
        Self::Antialias,
        Self::TexturePerspective,
        Self::ZEnable,
        Self::FillMode,
        Self::ShadeMode,
        Self::LinePattern,
        Self::ZWriteEnable,
        Self::AlphaTestEnable,
        Self::SrcBlend,
        Self::DestBlend,
        Self::CullMode,
        Self::ZFunc,
        Self::AlphaRef,
        Self::AlphaFunc,
        Self::DitherEnable,
        Self::AlphaBlendEnable,
        Self::FogEnable,
        Self::SpecularEnable,
        Self::FogColor,
        Self::FogPixelMode,
        Self::FogStart,
        Self::FogEnd,
        Self::FogDensity,
        Self::EdgeAntialias,
        Self::ZBias,
        Self::RangeFogEnable,
        Self::StencilEnable,
        Self::StencilFail,
        Self::StencilZFail,
        Self::StencilPass,
        Self::StencilFunc,
        Self::StencilRef,
        Self::StencilMask,
        Self::StencilWriteMask,
        Self::TextureFactor,
        Self::Wrap0,
        Self::Wrap1,
        Self::Wrap2,
        Self::Wrap3,
        Self::Wrap4,
        Self::Wrap5,
        Self::Wrap6,
        Self::Wrap7,
        Self::Clipping,
        Self::Lighting,
        Self::Ambient,
        Self::FogVertexMode,
        Self::ColorVertex,
        Self::LocalViewer,
        Self::NormalizeNormals,
        Self::ClipPlaneEnable,
        Self::InverseWinding,
        Self::TextureTarget,
    ];

    /// Decode a raw enumerant.
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| *s as u32 == value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    value: u32,
    default: u32,
    known: bool,
}

pub struct RenderStateCache {
    entries: [CacheEntry; STATE_COUNT],
    hits: u64,
    misses: u64,
}

impl Default for RenderStateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderStateCache {
    pub fn new() -> Self {
        let mut entries = [CacheEntry::default(); STATE_COUNT];
        for state in RenderState::ALL {
            entries[state.index()].default = state.default_value();
        }
        let mut cache = Self {
            entries,
            hits: 0,
            misses: 0,
        };
        cache.flush();
        cache
    }

    /// Record `value` for `state`.
    ///
    /// Returns `true` when the value must be forwarded to the backend: the
    /// state was not known since the last flush, or its value changed.
    pub fn set(&mut self, state: RenderState, value: u32) -> bool {
        let entry = &mut self.entries[state.index()];
        if entry.known && entry.value == value {
            self.hits += 1;
            return false;
        }
        entry.value = value;
        entry.known = true;
        self.misses += 1;
        true
    }

    pub fn get(&self, state: RenderState) -> u32 {
        self.entries[state.index()].value
    }

    pub fn is_known(&self, state: RenderState) -> bool {
        self.entries[state.index()].known
    }

    pub fn default_value(&self, state: RenderState) -> u32 {
        self.entries[state.index()].default
    }

    /// Reset every value to its default and forget what the backend holds.
    pub fn flush(&mut self) {
        for entry in &mut self.entries {
            entry.value = entry.default;
            entry.known = false;
        }
        log::debug!("Render state cache flushed");
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn reset_counters(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }
}

impl std::fmt::Debug for RenderStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStateCache")
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let cache = RenderStateCache::new();
        assert_eq!(cache.get(RenderState::ZEnable), 1);
        assert_eq!(cache.get(RenderState::CullMode), 3);
        assert_eq!(cache.get(RenderState::ZFunc), 4);
        assert_eq!(cache.get(RenderState::TextureFactor), 0xFF00_0000);
        assert_eq!(cache.get(RenderState::StencilMask), 0xFFFF_FFFF);
        assert_eq!(cache.get(RenderState::FogEnable), 0);
        assert!(!cache.is_known(RenderState::ZEnable));
    }

    #[test]
    fn first_set_misses_even_with_default_value() {
        let mut cache = RenderStateCache::new();
        assert!(cache.set(RenderState::ZEnable, 1));
        assert!(!cache.set(RenderState::ZEnable, 1));
        assert!(cache.set(RenderState::ZEnable, 0));
        assert_eq!((cache.hits(), cache.misses()), (1, 2));
    }

    #[test]
    fn flush_forgets_known_values() {
        let mut cache = RenderStateCache::new();
        cache.set(RenderState::AlphaRef, 128);
        cache.flush();
        assert_eq!(cache.get(RenderState::AlphaRef), 0);
        assert!(cache.set(RenderState::AlphaRef, 0));
        cache.reset_counters();
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn enumerants_fit_the_table() {
        for state in RenderState::ALL {
            assert!(state.index() < STATE_COUNT);
            assert_eq!(RenderState::from_u32(state as u32), Some(state));
        }
        assert_eq!(RenderState::from_u32(3), None);
    }
}
