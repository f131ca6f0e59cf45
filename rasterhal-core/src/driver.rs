//! Rasterizer drivers
//!
//! A driver describes one backend device (capabilities, display modes,
//! texture formats) and owns the contexts created on it. Every context of
//! every driver of a rasterizer shares the rasterizer's object registry.

use crate::backend::RasterBackend;
use crate::config::RasterizerConfig;
use crate::context::{ContextId, RasterizerContext};
use crate::object::SharedRegistry;
use crate::pixel::PixelFormat;
use crate::quirks::DriverProblem;
use crate::sprite::TileLimits;

/// 2D capability bits advertised by the null driver.
pub const NULL_CAPS_2D: u32 = 0x7;

/// Device capabilities relevant to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCaps {
    pub min_texture_width: u32,
    pub min_texture_height: u32,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    /// Largest texture aspect ratio, 0 for unlimited.
    pub max_texture_ratio: u32,
    pub max_texture_stages: u32,
    /// The device supports vertex buffers.
    pub vertex_buffers: bool,
    /// Clamp-to-edge texture addressing works.
    pub clamp_to_edge: bool,
    pub caps_2d: u32,
}

impl Default for DriverCaps {
    fn default() -> Self {
        Self {
            min_texture_width: 8,
            min_texture_height: 8,
            max_texture_width: 4096,
            max_texture_height: 4096,
            max_texture_ratio: 0,
            max_texture_stages: 8,
            vertex_buffers: true,
            clamp_to_edge: true,
            caps_2d: 0,
        }
    }
}

impl DriverCaps {
    pub fn tile_limits(&self, max_tiles_per_axis: usize) -> TileLimits {
        TileLimits {
            min_width: self.min_texture_width,
            max_width: self.max_texture_width,
            min_height: self.min_texture_height,
            max_height: self.max_texture_height,
            max_ratio: self.max_texture_ratio,
            max_tiles_per_axis,
        }
    }

    /// Restrict the capabilities according to a known driver defect.
    pub fn apply_problem(&mut self, problem: &DriverProblem) {
        if problem.max_texture_width > 0 {
            self.max_texture_width = self.max_texture_width.min(problem.max_texture_width);
        }
        if problem.max_texture_height > 0 {
            self.max_texture_height = self.max_texture_height.min(problem.max_texture_height);
        }
        if problem.clamp_to_edge_bug {
            self.clamp_to_edge = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    pub refresh_rate: u32,
}

/// Identity strings reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverInfo {
    pub description: String,
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

pub struct RasterizerDriver {
    info: DriverInfo,
    caps: DriverCaps,
    display_modes: Vec<DisplayMode>,
    texture_formats: Vec<PixelFormat>,
    problem: Option<DriverProblem>,
    registry: SharedRegistry,
    config: RasterizerConfig,
    contexts: Vec<RasterizerContext>,
    next_context: u32,
}

impl RasterizerDriver {
    pub fn new(
        info: DriverInfo,
        caps: DriverCaps,
        registry: SharedRegistry,
        config: RasterizerConfig,
    ) -> Self {
        Self {
            info,
            caps,
            display_modes: Vec::new(),
            texture_formats: Vec::new(),
            problem: None,
            registry,
            config,
            contexts: Vec::new(),
            next_context: 0,
        }
    }

    /// Software driver used when no hardware backend is installed.
    pub fn null(registry: SharedRegistry, config: RasterizerConfig) -> Self {
        let info = DriverInfo {
            description: "NULL Rasterizer".to_string(),
            ..Default::default()
        };
        let caps = DriverCaps {
            caps_2d: NULL_CAPS_2D,
            ..Default::default()
        };
        Self::new(info, caps, registry, config)
            .with_display_modes(vec![DisplayMode {
                width: 640,
                height: 480,
                bpp: 32,
                refresh_rate: 0,
            }])
            .with_texture_formats(vec![PixelFormat::Argb8888])
    }

    pub fn with_display_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.display_modes = modes;
        self
    }

    pub fn with_texture_formats(mut self, formats: Vec<PixelFormat>) -> Self {
        self.texture_formats = formats;
        self
    }

    pub fn info(&self) -> &DriverInfo {
        &self.info
    }

    pub fn caps(&self) -> &DriverCaps {
        &self.caps
    }

    pub fn display_modes(&self) -> &[DisplayMode] {
        &self.display_modes
    }

    pub fn texture_formats(&self) -> &[PixelFormat] {
        &self.texture_formats
    }

    /// Colour depth used to match driver problems: that of the first mode.
    pub fn display_bpp(&self) -> u32 {
        self.display_modes.first().map_or(0, |m| m.bpp)
    }

    pub fn problem(&self) -> Option<&DriverProblem> {
        self.problem.as_ref()
    }

    /// Restrict this driver according to a known defect.
    ///
    /// Only contexts created afterwards see the reduced capabilities.
    pub fn apply_problem(&mut self, problem: DriverProblem) {
        log::warn!(
            "Driver '{}' has a known problem, restricting capabilities",
            self.info.description
        );
        self.caps.apply_problem(&problem);
        self.texture_formats.retain(|f| !problem.affected_formats.contains(f));
        self.problem = Some(problem);
    }

    // ── Contexts ────────────────────────────────────────────────

    pub fn create_context(&mut self, backend: Box<dyn RasterBackend>) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        let context = RasterizerContext::new(
            id,
            self.registry.clone(),
            backend,
            self.caps.clone(),
            self.config.clone(),
        );
        self.contexts.push(context);
        log::debug!("Created context {:?} on '{}'", id, self.info.description);
        id
    }

    pub fn context(&self, id: ContextId) -> Option<&RasterizerContext> {
        self.contexts.iter().find(|c| c.id() == id)
    }

    pub fn context_mut(&mut self, id: ContextId) -> Option<&mut RasterizerContext> {
        self.contexts.iter_mut().find(|c| c.id() == id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &RasterizerContext> {
        self.contexts.iter()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Release the tile slots of sprites every context lost to a broadcast.
    pub(crate) fn settle_contexts(&mut self) {
        for context in &mut self.contexts {
            context.settle();
        }
    }

    /// Destroy a context, flushing every object it holds.
    pub fn destroy_context(&mut self, id: ContextId) -> bool {
        match self.contexts.iter().position(|c| c.id() == id) {
            Some(index) => {
                self.contexts.remove(index);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for RasterizerDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterizerDriver")
            .field("info", &self.info)
            .field("caps", &self.caps)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}
