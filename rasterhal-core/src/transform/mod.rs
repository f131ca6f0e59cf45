//! Per-context transform pipeline.
//!
//! Tracks world/view/projection inputs, derives their products lazily and
//! runs batches of model-space positions through them:
//!
//! - clip-space output (`total × position`)
//! - optional per-vertex [`ClipFlags`] with an AND-reduction over the batch
//! - optional screen-space output through the current [`Viewport`]
//!
//! [`TransformPipeline::compute_box_visibility`] does the same for the eight
//! corners of a bounding box.

pub mod clip;
pub mod matrices;
pub mod viewport;

pub use clip::{ClipAccumulator, ClipFlags};
pub use matrices::{MatrixDirty, MatrixSet, TransformKind};
pub use viewport::{Rect, Viewport, W_EPSILON};

use crate::error::{RasterError, Result};
use crate::vertex::Stream;
use glam::{Mat4, Vec3, Vec4};

/// Buffers for one [`TransformPipeline::transform_vertices`] call.
#[derive(Debug, Default)]
pub struct TransformData<'a> {
    /// Model-space `x, y, z` positions.
    pub input: Option<Stream<'a>>,
    /// Clip-space output. Pipeline scratch storage is used when absent.
    pub output: Option<&'a mut [Vec4]>,
    pub clip_flags: Option<&'a mut [ClipFlags]>,
    pub screen: Option<&'a mut [Vec4]>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxVisibility {
    /// All corners lie outside one common frustum plane.
    Outside,
    /// Some corners cross a frustum plane.
    Intersecting,
    /// Every corner is inside the frustum.
    Inside,
}

#[derive(Debug, Default)]
pub struct TransformPipeline {
    matrices: MatrixSet,
    viewport: Viewport,
    scratch: Vec<Vec4>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_transform(&mut self, kind: TransformKind, matrix: Mat4) {
        self.matrices.set(kind, matrix);
    }

    pub fn transform(&self, kind: TransformKind) -> Mat4 {
        self.matrices.get(kind)
    }

    pub fn matrices(&mut self) -> &mut MatrixSet {
        &mut self.matrices
    }

    pub fn update_matrices(&mut self, required: MatrixDirty) -> MatrixDirty {
        self.matrices.update(required)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Clip-space output of the last call that used pipeline scratch storage.
    pub fn scratch_output(&self) -> &[Vec4] {
        &self.scratch
    }

    /// Transform `count` positions by the total matrix.
    ///
    /// Returns the AND of all clip codes, or an empty set when clip codes
    /// were not requested.
    pub fn transform_vertices(
        &mut self,
        count: usize,
        data: &mut TransformData<'_>,
    ) -> Result<ClipFlags> {
        let input = data.input.ok_or(RasterError::MissingInput("position"))?;
        if count == 0 {
            return Ok(ClipFlags::empty());
        }
        input.check("position", count, 12)?;
        check_len("clip flags", data.clip_flags.as_deref().map(<[_]>::len), count, 4)?;
        check_len("screen", data.screen.as_deref().map(<[_]>::len), count, 16)?;

        let total = self.matrices.total();
        let output: &mut [Vec4] = match data.output.as_deref_mut() {
            Some(output) => {
                check_len("output", Some(output.len()), count, 16)?;
                &mut output[..count]
            }
            None => {
                self.scratch.clear();
                self.scratch.resize(count, Vec4::ZERO);
                &mut self.scratch[..]
            }
        };

        for (i, out) in output.iter_mut().enumerate() {
            let [x, y, z]: [f32; 3] = input.read(i);
            *out = total * Vec4::new(x, y, z, 1.0);
        }

        let mut result = ClipFlags::empty();
        if let Some(flags) = data.clip_flags.as_deref_mut() {
            let mut acc = ClipAccumulator::default();
            for (flag, v) in flags.iter_mut().zip(output.iter()) {
                *flag = ClipFlags::classify(*v);
                acc.add(*flag);
            }
            result = acc.and & ClipFlags::ALL;
        }

        if let Some(screen) = data.screen.as_deref_mut() {
            for (s, v) in screen.iter_mut().zip(output.iter()) {
                *s = self.viewport.project(*v);
            }
        }

        Ok(result)
    }

    /// Classify a bounding box against the view frustum.
    ///
    /// World-space boxes go through view-projection, object-space boxes
    /// through the total matrix. When `extents` is given it receives the
    /// screen rectangle covered by the projected corners, or the whole
    /// viewport when no corner projects.
    pub fn compute_box_visibility(
        &mut self,
        bbox: &BoundingBox,
        world_space: bool,
        extents: Option<&mut Rect>,
    ) -> BoxVisibility {
        let matrix = if world_space {
            self.matrices.view_projection()
        } else {
            self.matrices.total()
        };

        let mut acc = ClipAccumulator::default();
        let mut rect = Rect::inverted();
        let mut projected = 0;
        for corner in bbox.corners() {
            let clip = matrix * corner.extend(1.0);
            acc.add(ClipFlags::classify(clip));
            if clip.w.abs() >= W_EPSILON {
                let screen = self.viewport.project(clip);
                rect.expand(screen.x, screen.y);
                projected += 1;
            }
        }

        if let Some(extents) = extents {
            *extents = if projected > 0 { rect } else { self.viewport.rect() };
        }

        if acc.all_outside() {
            BoxVisibility::Outside
        } else if !acc.or.is_empty() {
            BoxVisibility::Intersecting
        } else {
            BoxVisibility::Inside
        }
    }
}

fn check_len(
    attribute: &'static str,
    len: Option<usize>,
    count: usize,
    element: usize,
) -> Result<()> {
    match len {
        Some(len) if len < count => Err(RasterError::stream_too_short(
            attribute,
            count * element,
            len * element,
        )),
        _ => Ok(()),
    }
}
