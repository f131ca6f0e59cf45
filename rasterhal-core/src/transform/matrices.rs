//! Input matrices and lazily derived products.

use bitflags::bitflags;
use glam::Mat4;

bitflags! {
    /// Derived matrices that are stale relative to their inputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MatrixDirty: u32 {
        /// view × world
        const MODEL_VIEW = 0x1;
        /// projection × view × world
        const TOTAL = 0x2;
        /// projection × view
        const VIEW_PROJECTION = 0x4;
    }
}

/// Input matrix selector for `set_transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    World,
    View,
    Projection,
}

impl TransformKind {
    /// Derived matrices invalidated by changing this input.
    pub fn invalidates(self) -> MatrixDirty {
        match self {
            Self::World => MatrixDirty::MODEL_VIEW | MatrixDirty::TOTAL,
            Self::View => MatrixDirty::all(),
            Self::Projection => MatrixDirty::TOTAL | MatrixDirty::VIEW_PROJECTION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatrixSet {
    world: Mat4,
    view: Mat4,
    projection: Mat4,
    model_view: Mat4,
    total: Mat4,
    view_projection: Mat4,
    dirty: MatrixDirty,
}

impl Default for MatrixSet {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            total: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            dirty: MatrixDirty::empty(),
        }
    }
}

impl MatrixSet {
    pub fn set(&mut self, kind: TransformKind, matrix: Mat4) {
        match kind {
            TransformKind::World => self.world = matrix,
            TransformKind::View => self.view = matrix,
            TransformKind::Projection => self.projection = matrix,
        }
        self.dirty |= kind.invalidates();
    }

    pub fn get(&self, kind: TransformKind) -> Mat4 {
        match kind {
            TransformKind::World => self.world,
            TransformKind::View => self.view,
            TransformKind::Projection => self.projection,
        }
    }

    pub fn dirty(&self) -> MatrixDirty {
        self.dirty
    }

    /// Recompute the stale matrices among `required` and clear their bits.
    ///
    /// Returns the set of matrices actually recomputed.
    pub fn update(&mut self, required: MatrixDirty) -> MatrixDirty {
        let mut stale = self.dirty & required;
        // total is built from model-view
        if stale.contains(MatrixDirty::TOTAL) && self.dirty.contains(MatrixDirty::MODEL_VIEW) {
            stale |= MatrixDirty::MODEL_VIEW;
        }

        if stale.contains(MatrixDirty::MODEL_VIEW) {
            self.model_view = self.view * self.world;
        }
        if stale.contains(MatrixDirty::TOTAL) {
            self.total = self.projection * self.model_view;
        }
        if stale.contains(MatrixDirty::VIEW_PROJECTION) {
            self.view_projection = self.projection * self.view;
        }

        self.dirty.remove(stale);
        stale
    }

    pub fn model_view(&mut self) -> Mat4 {
        self.update(MatrixDirty::MODEL_VIEW);
        self.model_view
    }

    pub fn total(&mut self) -> Mat4 {
        self.update(MatrixDirty::TOTAL);
        self.total
    }

    pub fn view_projection(&mut self) -> Mat4 {
        self.update(MatrixDirty::VIEW_PROJECTION);
        self.view_projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn world_leaves_view_projection_fresh() {
        let mut set = MatrixSet::default();
        set.set(TransformKind::World, Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(set.dirty(), MatrixDirty::MODEL_VIEW | MatrixDirty::TOTAL);

        set.set(TransformKind::Projection, Mat4::IDENTITY);
        assert_eq!(set.dirty(), MatrixDirty::all());
    }

    #[test]
    fn update_touches_only_required() {
        let mut set = MatrixSet::default();
        set.set(TransformKind::View, Mat4::from_translation(Vec3::X));
        assert_eq!(set.update(MatrixDirty::VIEW_PROJECTION), MatrixDirty::VIEW_PROJECTION);
        assert_eq!(set.dirty(), MatrixDirty::MODEL_VIEW | MatrixDirty::TOTAL);
        assert_eq!(set.update(MatrixDirty::VIEW_PROJECTION), MatrixDirty::empty());
    }

    #[test]
    fn total_pulls_in_model_view() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let view = Mat4::from_scale(Vec3::splat(2.0));
        let projection = Mat4::from_translation(Vec3::Z);

        let mut set = MatrixSet::default();
        set.set(TransformKind::World, world);
        set.set(TransformKind::View, view);
        set.set(TransformKind::Projection, projection);

        assert_eq!(set.total(), projection * view * world);
        assert!(set.dirty() == MatrixDirty::VIEW_PROJECTION);
        assert_eq!(set.model_view(), view * world);
        assert_eq!(set.view_projection(), projection * view);
        assert!(set.dirty().is_empty());
    }
}
