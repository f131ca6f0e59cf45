// Viewport mapping from clip space to screen space

use glam::Vec4;

/// `|w|` below this is treated as a degenerate perspective divide.
pub const W_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
            min_z: 0.0,
            max_z: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    fn half_extents(&self) -> (f32, f32) {
        (self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    fn center(&self) -> (f32, f32) {
        let (hw, hh) = self.half_extents();
        (self.x as f32 + hw, self.y as f32 + hh)
    }

    /// Perspective-divide `clip` and map it into the viewport.
    ///
    /// The result holds `(x, y, z / w, 1 / w)`; a degenerate `w` maps to the
    /// viewport centre with zero depth.
    pub fn project(&self, clip: Vec4) -> Vec4 {
        let (cx, cy) = self.center();
        if clip.w.abs() < W_EPSILON {
            return Vec4::new(cx, cy, 0.0, 0.0);
        }
        let (hw, hh) = self.half_extents();
        let inv_w = 1.0 / clip.w;
        Vec4::new(
            cx + clip.x * inv_w * hw,
            cy - clip.y * inv_w * hh,
            clip.z * inv_w,
            inv_w,
        )
    }

    /// Whole viewport as a screen rectangle.
    pub fn rect(&self) -> Rect {
        Rect {
            left: self.x as f32,
            top: self.y as f32,
            right: (self.x + self.width) as f32,
            bottom: (self.y + self.height) as f32,
        }
    }
}

/// Screen-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Empty rectangle that any point expands.
    pub fn inverted() -> Self {
        Self {
            left: f32::MAX,
            top: f32::MAX,
            right: f32::MIN,
            bottom: f32::MIN,
        }
    }

    pub fn expand(&mut self, x: f32, y: f32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_into_viewport() {
        let viewport = Viewport::new(0, 0, 640, 480);
        let screen = viewport.project(Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(screen, Vec4::new(480.0, 120.0, 0.5, 1.0));

        let screen = viewport.project(Vec4::new(1.0, -1.0, 1.0, 2.0));
        assert_eq!(screen, Vec4::new(480.0, 360.0, 0.5, 0.5));
    }

    #[test]
    fn degenerate_w_maps_to_centre() {
        let viewport = Viewport::new(10, 20, 100, 50);
        let screen = viewport.project(Vec4::new(3.0, 4.0, 5.0, 1e-9));
        assert_eq!(screen, Vec4::new(60.0, 45.0, 0.0, 0.0));
    }
}
