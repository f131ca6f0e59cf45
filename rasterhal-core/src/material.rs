//! Material storage and light attenuation helpers.

use glam::Vec4;

/// Surface material as set on a context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: Vec4,
    pub ambient: Vec4,
    pub specular: Vec4,
    pub emissive: Vec4,
    pub specular_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec4::ONE,
            ambient: Vec4::ONE,
            specular: Vec4::ZERO,
            emissive: Vec4::ZERO,
            specular_power: 0.0,
        }
    }
}

/// Light attenuation coefficients `(constant, linear, quadratic)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
}

/// Convert DirectX 5 style attenuation factors for a light of `range`.
pub fn convert_attenuation_from_dx5(attenuation: Attenuation, range: f32) -> Attenuation {
    let Attenuation { a0, a1, a2 } = attenuation;
    let c0 = 1.0 / (a0 + a1 + a2);
    let c1 = (a2 + a2 + a1) * (c0 / range) * c0;
    let c2 = c0 * a2 * c0 / (range * range) + c1 * c1 / c0;
    Attenuation {
        a0: c0,
        a1: c1,
        a2: c2,
    }
}
