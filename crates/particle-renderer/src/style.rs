//! Presentation settings for drawing particles

use bytemuck::{Pod, Zeroable};

/// Style uniform for GPU
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StyleUniform {
    /// Target size in pixels
    pub viewport: [f32; 2],
    /// Point edge length in pixels
    pub point_size: f32,
    pub _padding: f32,
    pub color: [f32; 4],
}

/// How particles and the background look. Colors are sRGB in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub point_size: f32,
    pub point_color: [f32; 3],
    pub background_color: [f32; 3],
}

impl PointStyle {
    /// Pack for the shader. `linear_target` is true when the surface format applies the sRGB curve
    /// on write, in which case colors are converted to linear first.
    pub fn to_uniform(&self, width: u32, height: u32, linear_target: bool) -> StyleUniform {
        let [r, g, b] = self.encode(self.point_color, linear_target);
        StyleUniform {
            viewport: [width.max(1) as f32, height.max(1) as f32],
            point_size: self.point_size,
            _padding: 0.0,
            color: [r, g, b, 1.0],
        }
    }

    pub fn clear_color(&self, linear_target: bool) -> wgpu::Color {
        let [r, g, b] = self.encode(self.background_color, linear_target);
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }

    fn encode(&self, color: [f32; 3], linear_target: bool) -> [f32; 3] {
        if linear_target {
            color.map(srgb_to_linear)
        } else {
            color
        }
    }
}

/// Standard sRGB electro-optical transfer function
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_32_bytes() {
        assert_eq!(std::mem::size_of::<StyleUniform>(), 32);
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        // Mocha base red channel, ((30/255 + 0.055) / 1.055)^2.4
        assert!((srgb_to_linear(30.0 / 255.0) - 0.01298).abs() < 1e-4);
        // Below the linear segment cutoff
        assert!((srgb_to_linear(0.02) - 0.02 / 12.92).abs() < 1e-7);
    }

    #[test]
    fn clear_color_passes_through_for_non_srgb_targets() {
        let style = PointStyle {
            point_size: 2.0,
            point_color: [1.0, 1.0, 1.0],
            background_color: [0.5, 0.25, 0.0],
        };
        let color = style.clear_color(false);
        assert_eq!((color.r, color.g, color.b, color.a), (0.5, 0.25, 0.0, 1.0));
    }

    #[test]
    fn zero_sized_viewport_is_clamped() {
        let style = PointStyle {
            point_size: 3.0,
            point_color: [0.0; 3],
            background_color: [0.0; 3],
        };
        let uniform = style.to_uniform(0, 0, true);
        assert_eq!(uniform.viewport, [1.0, 1.0]);
        assert_eq!(uniform.point_size, 3.0);
    }
}
