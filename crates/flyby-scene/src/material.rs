//! Surface descriptions attached to mesh and points nodes.

use std::sync::Arc;

use flyby_render::hex_to_linear;

/// Decoded RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Lit mesh surface. Colors are linear RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMaterial {
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    /// Color map multiplied into `color`.
    pub map: Option<Arc<TextureImage>>,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            emissive: [0.0; 3],
            emissive_intensity: 1.0,
            map: None,
        }
    }
}

impl MeshMaterial {
    /// Self-lit surface that ignores the scene light.
    pub fn emissive(emissive_hex: u32, intensity: f32) -> Self {
        Self {
            color: [0.0; 3],
            emissive: hex_to_linear(emissive_hex),
            emissive_intensity: intensity,
            map: None,
        }
    }
}

/// Constant-size point sprite material.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsMaterial {
    pub color: [f32; 3],
    /// Point size in logical pixels.
    pub size: f32,
    /// Requests distance attenuation, which is not supported. Points are
    /// always drawn at `size` logical pixels and a warning is logged when set.
    pub size_attenuation: bool,
}

impl PointsMaterial {
    pub fn new(hex: u32, size: f32) -> Self {
        Self {
            color: hex_to_linear(hex),
            size,
            size_attenuation: false,
        }
    }
}

/// The six grey star materials, indexed by `layer % 6`.
pub fn star_palette() -> [PointsMaterial; 6] {
    [
        PointsMaterial::new(0x555555, 2.0),
        PointsMaterial::new(0x555555, 1.0),
        PointsMaterial::new(0x333333, 2.0),
        PointsMaterial::new(0x3a3a3a, 1.0),
        PointsMaterial::new(0x1a1a1a, 2.0),
        PointsMaterial::new(0x1a1a1a, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_sizes_alternate() {
        let palette = star_palette();
        let sizes: Vec<f32> = palette.iter().map(|m| m.size).collect();
        assert_eq!(sizes, vec![2.0, 1.0, 2.0, 1.0, 2.0, 1.0]);
        assert!(palette.iter().all(|m| !m.size_attenuation));
    }

    #[test]
    fn test_palette_colors_are_grey_and_dimming() {
        let palette = star_palette();
        for m in &palette {
            assert_eq!(m.color[0], m.color[1]);
            assert_eq!(m.color[1], m.color[2]);
        }
        assert_eq!(palette[0].color, palette[1].color);
        assert!(palette[2].color[0] < palette[3].color[0]);
        assert!(palette[4].color[0] < palette[2].color[0]);
    }

    #[test]
    fn test_emissive_material_has_black_base() {
        let m = MeshMaterial::emissive(0xffffee, 1.0);
        assert_eq!(m.color, [0.0; 3]);
        assert_eq!(m.emissive[0], 1.0);
        assert!(m.emissive[2] < 1.0);
        assert!(m.map.is_none());
    }
}
