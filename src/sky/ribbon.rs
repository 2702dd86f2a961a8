// ribbon.rs - Aurora strip geometry
//
// One horizontal band of SEGMENTS+1 top/bottom vertex pairs spanning the
// sky, indexed as a strip of quads. Colour is baked per vertex.

use super::{Color, Palette};

pub const SEGMENTS: usize = 60;
pub const SPAN: f32 = 3000.0;
pub const STRIP_WIDTH: f32 = 150.0;

const BASE_HEIGHT: f32 = 400.0;
const LAYER_RISE: f32 = 80.0;
const BASE_DEPTH: f32 = -800.0;
const LAYER_RECESS: f32 = 100.0;

// Band edges along the mix fraction, and how far each layer shifts it
const FIRST_BAND: f32 = 0.3;
const SECOND_BAND: f32 = 0.7;
/// Band offset between consecutive layers, in units of u.
pub const LAYER_SHIFT: f32 = 0.3;

/// Immutable once built. A palette change means a new mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RibbonMesh {
    pub positions: Vec<f32>,
    pub uvs: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub fn layer_height(layer: usize) -> f32 {
    BASE_HEIGHT + layer as f32 * LAYER_RISE
}

pub fn layer_depth(layer: usize) -> f32 {
    BASE_DEPTH - layer as f32 * LAYER_RECESS
}

/// Three hard bands: primary, secondary, tertiary.
pub fn band_color(mix: f32, palette: &Palette) -> Color {
    if mix < FIRST_BAND {
        palette.primary
    } else if mix < SECOND_BAND {
        palette.secondary
    } else {
        palette.tertiary
    }
}

pub fn build_ribbon(layer: usize, palette: &Palette) -> RibbonMesh {
    let pairs = SEGMENTS + 1;
    let mut positions = Vec::with_capacity(pairs * 6);
    let mut uvs = Vec::with_capacity(pairs * 4);
    let mut colors = Vec::with_capacity(pairs * 6);
    let mut indices = Vec::with_capacity(SEGMENTS * 6);

    let base_y = layer_height(layer);
    let z = layer_depth(layer);

    for i in 0..pairs {
        let u = i as f32 / SEGMENTS as f32;
        let x = u * SPAN - SPAN / 2.0;
        let color = band_color(u + layer as f32 * LAYER_SHIFT, palette);

        // Bottom then top
        for j in 0..2 {
            positions.extend_from_slice(&[x, base_y + j as f32 * STRIP_WIDTH, z]);
            uvs.extend_from_slice(&[u, j as f32]);
            colors.extend_from_slice(&color.to_array());
        }

        if i < SEGMENTS {
            let base = (i * 2) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
            indices.extend_from_slice(&[base + 1, base + 3, base + 2]);
        }
    }

    RibbonMesh { positions, uvs, colors, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_has_paired_vertices_and_two_triangles_per_segment() {
        let mesh = build_ribbon(0, &Palette::rainbow());
        assert_eq!(mesh.vertex_count(), (SEGMENTS + 1) * 2);
        assert_eq!(mesh.triangle_count(), SEGMENTS * 2);
        assert_eq!(mesh.uvs.len(), mesh.vertex_count() * 2);
        assert_eq!(mesh.colors.len(), mesh.vertex_count() * 3);
        let max = *mesh.indices.iter().max().unwrap() as usize;
        assert_eq!(max, mesh.vertex_count() - 1);
    }

    #[test]
    fn spans_full_width_at_layer_height() {
        let mesh = build_ribbon(2, &Palette::rainbow());
        let first = &mesh.positions[0..3];
        let last_top = &mesh.positions[mesh.positions.len() - 3..];
        assert_eq!(first, &[-SPAN / 2.0, 560.0, -1000.0]);
        assert_eq!(last_top, &[SPAN / 2.0, 560.0 + STRIP_WIDTH, -1000.0]);
    }

    #[test]
    fn colors_fall_into_three_bands() {
        let palette = Palette::rainbow();
        let mesh = build_ribbon(0, &palette);
        let color_at = |pair: usize| &mesh.colors[pair * 6..pair * 6 + 3];
        assert_eq!(color_at(0), &palette.primary.to_array());
        assert_eq!(color_at(SEGMENTS / 2), &palette.secondary.to_array());
        assert_eq!(color_at(SEGMENTS), &palette.tertiary.to_array());
    }

    #[test]
    fn later_layers_shift_toward_later_bands() {
        let palette = Palette::rainbow();
        let mesh = build_ribbon(1, &palette);
        // Mix starts at 0.3 for layer 1, so no primary at all
        assert_eq!(&mesh.colors[0..3], &palette.secondary.to_array());
    }

    #[test]
    fn band_thresholds() {
        let p = Palette::blue_purple();
        assert_eq!(band_color(0.29, &p), p.primary);
        assert_eq!(band_color(0.3, &p), p.secondary);
        assert_eq!(band_color(0.7, &p), p.tertiary);
    }
}
