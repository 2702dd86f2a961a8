// flake.rs - Procedural snowflake sprite
//
// A six-pointed star filled with a soft radial gradient, plus a bright
// centre dot. Straight (non-premultiplied) RGBA, white throughout; only the
// alpha channel carries the shape.

use std::f32::consts::PI;

pub const FLAKE_SIZE: u32 = 64;

// Geometry at the 64px reference size
const GRADIENT_RADIUS: f32 = 30.0;
const ARM_RADIUS: f32 = 25.0;
const WAIST_RADIUS: f32 = 6.0;
const DOT_RADIUS: f32 = 3.0;
const DOT_ALPHA: f32 = 0.9;

// (offset, alpha) colour stops
const STOPS: [(f32, f32); 3] = [(0.0, 1.0), (0.4, 0.8), (1.0, 0.0)];

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Texture {
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.rgba[((y * self.width + x) * 4 + 3) as usize]
    }
}

pub fn snowflake(size: u32) -> Texture {
    let k = size as f32 / FLAKE_SIZE as f32;
    let c = size as f32 / 2.0;
    let star = star_outline(c, c, ARM_RADIUS * k, WAIST_RADIUS * k);

    let mut rgba = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        for x in 0..size {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let d = ((px - c).powi(2) + (py - c).powi(2)).sqrt();

            let mut a = if inside(&star, px, py) { gradient(d / (GRADIENT_RADIUS * k)) } else { 0.0 };
            if d <= DOT_RADIUS * k {
                // Source-over of the dot onto the star
                a = DOT_ALPHA + a * (1.0 - DOT_ALPHA);
            }

            let i = ((y * size + x) * 4) as usize;
            rgba[i..i + 3].fill(255);
            rgba[i + 3] = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }

    Texture { width: size, height: size, rgba }
}

/// Alternating tip / waist vertices, tips at multiples of 60 degrees.
fn star_outline(cx: f32, cy: f32, outer: f32, inner: f32) -> Vec<(f32, f32)> {
    (0..12)
        .map(|i| {
            let angle = i as f32 * PI / 6.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (cx + angle.cos() * r, cy + angle.sin() * r)
        })
        .collect()
}

/// Even-odd rule.
fn inside(poly: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut hit = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            hit = !hit;
        }
        j = i;
    }
    hit
}

fn gradient(t: f32) -> f32 {
    if t >= 1.0 {
        return 0.0;
    }
    for w in STOPS.windows(2) {
        let ((t0, a0), (t1, a1)) = (w[0], w[1]);
        if t <= t1 {
            return a0 + (a1 - a0) * ((t - t0) / (t1 - t0)).max(0.0);
        }
    }
    0.0
}
