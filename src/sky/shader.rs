// shader.rs - Aurora shading reference
//
// The GPU evaluates these per vertex / per fragment from the uniforms the
// engine pushes. The Rust versions mirror aurora.wgsl line for line and are
// pure functions of (position, uv, time, parameters).

pub const AURORA_WGSL: &str = include_str!("aurora.wgsl");

/// Wave uniforms shared by all layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub speed: f32,
    pub height: f32,
    pub frequency: f32,
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Vertical displacement at horizontal position `x`, and the same value
/// normalized by wave height (fed to the fragment stage).
pub fn wave_offset(x: f32, time: f32, p: &WaveParams) -> (f32, f32) {
    let w1 = (x * p.frequency + time * p.speed).sin() * p.height;
    let w2 = (x * p.frequency * 1.7 + time * p.speed * 0.7).sin() * p.height * 0.5;
    let w3 = (x * p.frequency * 2.3 + time * p.speed * 1.3).sin() * p.height * 0.3;
    let dy = w1 + w2 + w3;
    let normalized = if p.height > 0.0 { dy / p.height } else { 0.0 };
    (dy, normalized)
}

/// Sideways flow of the ribbon.
pub fn flow_offset(x: f32, time: f32) -> f32 {
    (time * 0.5 + x * 0.001).sin() * 20.0
}

/// 1 at the camera, smoothly down to 0 at `fade_distance` and beyond.
pub fn distance_fade(distance: f32, fade_distance: f32) -> f32 {
    1.0 - smoothstep(0.0, fade_distance, distance)
}

/// Banded brightness travelling along the ribbon.
pub fn flow_pattern(u: f32, wave: f32, time: f32) -> f32 {
    let f1 = (u * 8.0 + time * 0.5).sin() * 0.5 + 0.5;
    let f2 = (u * 12.0 + time * 0.3 + wave).sin() * 0.3 + 0.7;
    let f3 = (u * 20.0 + time * 0.8).sin() * 0.2 + 0.8;
    f1 * f2 * f3
}

/// Soft top and bottom edges.
pub fn vertical_fade(v: f32) -> f32 {
    smoothstep(0.0, 0.3, v) * smoothstep(1.0, 0.7, v)
}

pub fn shimmer(u: f32, time: f32) -> f32 {
    (time * 2.0 + u * 10.0).sin() * 0.1 + 0.9
}
