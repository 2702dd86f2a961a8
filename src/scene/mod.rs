// scene/ - Collaborator contracts for the host renderer
//
// The engine never draws. It hands renderables to a `Scene`, reads the
// camera position each frame, and is driven by a frame clock. The host
// (three.js on the web, `MemoryScene` in tests) owns the actual GPU side.

mod memory;

pub use memory::{MemoryScene, SceneMember};

use glam::Vec3;

use crate::sim::{PointStyle, Texture};
use crate::sky::RibbonMesh;

/// Handle returned by `Scene::add`, used to remove the renderable later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderableId(pub u32);

/// What the engine hands to the scene. Borrowed data is copied by the host;
/// particle buffers keep changing afterwards and are re-read every frame.
#[derive(Debug, Clone, Copy)]
pub enum Renderable<'a> {
    Points {
        positions: &'a [f32],
        scales: Option<&'a [f32]>,
        style: PointStyle,
        texture: Option<&'a Texture>,
    },
    Ribbon {
        mesh: &'a RibbonMesh,
        render_order: u32,
    },
}

impl Renderable<'_> {
    pub fn kind(&self) -> RenderableKind {
        match self {
            Renderable::Points { .. } => RenderableKind::Points,
            Renderable::Ribbon { .. } => RenderableKind::Ribbon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderableKind {
    Points,
    Ribbon,
}

impl RenderableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderableKind::Points => "points",
            RenderableKind::Ribbon => "ribbon",
        }
    }
}

pub trait Scene {
    fn add(&mut self, renderable: Renderable<'_>) -> RenderableId;
    fn remove(&mut self, id: RenderableId);
}

/// Read once per frame for parallax and distance fade.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub position: Vec3,
}

impl Camera {
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}

/// Longest step a single frame may advance. Larger gaps (tab switched away,
/// debugger pause) are treated as this.
pub const MAX_DELTA: f32 = 0.25;

/// Frame timing in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    pub elapsed: f32,
    pub delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta` seconds; returns the clamped step actually taken.
    pub fn tick(&mut self, delta: f32) -> f32 {
        let delta = clamp_delta(delta);
        self.delta = delta;
        self.elapsed += delta;
        delta
    }
}

#[inline]
pub fn clamp_delta(delta: f32) -> f32 {
    if delta.is_finite() { delta.clamp(0.0, MAX_DELTA) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_clamps_bad_deltas() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(-1.0), 0.0);
        assert_eq!(clock.tick(f32::NAN), 0.0);
        assert_eq!(clock.tick(5.0), MAX_DELTA);
        assert_eq!(clock.tick(0.016), 0.016);
        assert!((clock.elapsed - (MAX_DELTA + 0.016)).abs() < 1e-6);
    }
}
