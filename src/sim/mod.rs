// sim/ - Precipitation simulation
//
// Particle pools using Structure-of-Arrays for cache efficiency. One generic
// pool, one force model per precipitation kind.

mod field;
mod flake;
mod rain;
mod snow;

pub use field::ParticleField;
pub use flake::{FLAKE_SIZE, Texture, snowflake};
pub use rain::{Rain, SLEET_SLOWDOWN};
pub use snow::Snow;

use glam::Vec3;

use crate::rng::RandomSource;
use crate::weather::WeatherParameters;

pub type RainField = ParticleField<Rain>;
pub type SnowField = ParticleField<Snow>;

/// Per-frame constants are tuned for this refresh rate; `update` scales by
/// `delta * REFERENCE_FPS`.
pub const REFERENCE_FPS: f32 = 60.0;

/// Axis-aligned volume particles live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Corners may be given in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// The sky box under the clouds.
    pub fn sky() -> Self {
        Self::new(Vec3::new(-200.0, -250.0, -200.0), Vec3::new(200.0, 250.0, 200.0))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn random_point(&self, rng: &mut dyn RandomSource) -> Vec3 {
        Vec3::new(
            rng.range(self.min.x, self.max.x),
            rng.range(self.min.y, self.max.y),
            rng.range(self.min.z, self.max.z),
        )
    }

    /// Random horizontal location on the ceiling.
    pub fn spawn_at_top(&self, rng: &mut dyn RandomSource) -> Vec3 {
        Vec3::new(rng.range(self.min.x, self.max.x), self.max.y, rng.range(self.min.z, self.max.z))
    }

    /// Wrap x/z back into the volume. Vertical position is untouched.
    pub fn wrap_horizontal(&self, p: Vec3) -> Vec3 {
        Vec3::new(wrap(p.x, self.min.x, self.max.x), p.y, wrap(p.z, self.min.z, self.max.z))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::sky()
    }
}

#[inline]
fn wrap(v: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    if span <= 0.0 {
        return lo;
    }
    if v >= lo && v <= hi {
        return v;
    }
    lo + (v - lo).rem_euclid(span)
}

/// Point material parameters the host applies to a pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub color: u32,
    pub size: f32,
    pub opacity: f32,
    pub additive: bool,
}

/// Inputs shared by every particle during one update.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    /// Seconds since the pool was created.
    pub elapsed: f32,
    pub wind_strength: f32,
    pub fall_speed: f32,
}

/// How one precipitation kind spawns and accelerates its particles.
pub trait ForceModel {
    const NAME: &'static str;
    /// Whole-pool spin about Y, radians per reference frame.
    const SPIN: f32;
    const DEFAULT_FALL_SPEED: f32;

    fn initial_velocity(&self, rng: &mut dyn RandomSource) -> Vec3;

    fn initial_scale(&self, rng: &mut dyn RandomSource) -> f32;

    /// Velocity change for one reference frame, given the current velocity.
    fn acceleration(&self, step: &Step, phase: f32, velocity: Vec3, rng: &mut dyn RandomSource) -> Vec3;

    /// Position nudge for one reference frame. Applied after integration and
    /// never fed back into velocity.
    fn sway(&self, _step: &Step, _phase: f32) -> Vec3 {
        Vec3::ZERO
    }

    fn scale_at(&self, base: f32, _phase: f32, _elapsed: f32) -> f32 {
        base
    }

    fn style(&self, intensity: f32, params: &WeatherParameters) -> PointStyle;

    fn texture(&self) -> Option<&Texture> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Xorshift32;

    #[test]
    fn bounds_normalize_corners() {
        let b = Bounds::new(Vec3::new(5.0, -1.0, 3.0), Vec3::new(-5.0, 1.0, -3.0));
        assert_eq!(b.min, Vec3::new(-5.0, -1.0, -3.0));
        assert_eq!(b.max, Vec3::new(5.0, 1.0, 3.0));
    }

    #[test]
    fn spawn_lands_on_ceiling_inside_footprint() {
        let b = Bounds::sky();
        let mut rng = Xorshift32::new(11);
        for _ in 0..500 {
            let p = b.spawn_at_top(&mut rng);
            assert_eq!(p.y, b.max.y);
            assert!(p.x >= b.min.x && p.x < b.max.x);
            assert!(p.z >= b.min.z && p.z < b.max.z);
        }
    }

    #[test]
    fn horizontal_wrap_keeps_height() {
        let b = Bounds::sky();
        let p = b.wrap_horizontal(Vec3::new(250.0, -300.0, -230.0));
        assert!((p.x - -150.0).abs() < 1e-4);
        assert!((p.z - 170.0).abs() < 1e-4);
        assert_eq!(p.y, -300.0);
    }

    #[test]
    fn degenerate_span_collapses() {
        let b = Bounds::new(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(b.wrap_horizontal(Vec3::new(3.0, 1.0, -4.0)), Vec3::new(0.0, 1.0, 0.0));
    }
}
