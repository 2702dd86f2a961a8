// snow.rs - Drifting snowflakes
//
// Weak gravity, a wind push held in check by air drag, and a per-flake
// sinusoidal sway keyed on the flake's phase. The sway moves the flake
// directly and never builds up speed. Flakes never interact; the sway alone
// reads as turbulence.

use glam::Vec3;

use super::{FLAKE_SIZE, ForceModel, PointStyle, Step, Texture, snowflake};
use crate::rng::RandomSource;
use crate::weather::WeatherParameters;

const GRAVITY: f32 = 0.001;
const WIND: Vec3 = Vec3::new(0.01, 0.0, 0.005);
const SWAY: f32 = 0.02;
// Fraction of horizontal speed lost per reference frame
const DRAG: f32 = 0.05;
const DRIFT: f32 = 0.01;
const FALL_MIN: f32 = 0.05;
const FALL_MAX: f32 = 0.15;
const PULSE: f32 = 0.1;

const SIZE: f32 = 2.0;
const OPACITY: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct Snow {
    texture: Texture,
}

impl Snow {
    pub fn new() -> Self {
        Self { texture: snowflake(FLAKE_SIZE) }
    }
}

impl Default for Snow {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceModel for Snow {
    const NAME: &'static str = "snow";
    const SPIN: f32 = 0.0005;
    const DEFAULT_FALL_SPEED: f32 = 0.3;

    fn initial_velocity(&self, rng: &mut dyn RandomSource) -> Vec3 {
        Vec3::new(rng.centered(DRIFT), -rng.range(FALL_MIN, FALL_MAX), rng.centered(DRIFT))
    }

    fn initial_scale(&self, rng: &mut dyn RandomSource) -> f32 {
        rng.range(0.5, 2.0)
    }

    fn acceleration(&self, step: &Step, _phase: f32, velocity: Vec3, _rng: &mut dyn RandomSource) -> Vec3 {
        Vec3::new(
            WIND.x * step.wind_strength - DRAG * velocity.x,
            -GRAVITY,
            WIND.z * step.wind_strength - DRAG * velocity.z,
        )
    }

    fn sway(&self, step: &Step, phase: f32) -> Vec3 {
        Vec3::new((step.elapsed + phase).sin() * SWAY, 0.0, 0.0)
    }

    fn scale_at(&self, base: f32, phase: f32, elapsed: f32) -> f32 {
        base * (1.0 + (elapsed * 2.0 + phase).sin() * PULSE)
    }

    fn style(&self, intensity: f32, _params: &WeatherParameters) -> PointStyle {
        PointStyle {
            color: 0xffffff,
            size: SIZE,
            opacity: (intensity * OPACITY).clamp(0.0, 1.0),
            additive: true,
        }
    }

    fn texture(&self) -> Option<&Texture> {
        Some(&self.texture)
    }
}
