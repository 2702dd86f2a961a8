// rain.rs - Falling rain
//
// Strong downward start, jittered gravity each frame, and a gusting wind
// that swings the whole sheet left and right over time.

use glam::Vec3;

use super::{ForceModel, PointStyle, Step};
use crate::rng::RandomSource;
use crate::weather::WeatherParameters;

// Physics constants (per reference frame)
const GRAVITY_MIN: f32 = 0.1;
const GRAVITY_JITTER: f32 = 0.1;
const GUST: f32 = 0.1;
const DRIFT: f32 = 0.01;
const FALL_MIN: f32 = 0.5;
const FALL_MAX: f32 = 1.0;

// Material
const COLOR: u32 = 0xaaaaaa;
const COLOR_SLEET: u32 = 0xeeeeee;
const COLOR_HOT: u32 = 0x888888;
const SIZE: f32 = 0.1;
const SIZE_SLEET: f32 = 0.2;

/// Sleet falls slower than rain.
pub const SLEET_SLOWDOWN: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default)]
pub struct Rain;

impl ForceModel for Rain {
    const NAME: &'static str = "rain";
    const SPIN: f32 = 0.002;
    const DEFAULT_FALL_SPEED: f32 = 0.5;

    fn initial_velocity(&self, rng: &mut dyn RandomSource) -> Vec3 {
        Vec3::new(rng.centered(DRIFT), -rng.range(FALL_MIN, FALL_MAX), rng.centered(DRIFT))
    }

    fn initial_scale(&self, _rng: &mut dyn RandomSource) -> f32 {
        1.0
    }

    fn acceleration(&self, step: &Step, _phase: f32, _velocity: Vec3, rng: &mut dyn RandomSource) -> Vec3 {
        // Gravity scales with the fall-speed knob, so faster rain also accelerates harder
        let gravity = (GRAVITY_MIN + rng.next_f32() * GRAVITY_JITTER) * step.fall_speed;
        Vec3::new(0.0, -gravity, 0.0)
    }

    fn sway(&self, step: &Step, _phase: f32) -> Vec3 {
        Vec3::new(step.elapsed.sin() * GUST * step.wind_strength, 0.0, 0.0)
    }

    fn style(&self, intensity: f32, params: &WeatherParameters) -> PointStyle {
        let (color, size) = if params.temperature < 0.0 {
            (COLOR_SLEET, SIZE_SLEET)
        } else if params.temperature > 30.0 {
            (COLOR_HOT, SIZE)
        } else {
            (COLOR, SIZE)
        };
        PointStyle {
            color,
            size,
            opacity: (params.humidity / 100.0 * intensity).clamp(0.0, 1.0),
            additive: false,
        }
    }
}
