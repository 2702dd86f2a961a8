// field.rs - Fixed-capacity particle pool
//
// Structure-of-Arrays layout for cache-friendly iteration. The pool never
// grows or shrinks: a particle that falls through the floor is recycled at
// the ceiling with a fresh velocity.

use std::f32::consts::TAU;

use glam::Vec3;
use log::debug;

use super::{Bounds, ForceModel, PointStyle, REFERENCE_FPS, Step};
use crate::config::{self, INTENSITY_RANGE, WIND_RANGE};
use crate::rng::RandomSource;
use crate::scene::{Renderable, RenderableId, Scene, clamp_delta};
use crate::weather::WeatherParameters;

pub struct ParticleField<M: ForceModel> {
    model: M,
    bounds: Bounds,

    // Position / velocity, interleaved xyz
    positions: Vec<f32>,
    velocities: Vec<f32>,

    // Per-particle constants
    phase: Vec<f32>,
    base_scale: Vec<f32>,

    // Rendered size, refreshed every update
    scale: Vec<f32>,

    // Multipliers read by the next update
    intensity: f32,
    wind_strength: f32,
    fall_speed: f32,

    elapsed: f32,
    rotation_y: f32,
    renderable: Option<RenderableId>,
}

impl<M: ForceModel> ParticleField<M> {
    pub fn new(model: M, capacity: usize, bounds: Bounds, rng: &mut dyn RandomSource) -> Self {
        let mut positions = Vec::with_capacity(capacity * 3);
        let mut velocities = Vec::with_capacity(capacity * 3);
        let mut phase = Vec::with_capacity(capacity);
        let mut base_scale = Vec::with_capacity(capacity);

        for _ in 0..capacity {
            positions.extend_from_slice(&bounds.random_point(rng).to_array());
            velocities.extend_from_slice(&model.initial_velocity(rng).to_array());
            phase.push(rng.range(0.0, TAU));
            base_scale.push(model.initial_scale(rng));
        }

        debug!("{} field: allocated {} particles", M::NAME, capacity);

        Self {
            scale: base_scale.clone(),
            model,
            bounds,
            positions,
            velocities,
            phase,
            base_scale,
            intensity: 1.0,
            wind_strength: 0.5,
            fall_speed: M::DEFAULT_FALL_SPEED,
            elapsed: 0.0,
            rotation_y: 0.0,
            renderable: None,
        }
    }

    /// Hand the pool to the scene. No-op if already attached.
    pub fn attach(&mut self, scene: &mut dyn Scene, params: &WeatherParameters) {
        if self.renderable.is_some() {
            return;
        }
        let style = self.style(params);
        let id = scene.add(Renderable::Points {
            positions: &self.positions,
            scales: Some(&self.scale),
            style,
            texture: self.model.texture(),
        });
        self.renderable = Some(id);
    }

    /// Advance every particle by `delta` seconds.
    pub fn update(&mut self, delta: f32, rng: &mut dyn RandomSource) {
        let delta = clamp_delta(delta);
        let frames = delta * REFERENCE_FPS;
        self.elapsed += delta;
        self.rotation_y = (self.rotation_y + M::SPIN * frames) % TAU;

        let step = Step {
            elapsed: self.elapsed,
            wind_strength: self.wind_strength,
            fall_speed: self.fall_speed,
        };
        let floor = self.bounds.min.y;

        for i in 0..self.len() {
            let k = i * 3;
            let phase = self.phase[i];

            let v0 = Vec3::from_slice(&self.velocities[k..k + 3]);
            let accel = self.model.acceleration(&step, phase, v0, rng);
            let mut v = v0 + accel * frames;
            let mut p = Vec3::from_slice(&self.positions[k..k + 3])
                + v * self.fall_speed * frames
                + self.model.sway(&step, phase) * frames;

            if p.y < floor {
                // Recycle at the top
                p = self.bounds.spawn_at_top(rng);
                v = self.model.initial_velocity(rng);
            } else {
                p = self.bounds.wrap_horizontal(p);
            }

            v.write_to_slice(&mut self.velocities[k..k + 3]);
            p.write_to_slice(&mut self.positions[k..k + 3]);
            self.scale[i] = self.model.scale_at(self.base_scale[i], phase, self.elapsed);
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = config::clamp(intensity, INTENSITY_RANGE);
    }

    pub fn set_wind_strength(&mut self, strength: f32) {
        self.wind_strength = config::clamp(strength, WIND_RANGE);
    }

    pub fn set_fall_speed(&mut self, speed: f32) {
        self.fall_speed = config::non_negative(speed);
    }

    /// Detach from the scene and release the buffers. Safe to repeat.
    pub fn dispose(&mut self, scene: &mut dyn Scene) {
        if let Some(id) = self.renderable.take() {
            scene.remove(id);
            debug!("{} field: disposed {} particles", M::NAME, self.len());
        }
        self.positions = Vec::new();
        self.velocities = Vec::new();
        self.phase = Vec::new();
        self.base_scale = Vec::new();
        self.scale = Vec::new();
    }

    pub fn style(&self, params: &WeatherParameters) -> PointStyle {
        self.model.style(self.intensity, params)
    }

    pub fn len(&self) -> usize {
        self.phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phase.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    pub fn phases(&self) -> &[f32] {
        &self.phase
    }

    pub fn scales(&self) -> &[f32] {
        &self.scale
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn wind_strength(&self) -> f32 {
        self.wind_strength
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn renderable(&self) -> Option<RenderableId> {
        self.renderable
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    // Accessors for WASM
    pub fn positions_ptr(&self) -> *const f32 { self.positions.as_ptr() }
    pub fn scales_ptr(&self) -> *const f32 { self.scale.as_ptr() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Xorshift32;
    use crate::scene::MemoryScene;
    use crate::sim::{Rain, Snow};

    const FRAME: f32 = 1.0 / 60.0;

    fn lowest(positions: &[f32]) -> f32 {
        positions.iter().skip(1).step_by(3).copied().fold(f32::INFINITY, f32::min)
    }

    #[test]
    fn rain_never_rests_below_floor() {
        let mut rng = Xorshift32::new(1);
        let mut field = ParticleField::new(Rain, 2_000, Bounds::sky(), &mut rng);
        field.set_fall_speed(1.5);
        for _ in 0..600 {
            field.update(FRAME, &mut rng);
            assert!(lowest(field.positions()) >= field.bounds().min.y);
        }
    }

    #[test]
    fn snow_never_rests_below_floor() {
        let mut rng = Xorshift32::new(2);
        let mut field = ParticleField::new(Snow::new(), 1_000, Bounds::sky(), &mut rng);
        field.set_wind_strength(2.0);
        for _ in 0..300 {
            // Uneven frame times
            field.update(0.2, &mut rng);
            assert!(lowest(field.positions()) >= field.bounds().min.y);
        }
    }

    #[test]
    fn count_is_fixed_for_any_capacity() {
        let mut rng = Xorshift32::new(3);
        for capacity in [0, 1, 17, 500] {
            let mut field = ParticleField::new(Rain, capacity, Bounds::sky(), &mut rng);
            for _ in 0..120 {
                field.update(FRAME, &mut rng);
            }
            assert_eq!(field.len(), capacity);
            assert_eq!(field.positions().len(), capacity * 3);
            assert_eq!(field.velocities().len(), capacity * 3);
            assert_eq!(field.scales().len(), capacity);
        }
    }

    #[test]
    fn initial_particles_fill_bounds() {
        let mut rng = Xorshift32::new(4);
        let bounds = Bounds::sky();
        let field = ParticleField::new(Snow::new(), 300, bounds, &mut rng);
        for p in field.positions().chunks(3) {
            let p = Vec3::from_slice(p);
            assert!(p.cmpge(bounds.min).all() && p.cmple(bounds.max).all());
        }
    }

    #[test]
    fn fallen_particle_respawns_on_ceiling_with_fresh_velocity() {
        let mut rng = Xorshift32::new(5);
        let bounds = Bounds::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 10.0, 1.0));
        let mut field = ParticleField::new(Rain, 1, bounds, &mut rng);
        field.set_fall_speed(1.0);

        // Fall until the first recycle
        let mut prev_y = field.positions()[1];
        for _ in 0..1_000 {
            field.update(FRAME, &mut rng);
            let y = field.positions()[1];
            if y > prev_y {
                assert_eq!(y, bounds.max.y);
                let vy = field.velocities()[1];
                assert!((-1.0..=-0.5).contains(&vy), "reset velocity {vy}");
                return;
            }
            prev_y = y;
        }
        panic!("particle never recycled");
    }

    #[test]
    fn setters_do_not_touch_particle_state() {
        let mut rng = Xorshift32::new(6);
        let mut field = ParticleField::new(Snow::new(), 50, Bounds::sky(), &mut rng);
        let before = field.positions().to_vec();
        field.set_intensity(0.3);
        field.set_wind_strength(1.7);
        field.set_fall_speed(0.9);
        assert_eq!(field.positions(), &before[..]);
        assert_eq!(field.intensity(), 0.3);
        assert_eq!(field.wind_strength(), 1.7);
        assert_eq!(field.fall_speed(), 0.9);
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let mut rng = Xorshift32::new(7);
        let mut field = ParticleField::new(Rain, 4, Bounds::sky(), &mut rng);
        field.set_intensity(9.0);
        field.set_wind_strength(-1.0);
        field.set_fall_speed(f32::NAN);
        assert_eq!(field.intensity(), 1.5);
        assert_eq!(field.wind_strength(), 0.0);
        assert_eq!(field.fall_speed(), 0.0);
    }

    #[test]
    fn dispose_is_idempotent_and_safe_unattached() {
        let mut rng = Xorshift32::new(8);
        let mut scene = MemoryScene::new();
        let params = WeatherParameters::default();

        let mut lonely = ParticleField::new(Rain, 10, Bounds::sky(), &mut rng);
        lonely.dispose(&mut scene);
        assert_eq!(scene.removed(), 0);

        let mut field = ParticleField::new(Snow::new(), 10, Bounds::sky(), &mut rng);
        field.attach(&mut scene, &params);
        field.attach(&mut scene, &params);
        assert_eq!(scene.len(), 1);
        field.dispose(&mut scene);
        field.dispose(&mut scene);
        assert!(scene.is_empty());
        assert_eq!(scene.removed(), 1);
        assert!(field.is_empty());
    }

    #[test]
    fn zero_capacity_updates_are_noops() {
        let mut rng = Xorshift32::new(9);
        let mut field = ParticleField::new(Snow::new(), 0, Bounds::sky(), &mut rng);
        field.update(FRAME, &mut rng);
        assert!(field.is_empty());
    }

    fn mean_abs(velocities: &[f32], axis: usize) -> f32 {
        let n = velocities.len() / 3;
        velocities.iter().skip(axis).step_by(3).map(|v| v.abs()).sum::<f32>() / n as f32
    }

    #[test]
    fn snow_drifts_down_not_sideways() {
        let mut rng = Xorshift32::new(12);
        let mut field = ParticleField::new(Snow::new(), 2_000, Bounds::sky(), &mut rng);
        field.set_wind_strength(0.0);
        for frame in 1..=600 {
            field.update(FRAME, &mut rng);
            if frame == 60 || frame == 600 {
                let vx = mean_abs(field.velocities(), 0);
                let vy = mean_abs(field.velocities(), 1);
                assert!(vx < vy, "frame {frame}: mean |vx| {vx} vs mean |vy| {vy}");
            }
        }
    }

    #[test]
    fn snow_wind_speed_levels_off() {
        let mut rng = Xorshift32::new(13);
        let mut field = ParticleField::new(Snow::new(), 500, Bounds::sky(), &mut rng);
        field.set_wind_strength(2.0);
        for _ in 0..1_200 {
            field.update(FRAME, &mut rng);
        }
        // Drag caps the wind-driven speed at push / drag
        for v in field.velocities().chunks(3) {
            assert!(v[0].abs() <= 0.41 && v[2].abs() <= 0.21, "runaway drift {v:?}");
        }
    }

    #[test]
    fn snow_scale_pulses_around_base() {
        let mut rng = Xorshift32::new(10);
        let mut field = ParticleField::new(Snow::new(), 100, Bounds::sky(), &mut rng);
        for _ in 0..30 {
            field.update(FRAME, &mut rng);
        }
        for &s in field.scales() {
            assert!((0.45..=2.2).contains(&s), "scale {s}");
        }
    }
}
