// aurora.rs - Northern lights
//
// N ribbon layers, each a quarter turn out of phase with the previous one.
// Per frame the system only moves whole meshes (bob, wobble, parallax) and
// refreshes uniforms; the wave itself is evaluated on the GPU.

use std::f32::consts::PI;

use glam::Vec3;
use log::{debug, info};

use super::{Palette, RibbonMesh, Transition, WaveParams, build_ribbon, layer_depth};
use crate::config::{self, AuroraConfig, INTENSITY_RANGE, MAX_AURORA_LAYERS};
use crate::scene::{Camera, Renderable, RenderableId, Scene, clamp_delta};

const RENDER_ORDER_BASE: u32 = 1000;
const PHASE_STEP: f32 = PI * 0.5;

// Rigid motion
const BOB_RATE: f32 = 0.3;
const BOB_HEIGHT: f32 = 30.0;
const WOBBLE_RATE: f32 = 0.1;
const WOBBLE_ANGLE: f32 = 0.05;
const PARALLAX_BASE: f32 = 0.3;
const PARALLAX_STEP: f32 = 0.1;
const DEPTH_FOLLOW: f32 = 0.1;

/// Everything the fragment and vertex stages read for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuroraUniforms {
    pub time: f32,
    pub intensity: f32,
    pub wave: WaveParams,
    pub camera_position: Vec3,
    pub fade_distance: f32,
}

#[derive(Debug)]
pub struct AuroraLayer {
    pub index: usize,
    pub phase_offset: f32,
    pub mesh: RibbonMesh,
    pub render_order: u32,

    // Rigid transform, rewritten every active frame
    pub position: Vec3,
    pub rotation_z: f32,
    pub visible: bool,

    /// Shader time for this layer (global time plus phase offset).
    pub time: f32,
    pub camera_position: Vec3,

    renderable: Option<RenderableId>,
}

impl AuroraLayer {
    pub fn renderable(&self) -> Option<RenderableId> {
        self.renderable
    }
}

pub struct AuroraLayerSystem {
    config: AuroraConfig,
    layers: Vec<AuroraLayer>,
    time: f32,
    intensity: f32,
    active: bool,
    transition: Transition,
}

impl AuroraLayerSystem {
    /// Build `config.layer_count` ribbons and add them to the scene, hidden.
    pub fn new(config: AuroraConfig, scene: &mut dyn Scene) -> Self {
        let config = config.sanitize();
        let mut system = Self {
            intensity: config.intensity,
            config,
            layers: Vec::new(),
            time: 0.0,
            active: false,
            transition: Transition::Idle,
        };
        system.build_layers(scene);
        system
    }

    fn build_layers(&mut self, scene: &mut dyn Scene) {
        let count = self.config.layer_count.min(MAX_AURORA_LAYERS);
        for index in 0..count {
            let mesh = build_ribbon(index, &self.config.palette);
            let render_order = RENDER_ORDER_BASE + index as u32;
            let id = scene.add(Renderable::Ribbon { mesh: &mesh, render_order });
            self.layers.push(AuroraLayer {
                index,
                phase_offset: index as f32 * PHASE_STEP,
                mesh,
                render_order,
                position: Vec3::new(0.0, 0.0, layer_depth(index)),
                rotation_z: 0.0,
                visible: self.active,
                time: 0.0,
                camera_position: Vec3::ZERO,
                renderable: Some(id),
            });
        }
        debug!("aurora: built {} layers", count);
    }

    pub fn update(&mut self, delta: f32, camera: &Camera) {
        let delta = clamp_delta(delta);

        let step = self.transition.advance(delta, self.intensity);
        if let Some(value) = step.intensity {
            self.intensity = config::clamp(value, INTENSITY_RANGE);
        }
        if step.faded {
            self.deactivate();
            self.intensity = self.config.intensity;
            debug!("aurora: fade complete");
        }

        if !self.active {
            return;
        }

        self.time += delta;
        let t = self.time;
        for layer in &mut self.layers {
            let phase = layer.phase_offset;
            layer.time = t + phase;
            layer.camera_position = camera.position;

            let parallax = PARALLAX_BASE + layer.index as f32 * PARALLAX_STEP;
            layer.position = Vec3::new(
                camera.position.x * parallax,
                (t * BOB_RATE + phase).sin() * BOB_HEIGHT,
                camera.position.z * DEPTH_FOLLOW + layer_depth(layer.index),
            );
            layer.rotation_z = (t * WOBBLE_RATE + phase).sin() * WOBBLE_ANGLE;
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        for layer in &mut self.layers {
            layer.visible = true;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        for layer in &mut self.layers {
            layer.visible = false;
        }
    }

    /// Direct write. Cancels any running storm or fade.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.transition = Transition::Idle;
        self.intensity = config::clamp(intensity, INTENSITY_RANGE);
    }

    /// Colour is baked into the vertices, so this tears every layer down
    /// and rebuilds it.
    pub fn set_colors(&mut self, palette: Palette, scene: &mut dyn Scene) {
        self.dispose(scene);
        self.config.palette = palette;
        self.build_layers(scene);
    }

    /// Ramp to the storm peak, hold, then fade out.
    pub fn trigger_storm(&mut self) {
        self.activate();
        self.transition = Transition::storm(self.intensity);
        info!("aurora: storm from intensity {:.2}", self.intensity);
    }

    /// Ramp to zero, then hide and restore the default intensity.
    pub fn fade_out(&mut self) {
        self.transition = Transition::fade(self.intensity);
    }

    /// Remove every layer from the scene. Safe to repeat.
    pub fn dispose(&mut self, scene: &mut dyn Scene) {
        for layer in self.layers.drain(..) {
            if let Some(id) = layer.renderable {
                scene.remove(id);
            }
        }
    }

    pub fn uniforms(&self, layer: &AuroraLayer) -> AuroraUniforms {
        AuroraUniforms {
            time: layer.time,
            intensity: self.intensity,
            wave: self.wave_params(),
            camera_position: layer.camera_position,
            fade_distance: self.config.fade_distance,
        }
    }

    pub fn wave_params(&self) -> WaveParams {
        WaveParams {
            speed: self.config.wave_speed,
            height: self.config.wave_height,
            frequency: self.config.wave_frequency,
        }
    }

    pub fn layers(&self) -> &[AuroraLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    pub fn palette(&self) -> Palette {
        self.config.palette
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}
