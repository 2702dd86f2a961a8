// render.rs - Encode per-frame state to a flat uniform buffer
//
// Output layout (f32 throughout, read by the host as a Float32Array):
//   FrameHeader                     HEADER_FLOATS
//   PointsBlock (rain)              POINTS_FLOATS, zeroed when absent
//   PointsBlock (snow)              POINTS_FLOATS, zeroed when absent
//   LayerUniforms x aurora layers   LAYER_FLOATS each
//
// Particle positions and scales are not copied; the host reads them in place
// through the pool pointers.

use bytemuck::{Pod, Zeroable};

use crate::audio::AudioBackend;
use crate::sim::{ForceModel, ParticleField};
use crate::sky::{AuroraLayer, AuroraLayerSystem, Color};
use crate::weather::{
    AMBIENT_COLOR, DIRECTIONAL_COLOR, FLASH_COLOR, FLASH_DECAY, FLASH_DISTANCE, FOG_COLOR, WeatherController,
    WeatherParameters,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct FrameHeader {
    pub elapsed: f32,
    pub delta: f32,
    pub flash_power: f32,
    pub flash_position: [f32; 3],
    pub flash_color: [f32; 3],
    pub flash_distance: f32,
    pub flash_decay: f32,
    pub ambient: f32,
    pub ambient_color: [f32; 3],
    pub directional: f32,
    pub directional_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub fog_color: [f32; 3],
    pub aurora_intensity: f32,
    pub aurora_layers: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointsBlock {
    pub color: [f32; 3],
    pub size: f32,
    pub opacity: f32,
    pub additive: f32,
    pub rotation_y: f32,
    pub count: f32,
}

/// Laid out as the `Aurora` uniform struct in aurora.wgsl (std140 rules:
/// each vec3 starts on a 16-byte boundary).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LayerUniforms {
    pub time: f32,
    pub intensity: f32,
    pub wave_speed: f32,
    pub wave_height: f32,
    pub wave_frequency: f32,
    pub fade_distance: f32,
    pub _pad0: [f32; 2],
    pub camera_position: [f32; 3],
    pub rotation_z: f32,
    pub position: [f32; 3],
    pub visible: f32,
    pub render_order: f32,
    pub _pad1: [f32; 3],
}

pub const HEADER_FLOATS: usize = size_of::<FrameHeader>() / 4;
pub const POINTS_FLOATS: usize = size_of::<PointsBlock>() / 4;
pub const LAYER_FLOATS: usize = size_of::<LayerUniforms>() / 4;

#[derive(Debug, Default)]
pub struct Encoder {
    out: Vec<f32>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.out.clear();
    }

    pub fn ptr(&self) -> *const f32 {
        self.out.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.out
    }

    /// Rewrite the buffer from the controller's current state.
    pub fn encode<B: AudioBackend>(&mut self, weather: &WeatherController<B>) {
        self.out.clear();

        let clock = weather.clock();
        let flash = weather.lightning();
        let atmosphere = weather.atmosphere();
        let aurora = weather.aurora();
        self.push(FrameHeader {
            elapsed: clock.elapsed,
            delta: clock.delta,
            flash_power: flash.power(),
            flash_position: flash.position().to_array(),
            flash_color: Color::from_hex(FLASH_COLOR).to_array(),
            flash_distance: FLASH_DISTANCE,
            flash_decay: FLASH_DECAY,
            ambient: atmosphere.ambient,
            ambient_color: Color::from_hex(AMBIENT_COLOR).to_array(),
            directional: atmosphere.directional,
            directional_color: Color::from_hex(DIRECTIONAL_COLOR).to_array(),
            fog_near: atmosphere.fog_near,
            fog_far: atmosphere.fog_far,
            fog_color: Color::from_hex(FOG_COLOR).to_array(),
            aurora_intensity: aurora.intensity(),
            aurora_layers: aurora.layer_count() as f32,
        });

        let params = weather.params();
        self.push(weather.rain().map(|f| points(f, params)).unwrap_or_default());
        self.push(weather.snow().map(|f| points(f, params)).unwrap_or_default());

        for layer in aurora.layers() {
            self.push(layer_uniforms(aurora, layer));
        }
    }

    fn push<T: Pod>(&mut self, block: T) {
        self.out.extend_from_slice(bytemuck::cast_slice(&[block]));
    }
}

fn points<M: ForceModel>(field: &ParticleField<M>, params: &WeatherParameters) -> PointsBlock {
    let style = field.style(params);
    PointsBlock {
        color: Color::from_hex(style.color).to_array(),
        size: style.size,
        opacity: style.opacity,
        additive: if style.additive { 1.0 } else { 0.0 },
        rotation_y: field.rotation_y(),
        count: field.len() as f32,
    }
}

fn layer_uniforms(aurora: &AuroraLayerSystem, layer: &AuroraLayer) -> LayerUniforms {
    let u = aurora.uniforms(layer);
    LayerUniforms {
        time: u.time,
        intensity: u.intensity,
        wave_speed: u.wave.speed,
        wave_height: u.wave.height,
        wave_frequency: u.wave.frequency,
        fade_distance: u.fade_distance,
        camera_position: u.camera_position.to_array(),
        rotation_z: layer.rotation_z,
        position: layer.position.to_array(),
        visible: if layer.visible { 1.0 } else { 0.0 },
        render_order: layer.render_order as f32,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use std::mem::offset_of;

    use super::*;
    use crate::audio::MemoryAudio;
    use crate::sky::AURORA_WGSL;
    use crate::config::WeatherConfig;
    use crate::rng::Xorshift32;
    use crate::scene::{Camera, MemoryScene};
    use crate::weather::PrecipitationType;

    fn weather(kind: PrecipitationType, scene: &mut MemoryScene) -> WeatherController<MemoryAudio> {
        let config = WeatherConfig {
            rain_count: 300,
            snow_count: 200,
            precipitation_type: kind,
            ..Default::default()
        };
        WeatherController::new(config, MemoryAudio::new(), Box::new(Xorshift32::new(3)), scene)
    }

    fn header(out: &[f32]) -> FrameHeader {
        bytemuck::cast_slice::<f32, FrameHeader>(&out[..HEADER_FLOATS])[0]
    }

    fn block(out: &[f32], i: usize) -> PointsBlock {
        let start = HEADER_FLOATS + i * POINTS_FLOATS;
        bytemuck::cast_slice::<f32, PointsBlock>(&out[start..start + POINTS_FLOATS])[0]
    }

    #[test]
    fn block_sizes_are_whole_floats() {
        assert_eq!(size_of::<FrameHeader>() % 4, 0);
        assert_eq!(size_of::<PointsBlock>(), POINTS_FLOATS * 4);
        assert_eq!(LAYER_FLOATS, 20);
    }

    #[test]
    fn layer_uniforms_follow_wgsl_alignment() {
        assert_eq!(offset_of!(LayerUniforms, camera_position), 32);
        assert_eq!(offset_of!(LayerUniforms, rotation_z), 44);
        assert_eq!(offset_of!(LayerUniforms, position), 48);
        assert_eq!(offset_of!(LayerUniforms, render_order), 64);
        assert_eq!(size_of::<LayerUniforms>() % 16, 0);
    }

    #[test]
    fn layer_uniforms_match_shader_struct() {
        let start = AURORA_WGSL.find("struct Aurora {").unwrap();
        let body = &AURORA_WGSL[start..];
        let body = &body[..body.find("};").unwrap()];
        let fields: Vec<&str> = body
            .lines()
            .skip(1)
            .filter_map(|l| l.trim().split(':').next())
            .filter(|name| !name.is_empty())
            .collect();
        assert_eq!(
            fields,
            [
                "time",
                "intensity",
                "wave_speed",
                "wave_height",
                "wave_frequency",
                "fade_distance",
                "_pad0",
                "camera_position",
                "rotation_z",
                "position",
                "visible",
                "render_order",
                "_pad1",
                "_pad2",
                "_pad3",
            ]
        );
    }

    #[test]
    fn header_carries_light_colors() {
        let mut scene = MemoryScene::new();
        let weather = weather(PrecipitationType::None, &mut scene);
        let mut encoder = Encoder::new();
        encoder.encode(&weather);
        let h = header(encoder.as_slice());
        assert_eq!(h.flash_color, Color::from_hex(FLASH_COLOR).to_array());
        assert_eq!(h.flash_distance, FLASH_DISTANCE);
        assert_eq!(h.flash_decay, FLASH_DECAY);
        assert_eq!(h.fog_color, Color::from_hex(FOG_COLOR).to_array());
        assert_eq!(h.ambient_color, Color::from_hex(AMBIENT_COLOR).to_array());
        assert_eq!(h.directional_color, Color::from_hex(DIRECTIONAL_COLOR).to_array());
    }

    #[test]
    fn layout_matches_subsystems() {
        let mut scene = MemoryScene::new();
        let mut weather = weather(PrecipitationType::Rain, &mut scene);
        weather.activate_aurora();
        weather.update(1.0 / 60.0, &Camera::at(Vec3::new(10.0, 0.0, 5.0)));

        let mut encoder = Encoder::new();
        encoder.encode(&weather);
        let out = encoder.as_slice();
        assert_eq!(out.len(), HEADER_FLOATS + 2 * POINTS_FLOATS + 3 * LAYER_FLOATS);

        let h = header(out);
        assert_eq!(h.aurora_layers, 3.0);
        assert!((h.delta - 1.0 / 60.0).abs() < 1e-6);

        let rain = block(out, 0);
        assert_eq!(rain.count, 300.0);
        assert_eq!(rain.additive, 0.0);
        assert!(rain.rotation_y > 0.0);
        // Snow absent
        assert_eq!(block(out, 1), PointsBlock::default());

        let first = HEADER_FLOATS + 2 * POINTS_FLOATS;
        let layer = bytemuck::cast_slice::<f32, LayerUniforms>(&out[first..first + LAYER_FLOATS])[0];
        assert_eq!(layer.render_order, 1000.0);
        assert_eq!(layer.visible, 1.0);
        assert_eq!(layer.camera_position, [10.0, 0.0, 5.0]);
    }

    #[test]
    fn encoding_twice_does_not_grow() {
        let mut scene = MemoryScene::new();
        let weather = weather(PrecipitationType::Mixed, &mut scene);
        let mut encoder = Encoder::new();
        encoder.encode(&weather);
        let len = encoder.len();
        encoder.encode(&weather);
        assert_eq!(encoder.len(), len);
        assert_eq!(block(encoder.as_slice(), 1).additive, 1.0);
    }
}
