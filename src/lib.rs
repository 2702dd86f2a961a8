use wasm_bindgen::prelude::*;

pub mod audio;
pub mod config;
pub mod error;
pub mod render;
pub mod rng;
pub mod scene;
pub mod sim;
pub mod sky;
pub mod weather;

pub use config::{AuroraConfig, WeatherConfig};
pub use error::{AudioError, ConfigError};
pub use scene::{Camera, MemoryScene, Renderable, RenderableId, Scene};
pub use weather::{PrecipitationType, WeatherController, WeatherParameters};

use glam::Vec3;
use js_sys::{Float32Array, Function, Object, Reflect, Uint32Array};
use log::warn;

use render::Encoder;
use sim::ForceModel;
use sky::Palette;

#[cfg(target_arch = "wasm32")]
type HostAudio = audio::WebAudio;
#[cfg(not(target_arch = "wasm32"))]
type HostAudio = audio::MemoryAudio;

// ============================================================================
// JS SCENE - Forwards add/remove to three.js-side callbacks
// ============================================================================

struct JsScene {
    on_add: Function,
    on_remove: Function,
    next_id: u32,
}

impl JsScene {
    fn new(on_add: Function, on_remove: Function) -> Self {
        Self { on_add, on_remove, next_id: 0 }
    }
}

impl Scene for JsScene {
    fn add(&mut self, renderable: Renderable<'_>) -> RenderableId {
        self.next_id += 1;
        let id = RenderableId(self.next_id);
        let kind = JsValue::from_str(renderable.kind().as_str());
        if let Err(e) = self.on_add.call3(&JsValue::NULL, &JsValue::from(id.0), &kind, &payload(&renderable)) {
            warn!("onAdd({}) threw: {:?}", id.0, e);
        }
        id
    }

    fn remove(&mut self, id: RenderableId) {
        if let Err(e) = self.on_remove.call1(&JsValue::NULL, &JsValue::from(id.0)) {
            warn!("onRemove({}) threw: {:?}", id.0, e);
        }
    }
}

fn set(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

/// Plain object describing a renderable. Ribbon geometry is copied; point
/// buffers are read through the world's pointers instead.
fn payload(renderable: &Renderable<'_>) -> JsValue {
    let obj = Object::new();
    match renderable {
        Renderable::Points { positions, style, texture, .. } => {
            set(&obj, "count", JsValue::from((positions.len() / 3) as u32));
            set(&obj, "color", JsValue::from(style.color));
            set(&obj, "size", JsValue::from(style.size));
            set(&obj, "opacity", JsValue::from(style.opacity));
            set(&obj, "additive", JsValue::from(style.additive));
            set(&obj, "textured", JsValue::from(texture.is_some()));
        }
        Renderable::Ribbon { mesh, render_order } => {
            set(&obj, "positions", Float32Array::from(&mesh.positions[..]).into());
            set(&obj, "uvs", Float32Array::from(&mesh.uvs[..]).into());
            set(&obj, "colors", Float32Array::from(&mesh.colors[..]).into());
            set(&obj, "indices", Uint32Array::from(&mesh.indices[..]).into());
            set(&obj, "renderOrder", JsValue::from(*render_order));
        }
    }
    obj.into()
}

// ============================================================================
// WEATHER WORLD - Browser entry point
// ============================================================================

#[wasm_bindgen]
pub struct WeatherWorld {
    scene: JsScene,
    weather: WeatherController<HostAudio>,
    encoder: Encoder,
    camera: Camera,
}

#[wasm_bindgen]
impl WeatherWorld {
    /// `config_json` may be empty or a partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, on_add: Function, on_remove: Function) -> Result<WeatherWorld, JsValue> {
        let config = if config_json.trim().is_empty() {
            WeatherConfig::default()
        } else {
            WeatherConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let mut scene = JsScene::new(on_add, on_remove);
        let weather = WeatherController::new(config, HostAudio::new(), rng::entropy(), &mut scene);
        let mut world = Self { scene, weather, encoder: Encoder::new(), camera: Camera::default() };
        world.encoder.encode(&world.weather);
        Ok(world)
    }

    #[wasm_bindgen(js_name = initLogging)]
    pub fn init_logging() {
        #[cfg(target_arch = "wasm32")]
        {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);
        }
    }

    /// Advance one frame (`delta` in seconds) and refresh the frame buffer.
    pub fn tick(&mut self, delta: f32, cam_x: f32, cam_y: f32, cam_z: f32) {
        self.camera = Camera::at(Vec3::new(cam_x, cam_y, cam_z));
        self.weather.update(delta, &self.camera);
        self.encoder.encode(&self.weather);
    }

    /// One of `auto`, `rain`, `snow`, `mixed`, `none`. Anything else means `none`.
    #[wasm_bindgen(js_name = switchWeatherType)]
    pub fn switch_weather_type(&mut self, kind: &str) {
        let target = kind.parse().unwrap_or_else(|e| {
            warn!("{}; using none", e);
            PrecipitationType::None
        });
        self.weather.switch_weather_type(target, &mut self.scene);
    }

    pub fn active_weather_type(&self) -> String {
        self.weather.active_type().to_string()
    }

    pub fn set_temperature(&mut self, celsius: f32) {
        self.weather.set_temperature(celsius, &mut self.scene);
    }

    pub fn set_humidity(&mut self, percent: f32) {
        self.weather.set_humidity(percent, &mut self.scene);
    }

    pub fn set_visibility(&mut self, visibility: f32) {
        self.weather.set_visibility(visibility);
    }

    pub fn set_wind_strength(&mut self, strength: f32) {
        self.weather.set_wind_strength(strength);
    }

    pub fn set_rain_speed(&mut self, speed: f32) {
        self.weather.set_rain_speed(speed);
    }

    pub fn set_rain_intensity(&mut self, intensity: f32) {
        self.weather.set_rain_intensity(intensity);
    }

    pub fn set_rain_count(&mut self, count: f64) {
        self.weather.set_rain_count(count_from_js(count), &mut self.scene);
    }

    pub fn set_snow_count(&mut self, count: f64) {
        self.weather.set_snow_count(count_from_js(count));
    }

    pub fn set_snow_intensity(&mut self, intensity: f32) {
        self.weather.set_snow_intensity(intensity);
    }

    pub fn set_snow_fall_speed(&mut self, speed: f32) {
        self.weather.set_snow_fall_speed(speed);
    }

    pub fn set_flash_frequency(&mut self, frequency: f32) {
        self.weather.set_flash_frequency(frequency);
    }

    pub fn activate_aurora(&mut self) {
        self.weather.activate_aurora();
    }

    pub fn deactivate_aurora(&mut self) {
        self.weather.deactivate_aurora();
    }

    pub fn set_aurora_intensity(&mut self, intensity: f32) {
        self.weather.set_aurora_intensity(intensity);
    }

    pub fn set_aurora_colors(&mut self, primary: u32, secondary: u32, tertiary: u32) {
        self.weather.set_aurora_colors(Palette::new(primary, secondary, tertiary), &mut self.scene);
    }

    /// Returns false for an unknown preset name.
    pub fn set_aurora_preset(&mut self, name: &str) -> bool {
        match Palette::preset(name) {
            Some(palette) => {
                self.weather.set_aurora_colors(palette, &mut self.scene);
                true
            }
            None => false,
        }
    }

    pub fn trigger_aurora_storm(&mut self) {
        self.weather.trigger_aurora_storm();
    }

    pub fn fade_out_aurora(&mut self) {
        self.weather.fade_out_aurora();
    }

    /// Call from a user gesture the first time.
    pub fn toggle_audio(&mut self) {
        self.weather.toggle_audio();
    }

    pub fn audio_muted(&self) -> bool {
        self.weather.audio().is_muted()
    }

    pub fn dispose(&mut self) {
        self.weather.dispose(&mut self.scene);
    }

    // Accessors for WASM
    pub fn frame_ptr(&self) -> *const f32 { self.encoder.ptr() }
    pub fn frame_len(&self) -> usize { self.encoder.len() }

    pub fn rain_positions_ptr(&self) -> *const f32 {
        self.weather.rain().map_or(std::ptr::null(), |r| r.positions_ptr())
    }
    pub fn rain_scales_ptr(&self) -> *const f32 {
        self.weather.rain().map_or(std::ptr::null(), |r| r.scales_ptr())
    }
    pub fn rain_count(&self) -> usize { self.weather.rain().map_or(0, |r| r.len()) }

    pub fn snow_positions_ptr(&self) -> *const f32 {
        self.weather.snow().map_or(std::ptr::null(), |s| s.positions_ptr())
    }
    pub fn snow_scales_ptr(&self) -> *const f32 {
        self.weather.snow().map_or(std::ptr::null(), |s| s.scales_ptr())
    }
    pub fn snow_count(&self) -> usize { self.weather.snow().map_or(0, |s| s.len()) }

    /// RGBA8 snowflake sprite, square; null while no snow is falling.
    pub fn snow_texture_ptr(&self) -> *const u8 {
        self.weather
            .snow()
            .and_then(|s| s.model().texture())
            .map_or(std::ptr::null(), |t| t.rgba.as_ptr())
    }
    pub fn snow_texture_size(&self) -> u32 {
        self.weather.snow().and_then(|s| s.model().texture()).map_or(0, |t| t.width)
    }
}

/// WGSL for the aurora ribbons. Its `Aurora` uniform is one layer block of
/// the frame buffer.
#[wasm_bindgen]
pub fn aurora_shader() -> String {
    sky::AURORA_WGSL.to_string()
}

/// Slider values arrive as doubles; negatives and NaN become zero.
fn count_from_js(value: f64) -> usize {
    if value.is_finite() { value.max(0.0) as usize } else { 0 }
}
