// weather/ - Weather controller
//
// Single owner of the precipitation pools, the aurora, lightning and audio.
// Setters cascade into whichever subsystems currently exist; the weather
// type decides which pools exist at all.

mod lightning;
mod params;

pub use lightning::{FLASH_COLOR, FLASH_DECAY, FLASH_DISTANCE, Lightning, flash_probability};
pub use params::{
    AMBIENT_COLOR, Atmosphere, DIRECTIONAL_COLOR, FOG_COLOR, PrecipitationType, WeatherParameters, resolve,
};

use log::{debug, info};

use crate::audio::{AudioBackend, StormAudio};
use crate::config::{
    self, HUMIDITY_RANGE, INTENSITY_RANGE, MAX_PARTICLES, TEMPERATURE_RANGE, VISIBILITY_RANGE, WIND_RANGE,
    WeatherConfig,
};
use crate::rng::RandomSource;
use crate::scene::{Camera, FrameClock, Scene};
use crate::sim::{Bounds, ParticleField, Rain, RainField, SLEET_SLOWDOWN, Snow, SnowField};
use crate::sky::{AuroraLayerSystem, Palette};

/// Rain pool size changes smaller than this keep the current pool.
const RAIN_REALLOCATE_THRESHOLD: usize = 1000;

pub struct WeatherController<B: AudioBackend> {
    config: WeatherConfig,
    params: WeatherParameters,
    atmosphere: Atmosphere,
    bounds: Bounds,

    // What the user asked for, and what it resolved to
    requested: PrecipitationType,
    active: PrecipitationType,

    rain: Option<RainField>,
    snow: Option<SnowField>,
    aurora: AuroraLayerSystem,
    lightning: Lightning,
    audio: StormAudio<B>,

    clock: FrameClock,
    rng: Box<dyn RandomSource>,
}

impl<B: AudioBackend> WeatherController<B> {
    pub fn new(config: WeatherConfig, backend: B, rng: Box<dyn RandomSource>, scene: &mut dyn Scene) -> Self {
        let config = config.sanitize();
        let params = WeatherParameters::from_config(&config);
        let requested = config.precipitation_type;

        let mut controller = Self {
            atmosphere: Atmosphere::from_visibility(params.visibility),
            bounds: Bounds::sky(),
            requested,
            active: PrecipitationType::None,
            rain: None,
            snow: None,
            aurora: AuroraLayerSystem::new(config.aurora.clone(), scene),
            lightning: Lightning::new(config.flash_frequency),
            audio: StormAudio::new(backend),
            clock: FrameClock::new(),
            rng,
            params,
            config,
        };
        controller.switch_weather_type(requested, scene);
        info!("Weather controller ready: {} ({})", controller.requested, controller.active);
        controller
    }

    /// Select a weather type. `Auto` resolves from temperature and humidity
    /// now and again whenever either changes.
    pub fn switch_weather_type(&mut self, target: PrecipitationType, scene: &mut dyn Scene) {
        self.requested = target;
        let concrete = target.concrete(self.params.temperature, self.params.humidity);
        self.apply(concrete, scene);
    }

    fn apply(&mut self, concrete: PrecipitationType, scene: &mut dyn Scene) {
        if concrete != self.active {
            info!("Weather: {} -> {}", self.active, concrete);
        }
        self.active = concrete;

        // Release before allocating
        if !concrete.has_snow() {
            if let Some(mut snow) = self.snow.take() {
                snow.dispose(scene);
            }
        }
        if !concrete.has_rain() {
            if let Some(mut rain) = self.rain.take() {
                rain.dispose(scene);
            }
        }

        if concrete.has_rain() && self.rain.is_none() {
            self.rain = Some(self.allocate_rain(self.config.rain_count, scene));
        }
        if concrete.has_snow() && self.snow.is_none() {
            let capacity = if concrete == PrecipitationType::Mixed {
                self.config.snow_count / 2
            } else {
                self.config.snow_count
            };
            self.snow = Some(self.allocate_snow(capacity, scene));
        }
    }

    fn allocate_rain(&mut self, capacity: usize, scene: &mut dyn Scene) -> RainField {
        let mut rain = ParticleField::new(Rain, capacity, self.bounds, self.rng.as_mut());
        rain.set_intensity(self.config.rain_intensity);
        rain.set_wind_strength(self.params.wind_strength);
        rain.set_fall_speed(self.rain_fall_speed());
        rain.attach(scene, &self.params);
        rain
    }

    fn allocate_snow(&mut self, capacity: usize, scene: &mut dyn Scene) -> SnowField {
        let mut snow = ParticleField::new(Snow::new(), capacity, self.bounds, self.rng.as_mut());
        snow.set_intensity(self.config.snow_intensity);
        snow.set_wind_strength(self.params.wind_strength);
        snow.set_fall_speed(self.config.snow_fall_speed);
        snow.attach(scene, &self.params);
        snow
    }

    fn rain_fall_speed(&self) -> f32 {
        if self.params.is_sleet() {
            self.config.rain_speed * SLEET_SLOWDOWN
        } else {
            self.config.rain_speed
        }
    }

    /// One frame. `delta` is in seconds and is clamped.
    pub fn update(&mut self, delta: f32, camera: &Camera) {
        let delta = self.clock.tick(delta);
        let rng = self.rng.as_mut();

        if let Some(rain) = &mut self.rain {
            rain.update(delta, rng);
        }
        if let Some(snow) = &mut self.snow {
            snow.update(delta, rng);
        }
        self.aurora.update(delta, camera);

        let due = self.lightning.update(delta, rng);
        for _ in 0..due {
            self.audio.play_thunder(rng);
        }

        self.audio.backend_mut().tick(delta as f64);
        self.audio.collect_finished();
    }

    pub fn set_temperature(&mut self, temperature: f32, scene: &mut dyn Scene) {
        self.params.temperature = config::clamp(temperature, TEMPERATURE_RANGE);
        self.config.temperature = self.params.temperature;
        self.refresh_auto(scene);
        let speed = self.rain_fall_speed();
        if let Some(rain) = &mut self.rain {
            rain.set_fall_speed(speed);
        }
    }

    pub fn set_humidity(&mut self, humidity: f32, scene: &mut dyn Scene) {
        self.params.humidity = config::clamp(humidity, HUMIDITY_RANGE);
        self.config.humidity = self.params.humidity;
        self.refresh_auto(scene);
    }

    fn refresh_auto(&mut self, scene: &mut dyn Scene) {
        if self.requested == PrecipitationType::Auto {
            self.apply(resolve(self.params.temperature, self.params.humidity), scene);
        }
    }

    pub fn set_visibility(&mut self, visibility: f32) {
        self.params.visibility = config::clamp(visibility, VISIBILITY_RANGE);
        self.config.visibility = self.params.visibility;
        self.atmosphere = Atmosphere::from_visibility(self.params.visibility);
    }

    pub fn set_wind_strength(&mut self, strength: f32) {
        self.params.wind_strength = config::clamp(strength, WIND_RANGE);
        self.config.wind_strength = self.params.wind_strength;
        if let Some(rain) = &mut self.rain {
            rain.set_wind_strength(self.params.wind_strength);
        }
        if let Some(snow) = &mut self.snow {
            snow.set_wind_strength(self.params.wind_strength);
        }
    }

    pub fn set_rain_speed(&mut self, speed: f32) {
        self.config.rain_speed = config::non_negative(speed);
        let speed = self.rain_fall_speed();
        if let Some(rain) = &mut self.rain {
            rain.set_fall_speed(speed);
        }
    }

    pub fn set_rain_intensity(&mut self, intensity: f32) {
        self.config.rain_intensity = config::clamp(intensity, INTENSITY_RANGE);
        if let Some(rain) = &mut self.rain {
            rain.set_intensity(self.config.rain_intensity);
        }
    }

    /// Store the new rain count. A live pool is rebuilt only when the count
    /// moves by more than a thousand.
    pub fn set_rain_count(&mut self, count: usize, scene: &mut dyn Scene) {
        let count = count.min(MAX_PARTICLES);
        self.config.rain_count = count;

        let Some(current) = self.rain.as_ref().map(|r| r.len()) else { return };
        if current.abs_diff(count) <= RAIN_REALLOCATE_THRESHOLD {
            return;
        }
        if let Some(mut old) = self.rain.take() {
            old.dispose(scene);
        }
        debug!("Rain pool resized {} -> {}", current, count);
        self.rain = Some(self.allocate_rain(count, scene));
    }

    /// Takes effect at the next snow allocation.
    pub fn set_snow_count(&mut self, count: usize) {
        self.config.snow_count = count.min(MAX_PARTICLES);
    }

    pub fn set_snow_intensity(&mut self, intensity: f32) {
        self.config.snow_intensity = config::clamp(intensity, INTENSITY_RANGE);
        if let Some(snow) = &mut self.snow {
            snow.set_intensity(self.config.snow_intensity);
        }
    }

    pub fn set_snow_fall_speed(&mut self, speed: f32) {
        self.config.snow_fall_speed = config::non_negative(speed);
        if let Some(snow) = &mut self.snow {
            snow.set_fall_speed(self.config.snow_fall_speed);
        }
    }

    pub fn set_flash_frequency(&mut self, frequency: f32) {
        self.config.flash_frequency = config::clamp(frequency, (0.0, 1.0));
        self.lightning.set_frequency(self.config.flash_frequency);
    }

    // Aurora

    pub fn activate_aurora(&mut self) {
        self.aurora.activate();
    }

    pub fn deactivate_aurora(&mut self) {
        self.aurora.deactivate();
    }

    pub fn set_aurora_intensity(&mut self, intensity: f32) {
        self.aurora.set_intensity(intensity);
    }

    pub fn set_aurora_colors(&mut self, palette: Palette, scene: &mut dyn Scene) {
        self.config.aurora.palette = palette;
        self.aurora.set_colors(palette, scene);
    }

    pub fn trigger_aurora_storm(&mut self) {
        self.aurora.trigger_storm();
    }

    pub fn fade_out_aurora(&mut self) {
        self.aurora.fade_out();
    }

    // Audio

    /// First call opens audio (needs a user gesture in browsers); later
    /// calls mute and unmute.
    pub fn toggle_audio(&mut self) {
        self.audio.toggle(self.rng.as_mut());
    }

    /// Release every pool, the aurora and the audio context. Safe to repeat.
    pub fn dispose(&mut self, scene: &mut dyn Scene) {
        if let Some(mut rain) = self.rain.take() {
            rain.dispose(scene);
        }
        if let Some(mut snow) = self.snow.take() {
            snow.dispose(scene);
        }
        self.aurora.dispose(scene);
        self.audio.dispose();
        self.active = PrecipitationType::None;
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn params(&self) -> &WeatherParameters {
        &self.params
    }

    pub fn atmosphere(&self) -> Atmosphere {
        self.atmosphere
    }

    pub fn requested_type(&self) -> PrecipitationType {
        self.requested
    }

    pub fn active_type(&self) -> PrecipitationType {
        self.active
    }

    pub fn rain(&self) -> Option<&RainField> {
        self.rain.as_ref()
    }

    pub fn snow(&self) -> Option<&SnowField> {
        self.snow.as_ref()
    }

    pub fn aurora(&self) -> &AuroraLayerSystem {
        &self.aurora
    }

    pub fn lightning(&self) -> &Lightning {
        &self.lightning
    }

    pub fn audio(&self) -> &StormAudio<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut StormAudio<B> {
        &mut self.audio
    }

    pub fn clock(&self) -> FrameClock {
        self.clock
    }
}
