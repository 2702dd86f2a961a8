// config.rs - Weather configuration
//
// Mirrors the control panel's knobs. Everything is optional in JSON; missing
// fields fall back to the defaults below, and out-of-range values are
// clamped rather than rejected.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::sky::Palette;
use crate::weather::PrecipitationType;

pub const TEMPERATURE_RANGE: (f32, f32) = (-20.0, 45.0);
pub const HUMIDITY_RANGE: (f32, f32) = (0.0, 100.0);
pub const VISIBILITY_RANGE: (f32, f32) = (10.0, 100.0);
pub const WIND_RANGE: (f32, f32) = (0.0, 2.0);
pub const INTENSITY_RANGE: (f32, f32) = (0.0, 1.5);
pub const MAX_PARTICLES: usize = 100_000;
pub const MAX_AURORA_LAYERS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeatherConfig {
    #[serde(deserialize_with = "particle_count")]
    pub rain_count: usize,
    pub rain_speed: f32,
    pub rain_intensity: f32,
    #[serde(deserialize_with = "particle_count")]
    pub snow_count: usize,
    pub snow_intensity: f32,
    pub snow_fall_speed: f32,
    pub wind_strength: f32,

    pub temperature: f32,
    pub humidity: f32,
    pub visibility: f32,

    pub flash_frequency: f32,
    pub precipitation_type: PrecipitationType,

    pub aurora: AuroraConfig,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            rain_count: 15_000,
            rain_speed: 0.5,
            rain_intensity: 1.0,
            snow_count: 5_000,
            snow_intensity: 1.0,
            snow_fall_speed: 0.3,
            wind_strength: 0.5,
            temperature: 20.0,
            humidity: 60.0,
            visibility: 100.0,
            flash_frequency: 0.07,
            precipitation_type: PrecipitationType::Rain,
            aurora: AuroraConfig::default(),
        }
    }
}

impl WeatherConfig {
    /// Parse a (possibly partial) JSON object and clamp it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WeatherConfig = serde_json::from_str(json)?;
        Ok(config.sanitize())
    }

    pub fn sanitize(mut self) -> Self {
        self.rain_count = self.rain_count.min(MAX_PARTICLES);
        self.snow_count = self.snow_count.min(MAX_PARTICLES);
        self.rain_speed = non_negative(self.rain_speed);
        self.snow_fall_speed = non_negative(self.snow_fall_speed);
        self.rain_intensity = clamp(self.rain_intensity, INTENSITY_RANGE);
        self.snow_intensity = clamp(self.snow_intensity, INTENSITY_RANGE);
        self.wind_strength = clamp(self.wind_strength, WIND_RANGE);
        self.temperature = clamp(self.temperature, TEMPERATURE_RANGE);
        self.humidity = clamp(self.humidity, HUMIDITY_RANGE);
        self.visibility = clamp(self.visibility, VISIBILITY_RANGE);
        self.flash_frequency = clamp(self.flash_frequency, (0.0, 1.0));
        self.aurora = self.aurora.sanitize();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuroraConfig {
    pub intensity: f32,
    pub wave_speed: f32,
    pub wave_height: f32,
    pub wave_frequency: f32,
    pub fade_distance: f32,
    #[serde(deserialize_with = "layer_count")]
    pub layer_count: usize,
    pub palette: Palette,
}

impl Default for AuroraConfig {
    fn default() -> Self {
        Self {
            intensity: 0.8,
            wave_speed: 0.3,
            wave_height: 200.0,
            wave_frequency: 0.01,
            fade_distance: 1500.0,
            layer_count: 3,
            palette: Palette::rainbow(),
        }
    }
}

impl AuroraConfig {
    pub fn sanitize(mut self) -> Self {
        self.intensity = clamp(self.intensity, INTENSITY_RANGE);
        self.wave_speed = non_negative(self.wave_speed);
        self.wave_height = non_negative(self.wave_height);
        self.wave_frequency = non_negative(self.wave_frequency);
        self.fade_distance = if self.fade_distance.is_finite() { self.fade_distance.max(1.0) } else { 1.0 };
        self.layer_count = self.layer_count.min(MAX_AURORA_LAYERS);
        self
    }
}

// Counts arrive from sliders as plain numbers; negatives and fractions clamp.
fn clamped_count<'de, D: Deserializer<'de>>(deserializer: D, max: usize) -> Result<usize, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(if raw.is_finite() { raw.clamp(0.0, max as f64) as usize } else { 0 })
}

fn particle_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    clamped_count(deserializer, MAX_PARTICLES)
}

fn layer_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    clamped_count(deserializer, MAX_AURORA_LAYERS)
}

/// Clamp into `range`, mapping NaN to the lower bound.
#[inline]
pub fn clamp(value: f32, range: (f32, f32)) -> f32 {
    if value.is_nan() { range.0 } else { value.clamp(range.0, range.1) }
}

#[inline]
pub fn non_negative(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
