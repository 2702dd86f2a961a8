// params.rs - Environmental parameters
//
// Temperature, humidity, wind and visibility, plus the precipitation type
// they select when the user asks for `auto`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{self, HUMIDITY_RANGE, TEMPERATURE_RANGE, VISIBILITY_RANGE, WIND_RANGE, WeatherConfig};
use crate::error::ConfigError;

// Auto resolution thresholds
const SNOW_BELOW: f32 = -2.0;
const MIXED_BELOW: f32 = 2.0;
const RAIN_HUMIDITY_ABOVE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationType {
    Auto,
    None,
    #[default]
    Rain,
    Snow,
    Mixed,
}

impl PrecipitationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipitationType::Auto => "auto",
            PrecipitationType::None => "none",
            PrecipitationType::Rain => "rain",
            PrecipitationType::Snow => "snow",
            PrecipitationType::Mixed => "mixed",
        }
    }

    /// The concrete type for the given conditions. Only `Auto` depends on them.
    pub fn concrete(self, temperature: f32, humidity: f32) -> Self {
        match self {
            PrecipitationType::Auto => resolve(temperature, humidity),
            other => other,
        }
    }

    pub fn has_rain(&self) -> bool {
        matches!(self, PrecipitationType::Rain | PrecipitationType::Mixed)
    }

    pub fn has_snow(&self) -> bool {
        matches!(self, PrecipitationType::Snow | PrecipitationType::Mixed)
    }
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrecipitationType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PrecipitationType::Auto),
            "none" => Ok(PrecipitationType::None),
            "rain" => Ok(PrecipitationType::Rain),
            "snow" => Ok(PrecipitationType::Snow),
            "mixed" => Ok(PrecipitationType::Mixed),
            _ => Err(ConfigError::UnknownPrecipitation(s.to_string())),
        }
    }
}

/// Precipitation implied by the conditions.
pub fn resolve(temperature: f32, humidity: f32) -> PrecipitationType {
    if temperature < SNOW_BELOW {
        PrecipitationType::Snow
    } else if temperature < MIXED_BELOW {
        PrecipitationType::Mixed
    } else if humidity > RAIN_HUMIDITY_ABOVE {
        PrecipitationType::Rain
    } else {
        PrecipitationType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherParameters {
    /// Celsius
    pub temperature: f32,
    /// Percent
    pub humidity: f32,
    pub wind_strength: f32,
    pub visibility: f32,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            humidity: 60.0,
            wind_strength: 0.5,
            visibility: 100.0,
        }
    }
}

impl WeatherParameters {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            temperature: config::clamp(config.temperature, TEMPERATURE_RANGE),
            humidity: config::clamp(config.humidity, HUMIDITY_RANGE),
            wind_strength: config::clamp(config.wind_strength, WIND_RANGE),
            visibility: config::clamp(config.visibility, VISIBILITY_RANGE),
        }
    }

    /// Below freezing, rain falls as sleet.
    pub fn is_sleet(&self) -> bool {
        self.temperature < 0.0
    }
}

pub const AMBIENT_COLOR: u32 = 0x0a1a2f;
pub const DIRECTIONAL_COLOR: u32 = 0x1e3d59;
pub const FOG_COLOR: u32 = 0x333333;

/// Scene lighting and fog derived from visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    pub ambient: f32,
    pub directional: f32,
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Atmosphere {
    pub fn from_visibility(visibility: f32) -> Self {
        let visibility = config::clamp(visibility, VISIBILITY_RANGE);
        let v = visibility / 100.0;
        Self {
            ambient: 0.3 + v * 0.7,
            directional: 0.5 + v * 0.5,
            fog_near: 50.0,
            fog_far: 1000.0 - visibility * 8.0,
        }
    }
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self::from_visibility(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_follows_thresholds() {
        for humidity in [0.0, 50.0, 100.0] {
            assert_eq!(resolve(-5.0, humidity), PrecipitationType::Snow);
            assert_eq!(resolve(0.0, humidity), PrecipitationType::Mixed);
        }
        assert_eq!(resolve(10.0, 50.0), PrecipitationType::Rain);
        assert_eq!(resolve(10.0, 10.0), PrecipitationType::None);
        // Boundaries are exclusive
        assert_eq!(resolve(-2.0, 0.0), PrecipitationType::Mixed);
        assert_eq!(resolve(2.0, 40.0), PrecipitationType::None);
    }

    #[test]
    fn only_auto_depends_on_conditions() {
        assert_eq!(PrecipitationType::Auto.concrete(-10.0, 0.0), PrecipitationType::Snow);
        assert_eq!(PrecipitationType::Rain.concrete(-10.0, 0.0), PrecipitationType::Rain);
        assert_eq!(PrecipitationType::None.concrete(30.0, 90.0), PrecipitationType::None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("Snow".parse::<PrecipitationType>().unwrap(), PrecipitationType::Snow);
        assert_eq!(" mixed ".parse::<PrecipitationType>().unwrap(), PrecipitationType::Mixed);
        assert!(matches!(
            "hail".parse::<PrecipitationType>(),
            Err(ConfigError::UnknownPrecipitation(s)) if s == "hail"
        ));
        let json: PrecipitationType = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(json, PrecipitationType::Auto);
    }

    #[test]
    fn pools_per_type() {
        assert!(PrecipitationType::Mixed.has_rain() && PrecipitationType::Mixed.has_snow());
        assert!(!PrecipitationType::Snow.has_rain());
        assert!(!PrecipitationType::Rain.has_snow());
        assert!(!PrecipitationType::None.has_rain() && !PrecipitationType::None.has_snow());
    }

    #[test]
    fn atmosphere_tracks_visibility() {
        let clear = Atmosphere::from_visibility(100.0);
        assert!((clear.ambient - 1.0).abs() < 1e-6);
        assert!((clear.directional - 1.0).abs() < 1e-6);
        assert_eq!(clear.fog_far, 200.0);

        let murky = Atmosphere::from_visibility(10.0);
        assert!((murky.ambient - 0.37).abs() < 1e-6);
        assert_eq!(murky.fog_far, 920.0);
        assert_eq!(Atmosphere::from_visibility(-50.0), murky);
    }
}
