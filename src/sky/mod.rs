// sky/ - Aurora ribbons
//
// Geometry and palettes are baked once per colour scheme; everything that
// moves is pushed to the shader as uniforms each frame.

mod aurora;
mod ribbon;
mod shader;
mod transition;

pub use aurora::{AuroraLayer, AuroraLayerSystem, AuroraUniforms};
pub use ribbon::{LAYER_SHIFT, RibbonMesh, SEGMENTS, band_color, build_ribbon, layer_depth, layer_height};
pub use shader::{
    AURORA_WGSL, WaveParams, distance_fade, flow_offset, flow_pattern, shimmer, smoothstep, vertical_fade, wave_offset,
};
pub use transition::{
    Advance, FADE_DURATION, STORM_HOLD, STORM_PEAK, STORM_RAMP, Transition, progress,
};

use serde::{Deserialize, Serialize};

/// Linear RGB in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl From<Color> for u32 {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Three reference colours blended across each ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub tertiary: Color,
}

impl Palette {
    pub const fn new(primary: u32, secondary: u32, tertiary: u32) -> Self {
        Self {
            primary: Color::from_hex(primary),
            secondary: Color::from_hex(secondary),
            tertiary: Color::from_hex(tertiary),
        }
    }

    pub const fn classic_green() -> Self {
        Self::new(0x00ff88, 0x44ff44, 0x88ffaa)
    }

    pub const fn blue_purple() -> Self {
        Self::new(0x4444ff, 0x8844ff, 0xff44ff)
    }

    pub const fn red_pink() -> Self {
        Self::new(0xff4444, 0xff4488, 0xff88cc)
    }

    /// Green, blue, pink. The default sky.
    pub const fn rainbow() -> Self {
        Self::new(0x00ff88, 0x4444ff, 0xff4488)
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic-green" | "classicGreen" => Some(Self::classic_green()),
            "blue-purple" | "bluePurple" => Some(Self::blue_purple()),
            "red-pink" | "redPink" => Some(Self::red_pink()),
            "rainbow" => Some(Self::rainbow()),
            _ => None,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::rainbow()
    }
}
