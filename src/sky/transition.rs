// transition.rs - Timed intensity ramps
//
// Storm: ramp to STORM_PEAK, hold, then fade. Fade: ramp to zero. Each is a
// state advanced by the render tick; nothing sleeps and nothing is queued.
// Replacing the state (or resetting it to Idle) is the cancellation.

pub const STORM_PEAK: f32 = 1.2;
pub const STORM_RAMP: f32 = 5.0;
pub const STORM_HOLD: f32 = 10.0;
pub const FADE_DURATION: f32 = 8.0;

/// Fraction of `duration` covered after `elapsed`, clamped to [0, 1].
#[inline]
pub fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transition {
    #[default]
    Idle,
    StormRamp { from: f32, elapsed: f32 },
    StormHold { elapsed: f32 },
    FadeOut { from: f32, elapsed: f32 },
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Advance {
    /// Intensity to apply this frame, if the transition drives it.
    pub intensity: Option<f32>,
    /// The fade just reached zero.
    pub faded: bool,
}

impl Transition {
    pub fn storm(current: f32) -> Self {
        Transition::StormRamp { from: current, elapsed: 0.0 }
    }

    pub fn fade(current: f32) -> Self {
        Transition::FadeOut { from: current, elapsed: 0.0 }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Transition::Idle)
    }

    pub fn advance(&mut self, delta: f32, current: f32) -> Advance {
        match *self {
            Transition::Idle => Advance::default(),

            Transition::StormRamp { from, elapsed } => {
                let elapsed = elapsed + delta;
                let p = progress(elapsed, STORM_RAMP);
                let value = if p >= 1.0 {
                    STORM_PEAK
                } else {
                    (from + (STORM_PEAK - from) * p).clamp(from.min(STORM_PEAK), from.max(STORM_PEAK))
                };
                *self = if p >= 1.0 {
                    Transition::StormHold { elapsed: 0.0 }
                } else {
                    Transition::StormRamp { from, elapsed }
                };
                Advance { intensity: Some(value), faded: false }
            }

            Transition::StormHold { elapsed } => {
                let elapsed = elapsed + delta;
                *self = if elapsed >= STORM_HOLD {
                    Transition::fade(current)
                } else {
                    Transition::StormHold { elapsed }
                };
                Advance::default()
            }

            Transition::FadeOut { from, elapsed } => {
                let elapsed = elapsed + delta;
                let p = progress(elapsed, FADE_DURATION);
                if p >= 1.0 {
                    *self = Transition::Idle;
                    return Advance { intensity: Some(0.0), faded: true };
                }
                *self = Transition::FadeOut { from, elapsed };
                Advance { intensity: Some(from * (1.0 - p)), faded: false }
            }
        }
    }
}
