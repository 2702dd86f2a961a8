// lightning.rs - Flash light and delayed thunder
//
// A random roll per frame starts a flash; while the light is bright it keeps
// flickering. Only a flash that starts from a dim light moves the light and
// queues a thunder clap a little later. Queued claps count down
// independently and each fires exactly once.

use glam::Vec3;
use log::debug;

use crate::config;
use crate::rng::RandomSource;
use crate::scene::clamp_delta;
use crate::sim::REFERENCE_FPS;

pub const FLASH_COLOR: u32 = 0x062d89;
pub const FLASH_DISTANCE: f32 = 500.0;
pub const FLASH_DECAY: f32 = 1.7;

const INITIAL_POWER: f32 = 30.0;
const BRIGHT: f32 = 100.0;
const POWER_MIN: f32 = 50.0;
const POWER_MAX: f32 = 550.0;

// Light placement for a new flash
const X_MAX: f32 = 400.0;
const Y_MIN: f32 = 300.0;
const Y_MAX: f32 = 500.0;
const Z: f32 = 100.0;

// Seconds between flash and thunder
const DELAY_MIN: f32 = 0.3;
const DELAY_MAX: f32 = 1.1;

/// Chance of a flash in a frame of `delta` seconds, given the per-reference-frame
/// `frequency`.
pub fn flash_probability(frequency: f32, delta: f32) -> f32 {
    let f = frequency.clamp(0.0, 1.0);
    1.0 - (1.0 - f).powf(delta * REFERENCE_FPS)
}

#[derive(Debug, Clone)]
pub struct Lightning {
    power: f32,
    position: Vec3,
    frequency: f32,
    // Seconds until each queued thunder
    pending: Vec<f32>,
    flashes: u64,
}

impl Lightning {
    pub fn new(frequency: f32) -> Self {
        Self {
            power: INITIAL_POWER,
            position: Vec3::new(200.0, Y_MIN, Z),
            frequency: config::clamp(frequency, (0.0, 1.0)),
            pending: Vec::new(),
            flashes: 0,
        }
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = config::clamp(frequency, (0.0, 1.0));
    }

    /// Advance by `delta` seconds. Returns how many thunder claps are due.
    pub fn update(&mut self, delta: f32, rng: &mut dyn RandomSource) -> usize {
        let delta = clamp_delta(delta);

        let before = self.pending.len();
        self.pending.retain_mut(|t| {
            *t -= delta;
            *t > 0.0
        });
        let due = before - self.pending.len();

        let struck = rng.next_f32() < flash_probability(self.frequency, delta);
        if struck || self.power > BRIGHT {
            if self.power < BRIGHT {
                self.position = Vec3::new(rng.range(0.0, X_MAX), rng.range(Y_MIN, Y_MAX), Z);
                let delay = rng.range(DELAY_MIN, DELAY_MAX);
                self.pending.push(delay);
                self.flashes += 1;
                debug!("Lightning at ({:.0}, {:.0}), thunder in {:.2}s", self.position.x, self.position.y, delay);
            }
            self.power = rng.range(POWER_MIN, POWER_MAX);
        }

        due
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Flashes started so far, flicker excluded.
    pub fn flashes(&self) -> u64 {
        self.flashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Xorshift32;

    const FRAME: f32 = 1.0 / 60.0;

    /// Replays a fixed list of draws.
    struct Script(Vec<f32>, usize);

    impl RandomSource for Script {
        fn next_f32(&mut self) -> f32 {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }
    }

    #[test]
    fn probability_scales_with_frame_time() {
        assert!((flash_probability(0.07, FRAME) - 0.07).abs() < 1e-5);
        let two = flash_probability(0.07, 2.0 * FRAME);
        assert!((two - (1.0 - 0.93f32 * 0.93)).abs() < 1e-5);
        assert_eq!(flash_probability(0.0, FRAME), 0.0);
        assert_eq!(flash_probability(0.5, 0.0), 0.0);
    }

    #[test]
    fn zero_frequency_never_flashes() {
        let mut rng = Xorshift32::new(1);
        let mut lightning = Lightning::new(0.0);
        for _ in 0..1_000 {
            assert_eq!(lightning.update(FRAME, &mut rng), 0);
        }
        assert_eq!(lightning.flashes(), 0);
        assert_eq!(lightning.power(), INITIAL_POWER);
    }

    #[test]
    fn flicker_does_not_queue_more_thunder() {
        let mut lightning = Lightning::new(0.07);
        // strike: roll, x, y, delay, power(500)
        let mut rng = Script(vec![0.0, 0.5, 0.5, 0.0, 0.9], 0);
        lightning.update(FRAME, &mut rng);
        assert_eq!(lightning.flashes(), 1);
        assert_eq!(lightning.pending(), 1);
        assert_eq!(lightning.position(), Vec3::new(200.0, 400.0, Z));

        // no roll, still bright: flicker only
        let mut rng = Script(vec![0.99, 0.9], 0);
        lightning.update(FRAME, &mut rng);
        assert_eq!(lightning.flashes(), 1);
        assert_eq!(lightning.pending(), 1);
        assert!(lightning.power() > BRIGHT);
    }

    #[test]
    fn each_thunder_fires_once_after_its_delay() {
        let mut lightning = Lightning::new(0.07);
        // strike with the shortest delay, then dim
        let mut rng = Script(vec![0.0, 0.5, 0.5, 0.0, 0.0], 0);
        lightning.update(FRAME, &mut rng);
        assert!(lightning.power() < BRIGHT);

        let mut quiet = Script(vec![0.99], 0);
        let fired: usize = (0..120).map(|_| lightning.update(FRAME, &mut quiet)).sum();
        assert_eq!(fired, 1);
        assert_eq!(lightning.pending(), 0);
    }

    #[test]
    fn overlapping_thunders_are_independent() {
        let mut lightning = Lightning::new(0.07);
        // two dim strikes in a row, longest then shortest delay
        let mut rng = Script(vec![0.0, 0.5, 0.5, 0.999, 0.0], 0);
        lightning.update(FRAME, &mut rng);
        let mut rng = Script(vec![0.0, 0.5, 0.5, 0.0, 0.0], 0);
        lightning.update(FRAME, &mut rng);
        assert_eq!(lightning.pending(), 2);

        let mut quiet = Script(vec![0.99], 0);
        let mut fired = 0;
        for _ in 0..90 {
            fired += lightning.update(FRAME, &mut quiet);
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn frequency_is_clamped() {
        let mut lightning = Lightning::new(3.0);
        assert_eq!(lightning.frequency(), 1.0);
        lightning.set_frequency(-1.0);
        assert_eq!(lightning.frequency(), 0.0);
    }
}
