// storm.rs - Rain ambience and thunder
//
// One persistent rain graph (looping noise through band-pass and high-pass
// filters) and any number of short-lived thunder voices, all mixed into a
// master gain. The context may be refused until a user gesture, so `init`
// can fail quietly and be retried from `toggle`.

use log::{debug, info, warn};

use super::{AudioBackend, AudioParam, Automation, FilterKind, NodeId, Waveform};
use crate::error::AudioError;
use crate::rng::RandomSource;

pub const MASTER_LEVEL: f32 = 0.7;
pub const CROSSFADE: f64 = 0.3;

// Rain
const RAIN_SECONDS: f32 = 2.0;
const RAIN_BAND_HZ: f32 = 3000.0;
const RAIN_BAND_Q: f32 = 0.5;
const RAIN_HIGHPASS_HZ: f32 = 1000.0;
const RAIN_LEVEL: f32 = 0.3;
// Web Audio's default biquad Q
const DEFAULT_Q: f32 = 1.0;

// Thunder
const THUNDER_SECONDS: f32 = 3.0;
const THUNDER_Q: f32 = 1.5;
const ATTACK: f64 = 0.05;
const BODY: f64 = 0.4;
const BODY_LEVEL: f32 = 0.3;
const TAIL_LEVEL: f32 = 0.01;
const NOISE_STOP: f64 = 3.5;
const RUMBLE_ATTACK: f64 = 0.08;
const RUMBLE_LEVEL: f32 = 0.15;
const RUMBLE_STOP: f64 = 3.0;

/// Random draws for one thunder clap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThunderShape {
    pub cutoff: f32,
    pub peak: f32,
    pub tail: f64,
    pub rumble_frequency: f32,
    pub rumble_tail: f64,
}

impl ThunderShape {
    pub fn sample(rng: &mut dyn RandomSource) -> Self {
        Self {
            cutoff: rng.range(80.0, 140.0),
            peak: rng.range(0.8, 1.0),
            tail: 2.5 + rng.next_f32() as f64,
            rumble_frequency: rng.range(30.0, 50.0),
            rumble_tail: 2.0 + rng.next_f32() as f64,
        }
    }

    /// Gain automation for the noise layer, starting at `now`.
    pub fn noise_envelope(&self, now: f64) -> [Automation; 4] {
        [
            Automation::SetValue { value: 0.0, at: now },
            Automation::LinearRamp { value: self.peak, end: now + ATTACK },
            Automation::ExponentialRamp { value: BODY_LEVEL, end: now + BODY },
            Automation::ExponentialRamp { value: TAIL_LEVEL, end: now + self.tail },
        ]
    }

    pub fn rumble_envelope(&self, now: f64) -> [Automation; 3] {
        [
            Automation::SetValue { value: 0.0, at: now },
            Automation::LinearRamp { value: RUMBLE_LEVEL, end: now + RUMBLE_ATTACK },
            Automation::ExponentialRamp { value: TAIL_LEVEL, end: now + self.rumble_tail },
        ]
    }
}

/// Nodes of one thunder clap, reclaimable once `stop_at` has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct ThunderVoice {
    pub nodes: Vec<NodeId>,
    pub stop_at: f64,
}

pub struct StormAudio<B: AudioBackend> {
    backend: B,
    master: Option<NodeId>,
    rain: Vec<NodeId>,
    voices: Vec<ThunderVoice>,
    muted: bool,
    started: bool,
}

impl<B: AudioBackend> StormAudio<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master: None,
            rain: Vec::new(),
            voices: Vec::new(),
            muted: true,
            started: false,
        }
    }

    /// Open the context, build the master bus and start the rain. Returns
    /// whether audio is running. Repeated calls only resume.
    pub fn init(&mut self, rng: &mut dyn RandomSource) -> bool {
        if self.started {
            if self.backend.is_suspended() {
                self.backend.resume();
            }
            return true;
        }

        if let Err(e) = self.backend.open() {
            warn!("Storm audio deferred: {}", e);
            return false;
        }
        match self.build_master() {
            Ok(master) => self.master = Some(master),
            Err(e) => {
                warn!("Storm audio deferred: {}", e);
                self.backend.close();
                return false;
            }
        }

        self.start_rain(rng);
        self.started = true;
        self.muted = false;
        info!("Storm audio started at {} Hz", self.backend.sample_rate());
        true
    }

    fn build_master(&mut self) -> Result<NodeId, AudioError> {
        let master = self.backend.create_gain(MASTER_LEVEL)?;
        let destination = self.backend.destination();
        self.backend.connect(master, destination)?;
        Ok(master)
    }

    /// Start the looping rain graph. No-op before `init` or if it already runs.
    pub fn start_rain(&mut self, rng: &mut dyn RandomSource) {
        let Some(master) = self.master else { return };
        if !self.rain.is_empty() {
            return;
        }
        match self.build_rain(master, rng) {
            Ok(nodes) => self.rain = nodes,
            Err(e) => warn!("Rain ambience failed: {}", e),
        }
    }

    fn build_rain(&mut self, master: NodeId, rng: &mut dyn RandomSource) -> Result<Vec<NodeId>, AudioError> {
        let samples = noise(self.backend.sample_rate(), RAIN_SECONDS, rng);
        let b = &mut self.backend;

        let source = b.create_buffer_source(&samples, true)?;
        let band = b.create_filter(FilterKind::BandPass, RAIN_BAND_HZ, RAIN_BAND_Q)?;
        let high = b.create_filter(FilterKind::HighPass, RAIN_HIGHPASS_HZ, DEFAULT_Q)?;
        let gain = b.create_gain(RAIN_LEVEL)?;

        b.connect(source, band)?;
        b.connect(band, high)?;
        b.connect(high, gain)?;
        b.connect(gain, master)?;
        let now = b.current_time();
        b.start(source, now)?;

        Ok(vec![source, band, high, gain])
    }

    /// Fire one thunder clap now. Silent before `init` and while muted.
    pub fn play_thunder(&mut self, rng: &mut dyn RandomSource) -> bool {
        if !self.started || self.muted {
            return false;
        }
        let Some(master) = self.master else { return false };

        let shape = ThunderShape::sample(rng);
        match self.build_thunder(master, &shape, rng) {
            Ok(voice) => {
                debug!("Thunder: cutoff {:.0} Hz, peak {:.2}", shape.cutoff, shape.peak);
                self.voices.push(voice);
                true
            }
            Err(e) => {
                warn!("Thunder dropped: {}", e);
                false
            }
        }
    }

    fn build_thunder(
        &mut self,
        master: NodeId,
        shape: &ThunderShape,
        rng: &mut dyn RandomSource,
    ) -> Result<ThunderVoice, AudioError> {
        let samples = noise(self.backend.sample_rate(), THUNDER_SECONDS, rng);
        let b = &mut self.backend;
        let now = b.current_time();

        let source = b.create_buffer_source(&samples, false)?;
        let lowpass = b.create_filter(FilterKind::LowPass, shape.cutoff, THUNDER_Q)?;
        let gain = b.create_gain(0.0)?;
        for event in shape.noise_envelope(now) {
            b.schedule(gain, AudioParam::Gain, event)?;
        }
        b.connect(source, lowpass)?;
        b.connect(lowpass, gain)?;
        b.connect(gain, master)?;
        b.start(source, now)?;
        b.stop(source, now + NOISE_STOP)?;

        // Sub-bass layer
        let osc = b.create_oscillator(Waveform::Sine, shape.rumble_frequency)?;
        let rumble = b.create_gain(0.0)?;
        for event in shape.rumble_envelope(now) {
            b.schedule(rumble, AudioParam::Gain, event)?;
        }
        b.connect(osc, rumble)?;
        b.connect(rumble, master)?;
        b.start(osc, now)?;
        b.stop(osc, now + RUMBLE_STOP)?;

        Ok(ThunderVoice {
            nodes: vec![source, lowpass, gain, osc, rumble],
            stop_at: now + NOISE_STOP.max(RUMBLE_STOP),
        })
    }

    /// Mute or unmute with a short ramp. Before `init` this is `init`.
    pub fn toggle(&mut self, rng: &mut dyn RandomSource) {
        if !self.started {
            self.init(rng);
            return;
        }
        if self.backend.is_suspended() {
            self.backend.resume();
        }
        self.muted = !self.muted;

        let Some(master) = self.master else { return };
        let target = if self.muted { 0.0 } else { MASTER_LEVEL };
        let now = self.backend.current_time();
        let current = self.backend.param_value(master, AudioParam::Gain).unwrap_or(target);

        // Anchor the ramp at the current level
        self.backend.cancel_scheduled(master, AudioParam::Gain, now);
        let ramp = self
            .backend
            .schedule(master, AudioParam::Gain, Automation::SetValue { value: current, at: now })
            .and_then(|_| {
                self.backend.schedule(
                    master,
                    AudioParam::Gain,
                    Automation::LinearRamp { value: target, end: now + CROSSFADE },
                )
            });
        if let Err(e) = ramp {
            warn!("Mute ramp failed: {}", e);
        }
    }

    /// Disconnect and release thunder voices that have stopped. Returns how
    /// many were reclaimed.
    pub fn collect_finished(&mut self) -> usize {
        if !self.started {
            return 0;
        }
        let now = self.backend.current_time();
        let (done, live): (Vec<_>, Vec<_>) = self.voices.drain(..).partition(|v| v.stop_at <= now);
        self.voices = live;

        for voice in &done {
            for &node in &voice.nodes {
                self.backend.disconnect(node);
            }
            for &node in &voice.nodes {
                self.backend.release(node);
            }
        }
        if !done.is_empty() {
            debug!("Reclaimed {} thunder voices", done.len());
        }
        done.len()
    }

    /// Close the context. Safe to repeat.
    pub fn dispose(&mut self) {
        if !self.started && !self.backend.is_open() {
            return;
        }
        self.backend.close();
        self.master = None;
        self.rain.clear();
        self.voices.clear();
        self.started = false;
        self.muted = true;
        info!("Storm audio closed");
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    pub fn rain_nodes(&self) -> &[NodeId] {
        &self.rain
    }

    pub fn active_voices(&self) -> &[ThunderVoice] {
        &self.voices
    }
}

/// Uniform white noise in [-1, 1).
fn noise(sample_rate: f32, seconds: f32, rng: &mut dyn RandomSource) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    (0..len).map(|_| rng.centered(1.0)).collect()
}
