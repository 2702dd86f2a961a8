// web.rs - Web Audio backend
//
// Thin mapping from node ids to web-sys handles. The browser owns the
// signal processing and the clock; this only forwards calls.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{
    AudioBufferSourceNode, AudioContext, AudioContextState, AudioDestinationNode, AudioNode,
    BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
};

use super::{AudioBackend, AudioParam, Automation, FilterKind, NodeId, Waveform};
use crate::error::AudioError;

const DESTINATION: NodeId = NodeId(0);

enum WebNode {
    Destination(AudioDestinationNode),
    Gain(GainNode),
    Filter(BiquadFilterNode),
    Buffer(AudioBufferSourceNode),
    Oscillator(OscillatorNode),
}

impl WebNode {
    fn node(&self) -> &AudioNode {
        match self {
            WebNode::Destination(n) => n,
            WebNode::Gain(n) => n,
            WebNode::Filter(n) => n,
            WebNode::Buffer(n) => n,
            WebNode::Oscillator(n) => n,
        }
    }

    fn param(&self, param: AudioParam) -> Option<web_sys::AudioParam> {
        match (self, param) {
            (WebNode::Gain(n), AudioParam::Gain) => Some(n.gain()),
            (WebNode::Filter(n), AudioParam::Frequency) => Some(n.frequency()),
            (WebNode::Filter(n), AudioParam::Q) => Some(n.q()),
            (WebNode::Oscillator(n), AudioParam::Frequency) => Some(n.frequency()),
            _ => None,
        }
    }
}

fn js_err(e: JsValue) -> AudioError {
    AudioError::Backend(format!("{:?}", e))
}

#[derive(Default)]
pub struct WebAudio {
    ctx: Option<AudioContext>,
    nodes: HashMap<NodeId, WebNode>,
    next_id: u32,
}

impl WebAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn ctx(&self) -> Result<&AudioContext, AudioError> {
        self.ctx.as_ref().ok_or(AudioError::Closed)
    }

    fn get(&self, id: NodeId) -> Result<&WebNode, AudioError> {
        self.nodes.get(&id).ok_or(AudioError::UnknownNode(id))
    }

    fn insert(&mut self, node: WebNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }
}

impl AudioBackend for WebAudio {
    fn open(&mut self) -> Result<(), AudioError> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;
        self.nodes.insert(DESTINATION, WebNode::Destination(ctx.destination()));
        self.ctx = Some(ctx);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.ctx.is_some()
    }

    fn is_suspended(&self) -> bool {
        self.ctx.as_ref().is_some_and(|c| c.state() == AudioContextState::Suspended)
    }

    fn resume(&mut self) {
        if let Some(ctx) = &self.ctx {
            // Resolves asynchronously; nothing waits on it
            let _ = ctx.resume();
        }
    }

    fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
        }
        self.nodes.clear();
    }

    fn current_time(&self) -> f64 {
        self.ctx.as_ref().map_or(0.0, |c| c.current_time())
    }

    fn sample_rate(&self) -> f32 {
        self.ctx.as_ref().map_or(44_100.0, |c| c.sample_rate())
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        let node = self.ctx()?.create_gain().map_err(js_err)?;
        node.gain().set_value(gain);
        Ok(self.insert(WebNode::Gain(node)))
    }

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> Result<NodeId, AudioError> {
        let node = self.ctx()?.create_biquad_filter().map_err(js_err)?;
        node.set_type(match kind {
            FilterKind::LowPass => BiquadFilterType::Lowpass,
            FilterKind::HighPass => BiquadFilterType::Highpass,
            FilterKind::BandPass => BiquadFilterType::Bandpass,
        });
        node.frequency().set_value(frequency);
        node.q().set_value(q);
        Ok(self.insert(WebNode::Filter(node)))
    }

    fn create_buffer_source(&mut self, samples: &[f32], looping: bool) -> Result<NodeId, AudioError> {
        let ctx = self.ctx()?;
        let buffer = ctx
            .create_buffer(1, samples.len().max(1) as u32, ctx.sample_rate())
            .map_err(js_err)?;
        let mut data = samples.to_vec();
        buffer.copy_to_channel(&mut data, 0).map_err(js_err)?;

        let node = ctx.create_buffer_source().map_err(js_err)?;
        node.set_buffer(Some(&buffer));
        node.set_loop(looping);
        Ok(self.insert(WebNode::Buffer(node)))
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId, AudioError> {
        let node = self.ctx()?.create_oscillator().map_err(js_err)?;
        node.set_type(match waveform {
            Waveform::Sine => OscillatorType::Sine,
        });
        node.frequency().set_value(frequency);
        Ok(self.insert(WebNode::Oscillator(node)))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        let src = self.get(from)?.node();
        let dst = self.get(to)?.node();
        src.connect_with_audio_node(dst).map_err(js_err)?;
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get(&node) {
            let _ = n.node().disconnect();
        }
    }

    fn schedule(&mut self, node: NodeId, param: AudioParam, event: Automation) -> Result<(), AudioError> {
        let p = self
            .get(node)?
            .param(param)
            .ok_or_else(|| AudioError::Backend(format!("node {:?} has no {:?} parameter", node, param)))?;
        match event {
            Automation::SetValue { value, at } => p.set_value_at_time(value, at),
            Automation::LinearRamp { value, end } => p.linear_ramp_to_value_at_time(value, end),
            Automation::ExponentialRamp { value, end } => p.exponential_ramp_to_value_at_time(value, end),
        }
        .map_err(js_err)?;
        Ok(())
    }

    fn cancel_scheduled(&mut self, node: NodeId, param: AudioParam, from: f64) {
        if let Some(p) = self.nodes.get(&node).and_then(|n| n.param(param)) {
            let _ = p.cancel_scheduled_values(from);
        }
    }

    fn param_value(&self, node: NodeId, param: AudioParam) -> Option<f32> {
        self.nodes.get(&node).and_then(|n| n.param(param)).map(|p| p.value())
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<(), AudioError> {
        match self.get(node)? {
            WebNode::Buffer(n) => n.start_with_when(at).map_err(js_err),
            WebNode::Oscillator(n) => n.start_with_when(at).map_err(js_err),
            _ => Err(AudioError::Backend(format!("node {:?} cannot be started", node))),
        }
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), AudioError> {
        match self.get(node)? {
            WebNode::Buffer(n) => n.stop_with_when(at).map_err(js_err),
            WebNode::Oscillator(n) => n.stop_with_when(at).map_err(js_err),
            _ => Err(AudioError::Backend(format!("node {:?} cannot be stopped", node))),
        }
    }

    fn release(&mut self, node: NodeId) {
        if node != DESTINATION {
            self.nodes.remove(&node);
        }
    }
}
