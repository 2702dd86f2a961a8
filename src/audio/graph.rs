// graph.rs - Signal graph contract
//
// Nodes are created through the backend and referred to by id. Edges are
// explicit and must keep the graph acyclic; everything ends at the
// backend's destination.

use super::Automation;
use crate::error::AudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioParam {
    Gain,
    Frequency,
    Q,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Destination,
    Gain,
    Filter(FilterKind),
    /// Mono sample buffer played at the context rate.
    Buffer { samples: usize, looping: bool },
    Oscillator(Waveform),
}

impl NodeKind {
    pub fn is_source(&self) -> bool {
        matches!(self, NodeKind::Buffer { .. } | NodeKind::Oscillator(_))
    }
}

pub trait AudioBackend {
    /// Create the underlying context. May be refused until a user gesture.
    fn open(&mut self) -> Result<(), AudioError>;
    fn is_open(&self) -> bool;
    fn is_suspended(&self) -> bool;
    fn resume(&mut self);
    /// Close the context, releasing every node. Safe to repeat.
    fn close(&mut self);

    /// Seconds on the context clock.
    fn current_time(&self) -> f64;
    /// Called once per frame. Backends with their own clock ignore it.
    fn tick(&mut self, _delta: f64) {}
    fn sample_rate(&self) -> f32;
    fn destination(&self) -> NodeId;

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError>;
    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> Result<NodeId, AudioError>;
    fn create_buffer_source(&mut self, samples: &[f32], looping: bool) -> Result<NodeId, AudioError>;
    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId, AudioError>;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError>;
    fn disconnect(&mut self, node: NodeId);

    fn schedule(&mut self, node: NodeId, param: AudioParam, event: Automation) -> Result<(), AudioError>;
    /// Drop automation events at or after `from`.
    fn cancel_scheduled(&mut self, node: NodeId, param: AudioParam, from: f64);
    /// Value of `param` right now, automation included.
    fn param_value(&self, node: NodeId, param: AudioParam) -> Option<f32>;

    fn start(&mut self, node: NodeId, at: f64) -> Result<(), AudioError>;
    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), AudioError>;

    /// Drop the backend's handle. The node must already be disconnected.
    fn release(&mut self, node: NodeId);
}
