// memory.rs - In-memory audio graph
//
// Keeps nodes, edges, schedules and automation as plain data with a manual
// clock. Nothing is synthesized. Used for tests and for native hosts with
// no sound output.

use std::collections::{BTreeMap, HashMap};

use super::{AudioBackend, AudioParam, Automation, Envelope, FilterKind, NodeId, NodeKind, Waveform};
use crate::error::AudioError;

const DESTINATION: NodeId = NodeId(0);

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    params: HashMap<AudioParam, Envelope>,
    outputs: Vec<NodeId>,
    start: Option<f64>,
    stop: Option<f64>,
}

impl Node {
    fn new(kind: NodeKind, params: &[(AudioParam, f32)]) -> Self {
        Self {
            kind,
            params: params.iter().map(|&(p, v)| (p, Envelope::new(v))).collect(),
            outputs: Vec::new(),
            start: None,
            stop: None,
        }
    }
}

#[derive(Debug)]
pub struct MemoryAudio {
    open: bool,
    suspended: bool,
    refuse_open: bool,
    time: f64,
    sample_rate: f32,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
    released: usize,
}

impl Default for MemoryAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self {
            open: false,
            suspended: false,
            refuse_open: false,
            time: 0.0,
            sample_rate: 44_100.0,
            nodes: BTreeMap::new(),
            next_id: 1,
            released: 0,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate.max(1.0);
        self
    }

    /// Refuse to open, as a browser does before the first user gesture.
    pub fn refusing(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    pub fn allow_open(&mut self) {
        self.refuse_open = false;
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Move the context clock forward. Suspended contexts stand still.
    pub fn advance(&mut self, seconds: f64) {
        if self.open && !self.suspended {
            self.time += seconds.max(0.0);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn released(&self) -> usize {
        self.released
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|n| &n.kind)
    }

    pub fn outputs(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map(|n| n.outputs.as_slice()).unwrap_or(&[])
    }

    pub fn envelope(&self, node: NodeId, param: AudioParam) -> Option<&Envelope> {
        self.nodes.get(&node).and_then(|n| n.params.get(&param))
    }

    pub fn start_time(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).and_then(|n| n.start)
    }

    pub fn stop_time(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).and_then(|n| n.stop)
    }

    pub fn count_kind(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.values().filter(|n| pred(&n.kind)).count()
    }

    /// Whether signal from `node` reaches the destination.
    pub fn reaches_destination(&self, node: NodeId) -> bool {
        self.reaches(node, DESTINATION)
    }

    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            stack.extend_from_slice(self.outputs(id));
        }
        false
    }

    fn ensure_open(&self) -> Result<(), AudioError> {
        if self.open { Ok(()) } else { Err(AudioError::Closed) }
    }

    fn insert(&mut self, node: Node) -> Result<NodeId, AudioError> {
        self.ensure_open()?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, AudioError> {
        self.ensure_open()?;
        self.nodes.get_mut(&id).ok_or(AudioError::UnknownNode(id))
    }
}

impl AudioBackend for MemoryAudio {
    fn open(&mut self) -> Result<(), AudioError> {
        if self.refuse_open {
            return Err(AudioError::Unavailable("blocked until a user gesture".into()));
        }
        if !self.open {
            self.open = true;
            self.nodes.insert(DESTINATION, Node::new(NodeKind::Destination, &[]));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn close(&mut self) {
        self.open = false;
        self.nodes.clear();
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn tick(&mut self, delta: f64) {
        self.advance(delta);
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        self.insert(Node::new(NodeKind::Gain, &[(AudioParam::Gain, gain)]))
    }

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> Result<NodeId, AudioError> {
        self.insert(Node::new(
            NodeKind::Filter(kind),
            &[(AudioParam::Frequency, frequency), (AudioParam::Q, q)],
        ))
    }

    fn create_buffer_source(&mut self, samples: &[f32], looping: bool) -> Result<NodeId, AudioError> {
        self.insert(Node::new(NodeKind::Buffer { samples: samples.len(), looping }, &[]))
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId, AudioError> {
        self.insert(Node::new(NodeKind::Oscillator(waveform), &[(AudioParam::Frequency, frequency)]))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        self.ensure_open()?;
        if !self.nodes.contains_key(&to) {
            return Err(AudioError::UnknownNode(to));
        }
        if self.reaches(to, from) {
            return Err(AudioError::Cycle { from, to });
        }
        let node = self.node_mut(from)?;
        if !node.outputs.contains(&to) {
            node.outputs.push(to);
        }
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.outputs.clear();
        }
    }

    fn schedule(&mut self, node: NodeId, param: AudioParam, event: Automation) -> Result<(), AudioError> {
        let n = self.node_mut(node)?;
        let env = n
            .params
            .get_mut(&param)
            .ok_or_else(|| AudioError::Backend(format!("{:?} has no {:?} parameter", n.kind, param)))?;
        env.push(event);
        Ok(())
    }

    fn cancel_scheduled(&mut self, node: NodeId, param: AudioParam, from: f64) {
        if let Some(env) = self.nodes.get_mut(&node).and_then(|n| n.params.get_mut(&param)) {
            env.cancel_from(from);
        }
    }

    fn param_value(&self, node: NodeId, param: AudioParam) -> Option<f32> {
        self.envelope(node, param).map(|env| env.value_at(self.time))
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<(), AudioError> {
        let n = self.node_mut(node)?;
        if !n.kind.is_source() {
            return Err(AudioError::Backend(format!("{:?} cannot be started", n.kind)));
        }
        n.start = Some(at);
        Ok(())
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), AudioError> {
        let n = self.node_mut(node)?;
        if !n.kind.is_source() {
            return Err(AudioError::Backend(format!("{:?} cannot be stopped", n.kind)));
        }
        n.stop = Some(at);
        Ok(())
    }

    fn release(&mut self, node: NodeId) {
        if node == DESTINATION {
            return;
        }
        if self.nodes.remove(&node).is_some() {
            for other in self.nodes.values_mut() {
                other.outputs.retain(|&o| o != node);
            }
            self.released += 1;
        }
    }
}
