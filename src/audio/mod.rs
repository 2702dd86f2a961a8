// audio/ - Procedural storm audio
//
// The engine describes a small signal graph (noise -> filters -> gain ->
// master) against an `AudioBackend`. Web Audio realizes it in the browser;
// `MemoryAudio` keeps it as data for tests and headless hosts.

mod envelope;
mod graph;
mod memory;
mod storm;
#[cfg(target_arch = "wasm32")]
mod web;

pub use envelope::{Automation, Envelope};
pub use graph::{AudioBackend, AudioParam, FilterKind, NodeId, NodeKind, Waveform};
pub use memory::MemoryAudio;
pub use storm::{CROSSFADE, MASTER_LEVEL, StormAudio, ThunderShape, ThunderVoice};
#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;
