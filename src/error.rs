// error.rs - Error types
//
// Nothing here reaches the frame loop. Config errors go back to whoever
// supplied the JSON; audio errors are logged and the engine stays deferred.

use crate::audio::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed weather configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown precipitation type '{0}'")]
    UnknownPrecipitation(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("Audio context unavailable: {0}")]
    Unavailable(String),

    #[error("Audio context already closed")]
    Closed,

    #[error("Unknown audio node {0:?}")]
    UnknownNode(NodeId),

    #[error("Connecting {from:?} -> {to:?} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("Audio backend error: {0}")]
    Backend(String),
}
