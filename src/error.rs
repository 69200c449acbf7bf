//! Error and warning types shared across the engine
//!
//! Construction-time failures are `PedalError`s and abort only the unit being
//! assembled. Runtime problems never become errors: values are clamped, events
//! ignored, and the matching warning value is logged and handed back to the
//! caller for inspection.

use crate::audio_node::NodeId;
use std::fmt;

/// A connection would close a feedback loop with no delay in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCycleError {
    /// Source of the rejected connection
    pub from: NodeId,
    /// Destination of the rejected connection
    pub to: NodeId,
    pub from_name: String,
    pub to_name: String,
}

impl fmt::Display for GraphCycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connecting {} (#{}) -> {} (#{}) creates a feedback loop without delay",
            self.from_name, self.from, self.to_name, self.to
        )
    }
}

impl std::error::Error for GraphCycleError {}

/// Errors raised while building graphs, units and chains
#[derive(Debug)]
pub enum PedalError {
    /// Zero-delay cycle attempted
    GraphCycle(GraphCycleError),
    /// Node id does not exist in the graph
    UnknownNode(NodeId),
    /// Node has no parameter with that name
    UnknownParam { node: String, param: String },
    /// Pedal name not in the catalog
    UnknownPedal(String),
    /// Configuration could not be read or parsed
    InvalidConfig(String),
    /// Audio device error
    Audio(String),
    /// MIDI device error
    Midi(String),
    /// IO error
    Io(std::io::Error),
}

impl fmt::Display for PedalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PedalError::GraphCycle(e) => write!(f, "Graph cycle: {}", e),
            PedalError::UnknownNode(id) => write!(f, "Unknown node: #{}", id),
            PedalError::UnknownParam { node, param } => {
                write!(f, "Node {} has no parameter '{}'", node, param)
            }
            PedalError::UnknownPedal(name) => write!(f, "Unknown pedal: {}", name),
            PedalError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PedalError::Audio(msg) => write!(f, "Audio error: {}", msg),
            PedalError::Midi(msg) => write!(f, "MIDI error: {}", msg),
            PedalError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for PedalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PedalError::GraphCycle(e) => Some(e),
            PedalError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphCycleError> for PedalError {
    fn from(e: GraphCycleError) -> Self {
        PedalError::GraphCycle(e)
    }
}

impl From<std::io::Error> for PedalError {
    fn from(e: std::io::Error) -> Self {
        PedalError::Io(e)
    }
}

impl From<toml::de::Error> for PedalError {
    fn from(e: toml::de::Error) -> Self {
        PedalError::InvalidConfig(e.to_string())
    }
}

/// Result type for engine construction
pub type PedalResult<T> = Result<T, PedalError>;

/// A control value fell outside its binding's domain and was clamped
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfRangeWarning {
    pub binding: String,
    pub requested: f32,
    pub applied: f32,
}

impl fmt::Display for OutOfRangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} out of range, clamped to {}",
            self.binding, self.requested, self.applied
        )
    }
}

/// A collaborator did not supply a resource; the unit keeps running degraded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingResourceWarning {
    pub unit: String,
    pub resource: String,
}

impl fmt::Display for MissingResourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} unavailable", self.unit, self.resource)
    }
}

/// A control event no unit is listening for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnroutableControlEvent {
    /// No unit at this chain position
    Note(u8),
    /// No unit registered for continuous control
    Controller(u8),
}

impl fmt::Display for UnroutableControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnroutableControlEvent::Note(index) => write!(f, "no unit at index {}", index),
            UnroutableControlEvent::Controller(value) => {
                write!(f, "controller value {} has no listeners", value)
            }
        }
    }
}
