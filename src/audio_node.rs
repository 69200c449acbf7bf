/// Frame-based audio processing - core abstraction for pedal graphs
///
/// This module defines the AudioNode trait. Every node renders one stereo
/// frame per call so that feedback loops through delay lines resolve at
/// single-sample granularity, the way analog pedals behave.
use std::ops::{Add, AddAssign, Mul};

pub type NodeId = usize;

/// One stereo sample pair
///
/// Mono sources write the same value to both channels. Parameter
/// (modulation) connections read the mono mix of their source frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const SILENCE: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Duplicate a mono sample to both channels
    pub fn mono(value: f32) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Mono mix (l + r) / 2
    pub fn mix(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Larger absolute value of the two channels
    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, rhs: f32) -> Frame {
        Frame::new(self.left * rhs, self.right * rhs)
    }
}

/// Context passed to all nodes during processing
#[derive(Debug, Clone)]
pub struct ProcessContext {
    /// Sample rate (usually 44100.0 Hz)
    pub sample_rate: f32,

    /// Frames rendered since the processor started
    pub frame_index: u64,
}

impl ProcessContext {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frame_index: 0,
        }
    }
}

/// Name and starting value of one node parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub value: f32,
}

impl ParamSpec {
    pub const fn new(name: &'static str, value: f32) -> Self {
        Self { name, value }
    }
}

/// Core trait for frame-based audio processing
///
/// Nodes never see their neighbours. The processor sums every audio
/// connection into `input` and hands over the effective parameter values
/// (base value plus any modulation summed into it) for this frame.
pub trait AudioNode: Send {
    /// Render one frame
    ///
    /// # Arguments
    /// * `input` - Sum of all audio connections into this node. Always
    ///   silence for delay-providing nodes, which receive their input in
    ///   [`AudioNode::commit`] instead.
    /// * `params` - Effective parameter values, in the order of [`AudioNode::params`]
    /// * `context` - Sample rate and frame counter
    ///
    /// Must not allocate or block.
    fn process(&mut self, input: Frame, params: &[f32], context: &ProcessContext) -> Frame;

    /// Named parameters exposed by this node, with their starting values
    ///
    /// Called once when the node is added to a graph.
    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Get a human-readable name for this node (for debugging)
    fn name(&self) -> &str {
        "AudioNode"
    }

    /// Returns true if this node provides delay (can break feedback cycles)
    ///
    /// The output of a delay-providing node for the current frame depends only
    /// on input it received in earlier frames. Connections into its audio
    /// input therefore do not create a same-frame dependency, which lets
    /// feedback loops close through it.
    ///
    /// Default implementation returns false (most nodes don't provide delay).
    fn provides_delay(&self) -> bool {
        false
    }

    /// Receive this frame's input after every node has been processed
    ///
    /// Only called on delay-providing nodes.
    fn commit(&mut self, _input: Frame, _params: &[f32], _context: &ProcessContext) {}

    /// Silence the node permanently (chain teardown)
    fn stop(&mut self) {}
}
