/// Sum node - unity bus
///
/// Every connection into a node is already summed by the processor, so a bus
/// only has to pass its input through. Used for external sources, send and
/// return points and the merge stage of bypass switches.
use crate::audio_node::{AudioNode, Frame, ProcessContext};

pub struct SumNode {
    name: &'static str,
}

impl SumNode {
    pub fn new() -> Self {
        Self { name: "SumNode" }
    }

    /// Bus with a descriptive name for debugging
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for SumNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for SumNode {
    fn process(&mut self, input: Frame, _params: &[f32], _context: &ProcessContext) -> Frame {
        input
    }

    fn name(&self) -> &str {
        self.name
    }
}
