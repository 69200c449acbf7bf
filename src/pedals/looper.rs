//! Looper: record a phrase, loop it, layer overdubs on top
//!
//! The unit has no bypass. The live signal always passes straight through;
//! the tape's playback is added behind a volume control. Buttons reach the
//! tape through the unit's `LooperController`.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::ControlBinding;
use crate::error::PedalResult;
use crate::looper::LooperController;
use crate::nodes::gain::GainNode;
use crate::nodes::sum::SumNode;
use crate::nodes::tape::{TapeNode, TapeQueues};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPedal {
    pub volume: f32,
}

impl Default for LoopPedal {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

impl Pedal for LoopPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Loop
    }

    fn label(&self) -> &'static str {
        "for(loop)"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let max_frames = context.max_loop_frames;
        let graph = &mut *context.graph;
        let queues = TapeQueues::new();
        let tape = graph.add_node(TapeNode::new(queues.clone(), max_frames));
        let volume = graph.add_node(GainNode::new(self.volume));
        let output = graph.add_node(SumNode::named("looper-out"));

        graph.connect(input, output)?;
        graph.connect(input, tape)?;
        graph.connect(tape, volume)?;
        graph.connect(volume, output)?;
        debug!(max_frames, "looper tape allocated");

        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_looper(LooperController::new(queues))
            .bind(ControlBinding::param("volume", graph.param(volume, "gain")?, 0.0..=2.0, 0.01)))
    }
}
