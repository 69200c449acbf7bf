//! Clean boost: one gain stage behind a hard bypass
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::ControlBinding;
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::nodes::gain::GainNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPedal {
    pub gain: f32,
    pub active: bool,
}

impl Default for BoostPedal {
    fn default() -> Self {
        Self {
            gain: 1.5,
            active: false,
        }
    }
}

impl Pedal for BoostPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Boost
    }

    fn label(&self) -> &'static str {
        "!important"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let boost = graph.add_node(GainNode::new(self.gain));
        graph.connect(input, boost)?;
        let (output, bypass) = BypassSwitch::hard(graph, input, boost, self.active)?;

        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::param("boost", graph.param(boost, "gain")?, 0.0..=3.0, 0.01)))
    }
}
