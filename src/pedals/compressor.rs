//! Compressor: parallel compression, dry and compressed signals mixed
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::nodes::compressor::CompressorNode;
use crate::nodes::gain::GainNode;
use crate::nodes::sum::SumNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorPedal {
    pub mix: f32,
    pub threshold: f32,
    pub attack: f32,
    pub release: f32,
    pub active: bool,
}

impl Default for CompressorPedal {
    fn default() -> Self {
        Self {
            mix: 0.85,
            threshold: -30.0,
            attack: 0.1,
            release: 0.5,
            active: true,
        }
    }
}

impl Pedal for CompressorPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Compressor
    }

    fn label(&self) -> &'static str {
        "Smoosh"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let compressor = graph.add_node(CompressorNode::new());
        let mix_in = graph.add_node(GainNode::new(1.0 - self.mix));
        let mix_out = graph.add_node(GainNode::new(self.mix));
        let sum = graph.add_node(SumNode::new());

        let threshold = graph.param(compressor, "threshold")?;
        let attack = graph.param(compressor, "attack")?;
        let release = graph.param(compressor, "release")?;
        threshold.set(self.threshold);
        attack.set(self.attack);
        release.set(self.release);

        graph.connect(input, compressor)?;
        graph.connect(compressor, mix_out)?;
        graph.connect(mix_out, sum)?;
        graph.connect(input, mix_in)?;
        graph.connect(mix_in, sum)?;
        let (output, bypass) = BypassSwitch::hard(graph, input, sum, self.active)?;

        let mix = BindingTarget::Complementary {
            dry: graph.param(mix_in, "gain")?,
            wet: graph.param(mix_out, "gain")?,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::bind("mix", mix, 0.0..=1.0, 0.01))
            .bind(ControlBinding::param("threshold", threshold, -100.0..=0.0, 1.0))
            .bind(ControlBinding::param("attack", attack, 0.0..=1.0, 0.01))
            .bind(ControlBinding::param("release", release, 0.0..=1.0, 0.01)))
    }
}
