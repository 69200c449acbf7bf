//! Chorus: a short delay whose time wobbles around 10 ms
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::modulation::{Lfo, LfoSettings};
use crate::nodes::delay::DelayNode;
use crate::nodes::gain::GainNode;
use crate::nodes::sum::SumNode;

/// Centre delay time in seconds
pub const BASE_DELAY: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusPedal {
    pub mix: f32,
    pub speed: f32,
    /// Delay-time swing in seconds
    pub depth: f32,
    pub active: bool,
}

impl Default for ChorusPedal {
    fn default() -> Self {
        Self {
            mix: 0.3,
            speed: 1.0,
            depth: 0.0005,
            active: false,
        }
    }
}

impl Pedal for ChorusPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Chorus
    }

    fn label(&self) -> &'static str {
        "float"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let sample_rate = graph.sample_rate();
        let mix_in = graph.add_node(GainNode::new(1.0 - self.mix));
        let mix_out = graph.add_node(GainNode::new(self.mix));
        let delay = graph.add_node(DelayNode::new(sample_rate, 2.0 * BASE_DELAY, BASE_DELAY));
        let sum = graph.add_node(SumNode::new());

        graph.connect(input, mix_in)?;
        graph.connect(mix_in, sum)?;
        graph.connect(input, delay)?;
        graph.connect(delay, mix_out)?;
        graph.connect(mix_out, sum)?;

        let delay_time = graph.param(delay, "delay_time")?;
        let lfo = Lfo::attach(graph, &delay_time, LfoSettings::sine(self.speed, self.depth))?;
        let (output, bypass) = BypassSwitch::hard(graph, input, sum, self.active)?;

        let mix = BindingTarget::Complementary {
            dry: graph.param(mix_in, "gain")?,
            wet: graph.param(mix_out, "gain")?,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::bind("mix", mix, 0.0..=0.5, 0.01))
            .bind(ControlBinding::param("speed", lfo.frequency().clone(), 0.0..=4.0, 0.01))
            .bind(ControlBinding::param("depth", lfo.depth().clone(), 0.0..=0.005, 0.0001)))
    }
}
