//! Reverb: convolution with an impulse response, tone-filtered and mixed
//!
//! The impulse response comes from the board's `ImpulseProvider`. Without
//! one the wet path is silent and the unit passes the dry share only.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::{MissingResourceWarning, PedalResult};
use crate::nodes::biquad::{BiquadNode, FilterMode};
use crate::nodes::convolver::ConvolverNode;
use crate::nodes::gain::GainNode;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbPedal {
    pub mix: f32,
    pub tone: f32,
    pub active: bool,
}

impl Default for ReverbPedal {
    fn default() -> Self {
        Self {
            mix: 0.35,
            tone: 4000.0,
            active: true,
        }
    }
}

impl Pedal for ReverbPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Reverb
    }

    fn label(&self) -> &'static str {
        "spacer.gif"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let sample_rate = context.sample_rate();
        let impulse = context.impulses.impulse(sample_rate);
        match &impulse {
            Some(ir) => info!(name = %ir.name, seconds = ir.duration(), "reverb impulse loaded"),
            None => warn!(
                "{}",
                MissingResourceWarning {
                    unit: self.kind().name().to_string(),
                    resource: "impulse response".to_string(),
                }
            ),
        }

        let graph = &mut *context.graph;
        let (ports, bypass) = BypassSwitch::tailed(graph, input, self.active)?;
        let reverb = graph.add_node(ConvolverNode::new(impulse.map(|ir| ir.samples)));
        let tone = graph.add_node(BiquadNode::new(
            FilterMode::Lowpass,
            sample_rate,
            self.tone,
            1.0,
        ));
        let mix_in = graph.add_node(GainNode::new(1.0 - self.mix));
        let mix_out = graph.add_node(GainNode::new(self.mix));

        graph.connect(ports.send, mix_in)?;
        graph.connect(mix_in, ports.ret)?;
        graph.connect(ports.send, reverb)?;
        graph.connect(reverb, tone)?;
        graph.connect(tone, mix_out)?;
        graph.connect(mix_out, ports.ret)?;

        let mix = BindingTarget::Complementary {
            dry: graph.param(mix_in, "gain")?,
            wet: graph.param(mix_out, "gain")?,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, ports.output)
            .with_bypass(bypass)
            .bind(ControlBinding::bind("mix", mix, 0.0..=1.0, 0.01))
            .bind(ControlBinding::param("tone", graph.param(tone, "frequency")?, 200.0..=6000.0, 200.0)))
    }
}
