//! Tremolo: an LFO sweeping the gain of the wet path
//!
//! The wet gain swings between 0 and 1 (base 0.5, depth 0.5); the depth
//! knob cross-fades between the untouched signal and the modulated one.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::modulation::{Lfo, LfoSettings};
use crate::nodes::gain::GainNode;
use crate::nodes::oscillator::Waveform;
use crate::nodes::sum::SumNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TremoloPedal {
    pub speed: f32,
    pub depth: f32,
    pub wave: Waveform,
    pub active: bool,
}

impl Default for TremoloPedal {
    fn default() -> Self {
        Self {
            speed: 3.0,
            depth: 0.3,
            wave: Waveform::Sine,
            active: false,
        }
    }
}

impl Pedal for TremoloPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Tremolo
    }

    fn label(&self) -> &'static str {
        "<blink />"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let tremolo = graph.add_node(GainNode::new(0.5));
        let depth_in = graph.add_node(GainNode::new(1.0 - self.depth));
        let depth_out = graph.add_node(GainNode::new(self.depth));
        let sum = graph.add_node(SumNode::new());

        graph.connect(input, tremolo)?;
        graph.connect(tremolo, depth_out)?;
        graph.connect(depth_out, sum)?;
        graph.connect(input, depth_in)?;
        graph.connect(depth_in, sum)?;

        let tremolo_gain = graph.param(tremolo, "gain")?;
        let lfo = Lfo::attach(
            graph,
            &tremolo_gain,
            LfoSettings {
                waveform: self.wave,
                frequency: self.speed,
                depth: 0.5,
                phase: 0.0,
            },
        )?;
        let (output, bypass) = BypassSwitch::hard(graph, input, sum, self.active)?;

        let depth = BindingTarget::Complementary {
            dry: graph.param(depth_in, "gain")?,
            wet: graph.param(depth_out, "gain")?,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::param("speed", lfo.frequency().clone(), 0.0..=4.0, 0.01))
            .bind(ControlBinding::bind("depth", depth, 0.0..=1.0, 0.01))
            .bind(ControlBinding::param("wave", lfo.waveform().clone(), 0.0..=3.0, 1.0).with_conversion(f32::round)))
    }
}
