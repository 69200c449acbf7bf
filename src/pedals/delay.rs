//! Delay: filtered echo with feedback, tails ring out after bypass
//!
//! ```text
//! send ─┬──────────────────────────────► return
//!       └► tone ─► delay ─┬► mix ───────► return
//!                  ▲      │
//!                  └ feedback ◄┘
//! ```
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::ControlBinding;
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::nodes::biquad::{BiquadNode, FilterMode};
use crate::nodes::delay::DelayNode;
use crate::nodes::gain::GainNode;

pub const MAX_DELAY: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayPedal {
    pub tone: f32,
    pub speed: f32,
    pub mix: f32,
    pub feedback: f32,
    pub active: bool,
}

impl Default for DelayPedal {
    fn default() -> Self {
        Self {
            tone: 3200.0,
            speed: 0.45,
            mix: 0.3,
            feedback: 0.4,
            active: true,
        }
    }
}

impl Pedal for DelayPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Delay
    }

    fn label(&self) -> &'static str {
        "setTimeout"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let sample_rate = graph.sample_rate();
        let (ports, bypass) = BypassSwitch::tailed(graph, input, self.active)?;

        let filter = graph.add_node(BiquadNode::new(
            FilterMode::Lowpass,
            sample_rate,
            self.tone,
            1.0,
        ));
        let delay = graph.add_node(DelayNode::new(sample_rate, MAX_DELAY, self.speed));
        let feedback = graph.add_node(GainNode::new(self.feedback));
        let mix = graph.add_node(GainNode::new(self.mix));

        graph.connect(ports.send, ports.ret)?;
        graph.connect(ports.send, filter)?;
        graph.connect(filter, delay)?;
        graph.connect(delay, feedback)?;
        graph.connect(feedback, delay)?;
        graph.connect(delay, mix)?;
        graph.connect(mix, ports.ret)?;

        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, ports.output)
            .with_bypass(bypass)
            .bind(ControlBinding::param("mix", graph.param(mix, "gain")?, 0.0..=1.0, 0.01))
            .bind(ControlBinding::param("feedback", graph.param(feedback, "gain")?, 0.0..=0.7, 0.01))
            .bind(ControlBinding::param("speed", graph.param(delay, "delay_time")?, 0.0..=MAX_DELAY, 0.01))
            .bind(ControlBinding::param("tone", graph.param(filter, "frequency")?, 200.0..=6000.0, 200.0)))
    }
}
