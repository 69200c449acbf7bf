//! Multi-head delay: four tape heads sharing one send and return
//!
//! Each head is a complete echo with its own time, feedback, chorus wobble,
//! two-band EQ, level, pan and on switch:
//!
//! ```text
//! send ─► gate ─► delay ─► chorus ─► low shelf ─► high shelf ─┬─► mix ─► pan ─► return
//!          ▲                   ▲                              │
//!          │                  LFO                             │
//!          └────────────────── feedback ◄─────────────────────┘
//! ```
//!
//! The chorus is a 60 ms inline delay wobbled by the LFO, so every echo
//! lands at head time + 60 ms. Only the head delay closes the feedback
//! loop: a head whose base time is zero has no delay stage at all, and
//! assembly fails with a `GraphCycleError`.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::ControlBinding;
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::graph::AudioGraph;
use crate::modulation::{Lfo, LfoSettings};
use crate::nodes::biquad::{BiquadNode, FilterMode};
use crate::nodes::delay::DelayNode;
use crate::nodes::gain::GainNode;
use crate::nodes::pan::PanNode;
use crate::nodes::sum::SumNode;
use tracing::debug;

pub const MAX_DELAY: f32 = 1.5;
/// Base time of the chorus stage in seconds
pub const CHORUS_DELAY: f32 = 0.06;
const CHORUS_MAX_DELAY: f32 = 0.1;
const LOW_SHELF_HZ: f32 = 500.0;
const HIGH_SHELF_HZ: f32 = 1500.0;

/// Settings of one head
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSettings {
    pub pan: f32,
    /// Base delay time in seconds
    pub delay_time: f32,
    pub feedback: f32,
    pub mix: f32,
    /// Low-shelf gain in dB
    pub lows: f32,
    /// High-shelf gain in dB
    pub highs: f32,
    /// Chorus delay-time swing in seconds
    pub depth: f32,
    /// Chorus rate in Hz
    pub rate: f32,
    pub on: bool,
}

impl HeadSettings {
    pub fn new(pan: f32, delay_time: f32, feedback: f32) -> Self {
        Self {
            pan,
            delay_time,
            feedback,
            mix: 0.3,
            lows: -1.0,
            highs: 1.0,
            depth: 0.0005,
            rate: 0.5,
            on: true,
        }
    }
}

/// A head's bindings in table order, each flagged if it follows the
/// expression pedal
pub struct DelayHead {
    pub delay: Option<NodeId>,
    pub output: NodeId,
    pub bindings: Vec<(ControlBinding, bool)>,
}

/// Build head number `number` (1-based) between `send` and `ret`
pub fn build_head(
    graph: &mut AudioGraph,
    send: NodeId,
    ret: NodeId,
    number: usize,
    settings: &HeadSettings,
) -> PedalResult<DelayHead> {
    let sample_rate = graph.sample_rate();
    let name = |control: &str| format!("head{}.{}", number, control);

    let gate = graph.add_node(GainNode::new(if settings.on { 1.0 } else { 0.0 }));
    let delay = if settings.delay_time > 0.0 {
        Some(graph.add_node(DelayNode::new(sample_rate, MAX_DELAY, settings.delay_time)))
    } else {
        None
    };
    let delay_stage = match delay {
        Some(delay) => delay,
        None => graph.add_node(SumNode::named("head-without-delay")),
    };
    let chorus_delay = graph.add_node(DelayNode::inline(sample_rate, CHORUS_MAX_DELAY, CHORUS_DELAY));
    let low = graph.add_node(BiquadNode::shelf(
        FilterMode::Lowshelf,
        sample_rate,
        LOW_SHELF_HZ,
        settings.lows,
    ));
    let high = graph.add_node(BiquadNode::shelf(
        FilterMode::Highshelf,
        sample_rate,
        HIGH_SHELF_HZ,
        settings.highs,
    ));
    let feedback = graph.add_node(GainNode::new(settings.feedback));
    let mix = graph.add_node(GainNode::new(settings.mix));
    let pan = graph.add_node(PanNode::new(settings.pan));

    graph.connect(send, gate)?;
    graph.connect(gate, delay_stage)?;
    graph.connect(delay_stage, chorus_delay)?;
    graph.connect(chorus_delay, low)?;
    graph.connect(low, high)?;
    graph.connect(high, mix)?;
    graph.connect(mix, pan)?;
    graph.connect(pan, ret)?;
    graph.connect(high, feedback)?;
    graph.connect(feedback, gate)?;

    let chorus_time = graph.param(chorus_delay, "delay_time")?;
    let chorus = Lfo::attach(graph, &chorus_time, LfoSettings::sine(settings.rate, settings.depth))?;

    let mut bindings = Vec::new();
    if let Some(delay) = delay {
        let delay_time = graph.param(delay, "delay_time")?;
        bindings.push((ControlBinding::param(name("speed"), delay_time, 0.0..=MAX_DELAY, 0.01), false));
    }
    bindings.push((ControlBinding::param(name("feedback"), graph.param(feedback, "gain")?, 0.0..=1.0, 0.01), false));
    bindings.push((
        ControlBinding::param(name("depth"), chorus.depth().clone(), 0.000_000_5..=0.005, 0.0001),
        false,
    ));
    bindings.push((ControlBinding::param(name("rate"), chorus.frequency().clone(), 0.0..=4.0, 0.1), true));
    bindings.push((ControlBinding::param(name("bass"), graph.param(low, "gain")?, -4.0..=5.0, 0.25), false));
    bindings.push((ControlBinding::param(name("treble"), graph.param(high, "gain")?, -4.0..=5.0, 0.25), false));
    bindings.push((ControlBinding::param(name("pan"), graph.param(pan, "pan")?, -1.0..=1.0, 0.05), false));
    bindings.push((ControlBinding::param(name("mix"), graph.param(mix, "gain")?, 0.0..=1.0, 0.05), false));
    bindings.push((ControlBinding::switch(name("on"), graph.param(gate, "gain")?), false));

    debug!(head = number, delay_time = settings.delay_time, pan = settings.pan, "delay head built");
    Ok(DelayHead {
        delay,
        output: pan,
        bindings,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiheadDelayPedal {
    pub heads: Vec<HeadSettings>,
    pub active: bool,
}

impl Default for MultiheadDelayPedal {
    fn default() -> Self {
        Self {
            heads: vec![
                HeadSettings::new(1.0, 0.300, 0.5),
                HeadSettings::new(-1.0, 0.463, 0.5),
                HeadSettings::new(0.5, 0.975_61, 0.2),
                HeadSettings::new(-0.5, 0.4878, 0.2),
            ],
            active: true,
        }
    }
}

impl Pedal for MultiheadDelayPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::MultiheadDelay
    }

    fn label(&self) -> &'static str {
        "setInterval"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let (ports, bypass) = BypassSwitch::tailed(graph, input, self.active)?;
        graph.connect(ports.send, ports.ret)?;

        let mut unit = EffectUnit::new(self.kind(), self.label(), context.index, input, ports.output)
            .with_bypass(bypass);
        for (i, settings) in self.heads.iter().enumerate() {
            let head = build_head(graph, ports.send, ports.ret, i + 1, settings)?;
            for (binding, continuous) in head.bindings {
                unit = if continuous {
                    unit.bind_continuous(binding)
                } else {
                    unit.bind(binding)
                };
            }
        }
        Ok(unit)
    }
}
