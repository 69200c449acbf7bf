//! Wah: boosted band-pass whose centre frequency follows the expression pedal
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::ControlBinding;
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::nodes::biquad::{BiquadNode, FilterMode};
use crate::nodes::gain::GainNode;

pub const FILTER_MIN: f32 = 100.0;
pub const FILTER_MAX: f32 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WahPedal {
    pub frequency: f32,
    pub q: f32,
    pub boost: f32,
    pub active: bool,
}

impl Default for WahPedal {
    fn default() -> Self {
        Self {
            frequency: 1000.0,
            q: 1.0,
            boost: 1.5,
            active: false,
        }
    }
}

impl Pedal for WahPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Wah
    }

    fn label(&self) -> &'static str {
        ".filter()"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let sample_rate = graph.sample_rate();
        let boost = graph.add_node(GainNode::new(self.boost));
        let filter = graph.add_node(BiquadNode::new(
            FilterMode::Bandpass,
            sample_rate,
            self.frequency,
            self.q,
        ));
        graph.connect(input, boost)?;
        graph.connect(boost, filter)?;
        let (output, bypass) = BypassSwitch::hard(graph, input, filter, self.active)?;

        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind_continuous(ControlBinding::param(
                "filter",
                graph.param(filter, "frequency")?,
                FILTER_MIN..=FILTER_MAX,
                20.0,
            ))
            .bind(ControlBinding::param("q", graph.param(filter, "q")?, 0.001..=1000.0, 10.0))
            .bind(ControlBinding::param("boost", graph.param(boost, "gain")?, 0.0..=4.0, 0.01)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AudioGraph;
    use crate::impulse::NoImpulse;

    #[test]
    fn test_filter_follows_controller() {
        let mut graph = AudioGraph::new(44100.0);
        let input = graph.add_source();
        let mut context = BuildContext {
            graph: &mut graph,
            index: 1,
            impulses: &NoImpulse,
            max_loop_frames: 16,
        };
        let unit = WahPedal::default().build(&mut context, input).unwrap();

        let filter = unit.continuous_bindings().next().unwrap();
        assert_eq!(filter.name(), "filter");
        filter.apply_controller(64);
        assert!((filter.value() - 805.51).abs() < 0.01);
        assert!(!unit.is_active());
    }
}
