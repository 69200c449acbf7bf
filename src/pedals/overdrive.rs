//! Overdrive: wave-shaper soft clipping followed by a volume stage
//!
//! The drive knob does not scale a parameter; it rebuilds the whole shaper
//! curve and swaps it in.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::nodes::gain::GainNode;
use crate::nodes::waveshaper::{make_distortion_curve, CurveHandle, WaveShaperNode};
use crate::param::SharedParam;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverdrivePedal {
    pub drive: f32,
    pub volume: f32,
    pub active: bool,
}

impl Default for OverdrivePedal {
    fn default() -> Self {
        Self {
            drive: 15.0,
            volume: 1.0,
            active: false,
        }
    }
}

impl Pedal for OverdrivePedal {
    fn kind(&self) -> PedalKind {
        PedalKind::Overdrive
    }

    fn label(&self) -> &'static str {
        "Math.pow()"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let curve = CurveHandle::new(make_distortion_curve(self.drive));
        let shaper = graph.add_node(WaveShaperNode::new(curve.clone()));
        let volume = graph.add_node(GainNode::new(self.volume));
        graph.connect(input, shaper)?;
        graph.connect(shaper, volume)?;
        let (output, bypass) = BypassSwitch::hard(graph, input, volume, self.active)?;

        let drive = BindingTarget::Curve {
            curve,
            value: SharedParam::new(self.drive),
            build: make_distortion_curve,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::bind("drive", drive, 0.0..=100.0, 0.01))
            .bind(ControlBinding::param("volume", graph.param(volume, "gain")?, 0.0..=3.0, 0.01)))
    }
}
