//! Harmonic tremolo: lows and highs pulsing against each other
//!
//! The signal is split into a high band (high-pass at 4 kHz) and a low band
//! (low-pass at 800 Hz). Each band has its own gain, swept by one of two
//! oscillators that run at the same frequency half a cycle apart. Both gains
//! sit at 0.5 ± 0.5, so while one band swells the other fades and their sum
//! stays at 1. The low band is polarity-inverted before its gain.
use super::{BuildContext, EffectUnit, Pedal, PedalKind};
use crate::audio_node::NodeId;
use crate::binding::{BindingTarget, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::PedalResult;
use crate::graph::AudioGraph;
use crate::modulation::{AntiphaseLfo, LfoSettings};
use crate::nodes::biquad::{BiquadNode, FilterMode};
use crate::nodes::gain::GainNode;
use crate::nodes::sum::SumNode;
use crate::param::ParamRef;

pub const HIGH_BAND_HZ: f32 = 4000.0;
pub const LOW_BAND_HZ: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicTremoloPedal {
    pub speed: f32,
    pub depth: f32,
    pub active: bool,
}

impl Default for HarmonicTremoloPedal {
    fn default() -> Self {
        Self {
            speed: 4.4,
            depth: 0.54,
            active: false,
        }
    }
}

/// The two modulated bands and their anti-phase LFO pair
#[derive(Debug, Clone)]
pub struct HarmonicBands {
    /// Sum of both bands
    pub output: NodeId,
    pub high_gain: ParamRef,
    pub low_gain: ParamRef,
    pub lfo: AntiphaseLfo,
}

/// Split `input` into two bands with anti-phase gain modulation at `speed` Hz
pub fn build_bands(graph: &mut AudioGraph, input: NodeId, speed: f32) -> PedalResult<HarmonicBands> {
    let sample_rate = graph.sample_rate();
    let high_pass = graph.add_node(BiquadNode::new(
        FilterMode::Highpass,
        sample_rate,
        HIGH_BAND_HZ,
        1.0,
    ));
    let low_pass = graph.add_node(BiquadNode::new(
        FilterMode::Lowpass,
        sample_rate,
        LOW_BAND_HZ,
        1.0,
    ));
    let high_out = graph.add_node(GainNode::new(0.5));
    let low_phase = graph.add_node(GainNode::new(-1.0));
    let low_out = graph.add_node(GainNode::new(0.5));
    let output = graph.add_node(SumNode::named("bands"));

    graph.connect(input, high_pass)?;
    graph.connect(high_pass, high_out)?;
    graph.connect(high_out, output)?;
    graph.connect(input, low_pass)?;
    graph.connect(low_pass, low_phase)?;
    graph.connect(low_phase, low_out)?;
    graph.connect(low_out, output)?;

    let high_gain = graph.param(high_out, "gain")?;
    let low_gain = graph.param(low_out, "gain")?;
    let lfo = AntiphaseLfo::attach(graph, &high_gain, &low_gain, LfoSettings::sine(speed, 0.5))?;

    Ok(HarmonicBands {
        output,
        high_gain,
        low_gain,
        lfo,
    })
}

impl Pedal for HarmonicTremoloPedal {
    fn kind(&self) -> PedalKind {
        PedalKind::HarmonicTremolo
    }

    fn label(&self) -> &'static str {
        "rotate(180deg)"
    }

    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit> {
        let graph = &mut *context.graph;
        let pass_through = graph.add_node(GainNode::new(1.0 - self.depth));
        let band_level = graph.add_node(GainNode::new(self.depth));
        let sum = graph.add_node(SumNode::new());

        let bands = build_bands(graph, input, self.speed)?;
        graph.connect(input, pass_through)?;
        graph.connect(pass_through, sum)?;
        graph.connect(bands.output, band_level)?;
        graph.connect(band_level, sum)?;
        let (output, bypass) = BypassSwitch::hard(graph, input, sum, self.active)?;

        let depth = BindingTarget::Complementary {
            dry: graph.param(pass_through, "gain")?,
            wet: graph.param(band_level, "gain")?,
        };
        Ok(EffectUnit::new(self.kind(), self.label(), context.index, input, output)
            .with_bypass(bypass)
            .bind(ControlBinding::param("speed", bands.lfo.frequency().clone(), 0.0..=8.0, 0.01))
            .bind(ControlBinding::bind("depth", depth, 0.0..=1.0, 0.01)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_node::Frame;
    use crate::block_processor::BlockProcessor;

    #[test]
    fn test_low_band_is_inverted() {
        let mut graph = AudioGraph::new(44100.0);
        let input = graph.add_source();
        // Frozen LFOs: both gains rest at 0.5
        let bands = build_bands(&mut graph, input, 0.0).unwrap();
        graph.set_output(bands.output).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        let mut out = Frame::SILENCE;
        for _ in 0..4410 {
            out = processor.process_frame(Frame::mono(1.0));
        }
        // DC only passes the low band
        assert!((out.left + 0.5).abs() < 0.01, "expected -0.5, got {}", out.left);
    }
}
