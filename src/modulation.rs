//! Modulation sources: low-frequency oscillators driving parameters
//!
//! An LFO is an oscillator feeding a depth gain whose output is summed into
//! a parameter, so the parameter moves around its base value by
//! `± depth`. The oscillator is never connected to an audio output.

use crate::audio_node::NodeId;
use crate::error::PedalResult;
use crate::graph::AudioGraph;
use crate::nodes::gain::GainNode;
use crate::nodes::oscillator::{OscillatorNode, Waveform};
use crate::param::ParamRef;
use tracing::debug;

/// Starting values for an LFO
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoSettings {
    pub waveform: Waveform,
    /// Hz
    pub frequency: f32,
    /// Peak deviation added to the target, in the target's units
    pub depth: f32,
    /// Start phase in cycles
    pub phase: f32,
}

impl LfoSettings {
    pub fn sine(frequency: f32, depth: f32) -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency,
            depth,
            phase: 0.0,
        }
    }
}

/// Oscillator → depth → parameter
///
/// # Example
/// ```ignore
/// let gain = graph.param(tremolo, "gain")?;
/// let lfo = Lfo::attach(&mut graph, &gain, LfoSettings::sine(3.0, 0.5))?;
/// let speed = ControlBinding::param("speed", lfo.frequency().clone(), 0.0..=4.0, 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    oscillator: NodeId,
    depth_node: NodeId,
    frequency: ParamRef,
    depth: ParamRef,
    waveform: ParamRef,
}

impl Lfo {
    pub fn attach(graph: &mut AudioGraph, target: &ParamRef, settings: LfoSettings) -> PedalResult<Self> {
        let oscillator = graph.add_node(
            OscillatorNode::new(settings.waveform, settings.frequency).with_phase(settings.phase),
        );
        let depth_node = graph.add_node(GainNode::new(settings.depth));
        graph.connect(oscillator, depth_node)?;
        graph.connect_param(depth_node, target)?;
        debug!(
            target = target.name(),
            frequency = settings.frequency,
            depth = settings.depth,
            "LFO attached"
        );

        Ok(Self {
            oscillator,
            depth_node,
            frequency: graph.param(oscillator, "frequency")?,
            depth: graph.param(depth_node, "gain")?,
            waveform: graph.param(oscillator, "waveform")?,
        })
    }

    pub fn oscillator(&self) -> NodeId {
        self.oscillator
    }

    /// Node whose output is summed into the target
    pub fn depth_node(&self) -> NodeId {
        self.depth_node
    }

    pub fn frequency(&self) -> &ParamRef {
        &self.frequency
    }

    pub fn depth(&self) -> &ParamRef {
        &self.depth
    }

    pub fn waveform(&self) -> &ParamRef {
        &self.waveform
    }
}

/// Two LFOs half a cycle apart, locked to one frequency
///
/// Both oscillators read the same frequency storage, so they can never
/// drift apart. With equal depths and equal base values the two modulated
/// parameters always sum to the same constant.
#[derive(Debug, Clone)]
pub struct AntiphaseLfo {
    first: Lfo,
    second: Lfo,
}

impl AntiphaseLfo {
    pub fn attach(
        graph: &mut AudioGraph,
        first_target: &ParamRef,
        second_target: &ParamRef,
        settings: LfoSettings,
    ) -> PedalResult<Self> {
        let first = Lfo::attach(graph, first_target, settings)?;
        let opposite = LfoSettings {
            phase: settings.phase + 0.5,
            ..settings
        };
        let mut second = Lfo::attach(graph, second_target, opposite)?;

        graph.share_param(&second.frequency, &first.frequency)?;
        second.frequency = graph.param(second.oscillator, "frequency")?;
        Ok(Self { first, second })
    }

    pub fn first(&self) -> &Lfo {
        &self.first
    }

    pub fn second(&self) -> &Lfo {
        &self.second
    }

    /// Frequency shared by both oscillators
    pub fn frequency(&self) -> &ParamRef {
        &self.first.frequency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_node::Frame;
    use crate::block_processor::BlockProcessor;

    #[test]
    fn test_lfo_moves_param_around_base() {
        let mut graph = AudioGraph::new(1000.0);
        let gain = graph.add_node(GainNode::new(1.0));
        let param = graph.param(gain, "gain").unwrap();
        Lfo::attach(&mut graph, &param, LfoSettings::sine(5.0, 0.25)).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        for _ in 0..1000 {
            processor.process_frame(Frame::SILENCE);
            let value = processor.effective_param(&param);
            lowest = lowest.min(value);
            highest = highest.max(value);
        }
        assert!((highest - 1.25).abs() < 1e-3, "highest {}", highest);
        assert!((lowest - 0.75).abs() < 1e-3, "lowest {}", lowest);
    }

    #[test]
    fn test_oscillator_not_audible() {
        let mut graph = AudioGraph::new(1000.0);
        let source = graph.add_source();
        let gain = graph.add_node(GainNode::new(0.0));
        graph.connect(source, gain).unwrap();
        graph.set_output(gain).unwrap();
        let param = graph.param(gain, "gain").unwrap();
        let lfo = Lfo::attach(&mut graph, &param, LfoSettings::sine(5.0, 0.5)).unwrap();

        assert!(graph
            .connections()
            .iter()
            .filter(|c| c.source == lfo.oscillator())
            .all(|c| c.destination.node() == lfo.depth_node()));
    }

    #[test]
    fn test_antiphase_shares_frequency() {
        let mut graph = AudioGraph::new(1000.0);
        let a = graph.add_node(GainNode::new(0.5));
        let b = graph.add_node(GainNode::new(0.5));
        let pa = graph.param(a, "gain").unwrap();
        let pb = graph.param(b, "gain").unwrap();
        let pair = AntiphaseLfo::attach(&mut graph, &pa, &pb, LfoSettings::sine(4.0, 0.5)).unwrap();

        pair.frequency().set(6.5);
        assert_eq!(pair.second().frequency().get(), 6.5);

        let mut processor = BlockProcessor::new(graph).unwrap();
        for i in 0..2000 {
            processor.process_frame(Frame::SILENCE);
            let sum = processor.effective_param(&pa) + processor.effective_param(&pb);
            assert!((sum - 1.0).abs() < 1e-4, "frame {}: sum {}", i, sum);
        }
    }
}
