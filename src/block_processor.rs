/// Frame-accurate pedal graph processor (render-thread side)
///
/// `BlockProcessor` takes ownership of the nodes of a finished `AudioGraph`
/// and renders blocks of stereo frames. Within each frame:
/// 1. Nodes run in the topological order of immediate connections.
///    Each node receives the sum of its audio inputs, and parameters receive
///    base value + mono sum of their modulators.
/// 2. Delay-providing nodes then `commit` the input they were fed this frame,
///    which their output will reflect from the next frame on.
///
/// Nothing here allocates, locks or logs.
use crate::audio_node::{AudioNode, Frame, NodeId, ProcessContext};
use crate::dependency_graph::DependencyGraph;
use crate::error::{GraphCycleError, PedalResult};
use crate::graph::{AudioGraph, Destination};
use crate::param::{ParamRef, SharedParam};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared run flag; clearing it tears the chain down
#[derive(Clone, Debug)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame-accurate graph processor
///
/// # Example
/// ```ignore
/// let mut graph = AudioGraph::new(44100.0);
/// let source = graph.add_source();
/// let gain = graph.add_node(GainNode::new(0.5));
/// graph.connect(source, gain)?;
/// graph.set_output(gain)?;
///
/// let mut processor = BlockProcessor::new(graph)?;
/// let mut output = vec![Frame::SILENCE; 512];
/// processor.process_block(&input, &mut output);
/// ```
pub struct BlockProcessor {
    nodes: Vec<Box<dyn AudioNode>>,
    params: Vec<Vec<SharedParam>>,
    /// Per node: nodes summed into its audio input
    audio_inputs: Vec<Vec<NodeId>>,
    /// Per node, per parameter: nodes summed into that parameter
    param_inputs: Vec<Vec<Vec<NodeId>>>,
    is_source: Vec<bool>,
    provides_delay: Vec<bool>,
    execution_order: Vec<NodeId>,
    delay_nodes: Vec<NodeId>,
    outputs: Vec<Frame>,
    effective: Vec<Vec<f32>>,
    output_node: Option<NodeId>,
    context: ProcessContext,
    running: RunFlag,
    stopped: bool,
}

impl BlockProcessor {
    /// Take over a finished graph
    ///
    /// # Errors
    /// `GraphCycle` if the graph somehow contains a zero-delay loop
    /// (cannot happen for graphs built through `AudioGraph::connect`).
    pub fn new(graph: AudioGraph) -> PedalResult<Self> {
        Self::with_run_flag(graph, RunFlag::new())
    }

    pub fn with_run_flag(graph: AudioGraph, running: RunFlag) -> PedalResult<Self> {
        let deps = DependencyGraph::build(&graph.delay_flags, &graph.connections);
        let execution_order = deps.execution_order().map_err(|node| {
            GraphCycleError {
                from: node,
                to: node,
                from_name: graph.node_name(node).to_string(),
                to_name: graph.node_name(node).to_string(),
            }
        })?;

        let sample_rate = graph.sample_rate();
        let count = graph.slots.len();
        let mut audio_inputs = vec![Vec::new(); count];
        let mut param_inputs: Vec<Vec<Vec<NodeId>>> = graph
            .slots
            .iter()
            .map(|slot| vec![Vec::new(); slot.params.len()])
            .collect();

        for connection in &graph.connections {
            match connection.destination {
                Destination::Input(node) => audio_inputs[node].push(connection.source),
                Destination::Param { node, index } => {
                    param_inputs[node][index].push(connection.source)
                }
            }
        }

        let mut is_source = vec![false; count];
        for &source in &graph.sources {
            is_source[source] = true;
        }

        let delay_nodes = (0..count).filter(|&id| graph.delay_flags[id]).collect();
        let provides_delay = graph.delay_flags;
        let output_node = graph.output;

        let mut nodes = Vec::with_capacity(count);
        let mut params = Vec::with_capacity(count);
        let mut effective = Vec::with_capacity(count);
        for slot in graph.slots {
            effective.push(slot.params.iter().map(|p| p.get()).collect());
            params.push(slot.params);
            nodes.push(slot.node);
        }

        Ok(Self {
            nodes,
            params,
            audio_inputs,
            param_inputs,
            is_source,
            provides_delay,
            execution_order,
            delay_nodes,
            outputs: vec![Frame::SILENCE; count],
            effective,
            output_node,
            context: ProcessContext::new(sample_rate),
            running,
            stopped: false,
        })
    }

    /// Render `output.len()` frames; `input` is the external source signal
    ///
    /// A short `input` is padded with silence. With no source connected, or
    /// after the run flag is cleared, the output is silence.
    pub fn process_block(&mut self, input: &[Frame], output: &mut [Frame]) {
        for (i, out) in output.iter_mut().enumerate() {
            let frame = input.get(i).copied().unwrap_or(Frame::SILENCE);
            *out = self.process_frame(frame);
        }
    }

    /// Render a single frame
    pub fn process_frame(&mut self, input: Frame) -> Frame {
        if !self.running.is_running() {
            if !self.stopped {
                for node in self.nodes.iter_mut() {
                    node.stop();
                }
                self.stopped = true;
            }
            return Frame::SILENCE;
        }

        for &id in &self.execution_order {
            // Base value + modulation
            for (index, value) in self.effective[id].iter_mut().enumerate() {
                let modulation: f32 = self.param_inputs[id][index]
                    .iter()
                    .map(|&src| self.outputs[src].mix())
                    .sum();
                *value = self.params[id][index].get() + modulation;
            }

            let node_input = if self.provides_delay[id] {
                Frame::SILENCE
            } else {
                self.sum_inputs(id, input)
            };

            self.outputs[id] = self.nodes[id].process(node_input, &self.effective[id], &self.context);
        }

        for i in 0..self.delay_nodes.len() {
            let id = self.delay_nodes[i];
            let node_input = self.sum_inputs(id, input);
            self.nodes[id].commit(node_input, &self.effective[id], &self.context);
        }

        self.context.frame_index += 1;
        match self.output_node {
            Some(id) => self.outputs[id],
            None => Frame::SILENCE,
        }
    }

    fn sum_inputs(&self, id: NodeId, external: Frame) -> Frame {
        let mut sum = if self.is_source[id] {
            external
        } else {
            Frame::SILENCE
        };
        for &src in &self.audio_inputs[id] {
            sum += self.outputs[src];
        }
        sum
    }

    /// Output of a node in the most recent frame
    pub fn output_of(&self, node: NodeId) -> Frame {
        self.outputs.get(node).copied().unwrap_or(Frame::SILENCE)
    }

    /// Base + modulation of a parameter in the most recent frame
    pub fn effective_param(&self, param: &ParamRef) -> f32 {
        self.effective
            .get(param.node())
            .and_then(|values| values.get(param.index()))
            .copied()
            .unwrap_or_else(|| param.get())
    }

    pub fn execution_order(&self) -> &[NodeId] {
        &self.execution_order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.context.sample_rate
    }

    pub fn run_flag(&self) -> RunFlag {
        self.running.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::delay::DelayNode;
    use crate::nodes::gain::GainNode;
    use crate::nodes::oscillator::{OscillatorNode, Waveform};

    #[test]
    fn test_source_through_gain() {
        let mut graph = AudioGraph::new(44100.0);
        let source = graph.add_source();
        let gain = graph.add_node(GainNode::new(0.5));
        graph.connect(source, gain).unwrap();
        graph.set_output(gain).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        let out = processor.process_frame(Frame::mono(0.8));
        assert!((out.left - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_fan_in_sums() {
        let mut graph = AudioGraph::new(44100.0);
        let source = graph.add_source();
        let a = graph.add_node(GainNode::new(0.25));
        let b = graph.add_node(GainNode::new(0.5));
        let bus = graph.add_node(crate::nodes::sum::SumNode::new());
        graph.connect(source, a).unwrap();
        graph.connect(source, b).unwrap();
        graph.connect(a, bus).unwrap();
        graph.connect(b, bus).unwrap();
        graph.set_output(bus).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        let out = processor.process_frame(Frame::mono(1.0));
        assert!((out.left - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_feedback_echo_decays() {
        // source → delay ⇄ feedback(0.5), delay → out
        let mut graph = AudioGraph::new(1000.0);
        let source = graph.add_source();
        let delay = graph.add_node(DelayNode::new(1000.0, 0.1, 0.01));
        let feedback = graph.add_node(GainNode::new(0.5));
        graph.connect(source, delay).unwrap();
        graph.connect(delay, feedback).unwrap();
        graph.connect(feedback, delay).unwrap();
        graph.set_output(delay).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        let mut input = vec![Frame::SILENCE; 40];
        input[0] = Frame::mono(1.0);
        let mut output = vec![Frame::SILENCE; 40];
        processor.process_block(&input, &mut output);

        // Echoes every 10 samples, halving each time
        assert!((output[10].left - 1.0).abs() < 1e-3, "first echo: {}", output[10].left);
        assert!((output[20].left - 0.5).abs() < 1e-3, "second echo: {}", output[20].left);
        assert!((output[30].left - 0.25).abs() < 1e-3, "third echo: {}", output[30].left);
    }

    #[test]
    fn test_modulation_adds_to_base() {
        let mut graph = AudioGraph::new(4.0);
        let lfo = graph.add_node(OscillatorNode::new(Waveform::Square, 1.0));
        let gain = graph.add_node(GainNode::new(0.5));
        let param = graph.param(gain, "gain").unwrap();
        graph.connect_param(lfo, &param).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        processor.process_frame(Frame::SILENCE);
        assert!((processor.effective_param(&param) - 1.5).abs() < 1e-6);
        assert_eq!(param.get(), 0.5);
    }

    #[test]
    fn test_stop_silences_and_stops_nodes() {
        let mut graph = AudioGraph::new(1000.0);
        let osc = graph.add_node(OscillatorNode::new(Waveform::Square, 10.0));
        graph.set_output(osc).unwrap();

        let mut processor = BlockProcessor::new(graph).unwrap();
        assert_eq!(processor.process_frame(Frame::SILENCE).left, 1.0);

        processor.run_flag().stop();
        assert_eq!(processor.process_frame(Frame::SILENCE), Frame::SILENCE);
        assert!(processor.is_stopped());
    }
}
