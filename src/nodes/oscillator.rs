/// Oscillator node - periodic waveform source
///
/// In a pedal graph oscillators run at sub-audio rates and drive parameters
/// (tremolo gain, chorus delay time). Frequency and waveform are both
/// parameters, so they can be bound to knobs and shared between oscillators.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};
use std::f32::consts::PI;

/// Waveform shapes, all starting at zero phase on a rising edge (except square)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Index used by the `waveform` parameter
    pub fn index(&self) -> usize {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Sawtooth => 2,
            Waveform::Triangle => 3,
        }
    }

    /// Nearest waveform for a parameter value (clamped)
    pub fn from_param(value: f32) -> Self {
        let index = value.round().clamp(0.0, 3.0) as usize;
        Self::ALL[index]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Value at `phase` in [0, 1)
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase + 0.5).fract() - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
        }
    }
}

/// Oscillator node: out = waveform(phase), phase advancing by frequency / sample_rate
///
/// # Example
/// ```ignore
/// // 3 Hz sine LFO, started half a cycle in
/// let lfo = graph.add_node(OscillatorNode::new(Waveform::Sine, 3.0).with_phase(0.5));
/// ```
pub struct OscillatorNode {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    stopped: bool,
}

impl OscillatorNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
            stopped: false,
        }
    }

    /// Start at a phase offset, in cycles (0.5 = 180 degrees)
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase.rem_euclid(1.0);
        self
    }

    /// Current phase in cycles
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl AudioNode for OscillatorNode {
    fn process(&mut self, _input: Frame, params: &[f32], context: &ProcessContext) -> Frame {
        if self.stopped {
            return Frame::SILENCE;
        }

        let frequency = params.first().copied().unwrap_or(self.frequency);
        let waveform = params
            .get(1)
            .map(|&w| Waveform::from_param(w))
            .unwrap_or(self.waveform);

        let value = waveform.sample(self.phase);
        self.phase = (self.phase + frequency / context.sample_rate).rem_euclid(1.0);
        Frame::mono(value)
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("frequency", self.frequency),
            ParamSpec::new("waveform", self.waveform.index() as f32),
        ]
    }

    fn name(&self) -> &str {
        "OscillatorNode"
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
