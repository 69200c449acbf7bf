/// Gain node - multiplies input signal by gain amount
///
/// Output = Input * gain. The gain follows its target through a one-pole
/// smoother with a 2 ms time constant, so switching a bypass or jumping a
/// knob never produces a step discontinuity in the output.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};

/// Smoothing time constant in seconds
const SMOOTHING_TIME: f32 = 0.002;

/// Gain node: out = input * gain
///
/// # Example
/// ```ignore
/// let dry = graph.add_node(GainNode::new(1.0));
/// graph.connect(input, dry)?;
/// graph.param(dry, "gain")?.set(0.0);   // fades out over ~2 ms
/// ```
pub struct GainNode {
    initial: f32,
    current: Option<f32>,
    coeff: f32,
    coeff_rate: f32,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            initial: gain,
            current: None,
            coeff: 1.0,
            coeff_rate: 0.0,
        }
    }

    /// Gain applied to the most recent frame
    pub fn current_gain(&self) -> f32 {
        self.current.unwrap_or(self.initial)
    }

    fn smoothing_coeff(&mut self, sample_rate: f32) -> f32 {
        if sample_rate != self.coeff_rate {
            self.coeff = 1.0 - (-1.0 / (SMOOTHING_TIME * sample_rate)).exp();
            self.coeff_rate = sample_rate;
        }
        self.coeff
    }
}

impl AudioNode for GainNode {
    fn process(&mut self, input: Frame, params: &[f32], context: &ProcessContext) -> Frame {
        let target = params.first().copied().unwrap_or(self.initial);
        let gain = match self.current {
            // First frame starts at the target, no fade-in
            None => target,
            Some(current) => {
                let coeff = self.smoothing_coeff(context.sample_rate);
                current + (target - current) * coeff
            }
        };
        self.current = Some(gain);
        input * gain
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("gain", self.initial)]
    }

    fn name(&self) -> &str {
        "GainNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_node_unity() {
        let mut gain = GainNode::new(1.0);
        let ctx = ProcessContext::new(44100.0);
        let out = gain.process(Frame::new(0.5, -0.3), &[1.0], &ctx);
        assert_eq!(out, Frame::new(0.5, -0.3));
    }

    #[test]
    fn test_gain_node_half_amplitude() {
        let mut gain = GainNode::new(0.5);
        let ctx = ProcessContext::new(44100.0);
        let out = gain.process(Frame::mono(1.0), &[0.5], &ctx);
        assert_eq!(out, Frame::mono(0.5));
    }

    #[test]
    fn test_gain_change_is_smoothed() {
        let mut gain = GainNode::new(1.0);
        let ctx = ProcessContext::new(44100.0);
        gain.process(Frame::mono(1.0), &[1.0], &ctx);

        // Jump to 0: the first frame after the change must not drop to 0
        let first = gain.process(Frame::mono(1.0), &[0.0], &ctx).left;
        assert!(first > 0.9, "gain dropped too fast: {}", first);

        // After 20 ms (10 time constants) it has settled
        let mut last = first;
        for _ in 0..882 {
            last = gain.process(Frame::mono(1.0), &[0.0], &ctx).left;
        }
        assert!(last < 1e-3, "gain did not settle: {}", last);
    }
}
