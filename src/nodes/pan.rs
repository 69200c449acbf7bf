/// Pan node - equal-power stereo panner
///
/// Uses the stereo panning law of the Web Audio `StereoPannerNode`: the
/// channel on the far side is folded into the near side with cos/sin gains,
/// so a centred pan passes stereo input unchanged and a hard pan puts the
/// whole signal into one channel.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};
use std::f32::consts::FRAC_PI_2;

pub struct PanNode {
    pan: f32,
}

impl PanNode {
    /// `pan` in [-1 (left), 1 (right)]
    pub fn new(pan: f32) -> Self {
        Self { pan }
    }
}

/// Apply the panning law to one frame
pub fn pan_frame(input: Frame, pan: f32) -> Frame {
    let pan = pan.clamp(-1.0, 1.0);
    if pan <= 0.0 {
        let x = (pan + 1.0) * FRAC_PI_2;
        Frame::new(input.left + input.right * x.cos(), input.right * x.sin())
    } else {
        let x = pan * FRAC_PI_2;
        Frame::new(input.left * x.cos(), input.right + input.left * x.sin())
    }
}

impl AudioNode for PanNode {
    fn process(&mut self, input: Frame, params: &[f32], _context: &ProcessContext) -> Frame {
        pan_frame(input, params.first().copied().unwrap_or(self.pan))
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("pan", self.pan)]
    }

    fn name(&self) -> &str {
        "PanNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_transparent() {
        let out = pan_frame(Frame::new(0.3, -0.2), 0.0);
        assert!((out.left - 0.3).abs() < 1e-6);
        assert!((out.right + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_hard_pans() {
        let right = pan_frame(Frame::mono(1.0), 1.0);
        assert!(right.left.abs() < 1e-6);
        assert!((right.right - 2.0).abs() < 1e-6);

        let left = pan_frame(Frame::mono(1.0), -1.0);
        assert!((left.left - 2.0).abs() < 1e-6);
        assert!(left.right.abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_pan_is_clamped() {
        assert_eq!(pan_frame(Frame::mono(0.5), 3.0), pan_frame(Frame::mono(0.5), 1.0));
    }
}
