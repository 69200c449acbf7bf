/// Compressor node - soft-knee dynamics compression with attack/release
///
/// Parameters follow the Web Audio `DynamicsCompressorNode`: threshold and
/// knee in dB, ratio, attack and release in seconds. Both channels share one
/// detector so the stereo image does not shift under compression.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};

/// Compressor node: smooth dynamics compression
///
/// The compression algorithm:
/// ```text
/// 1. Detect level: input_db = 20 * log10(max(|l|, |r|))
/// 2. Static curve with soft knee of width W around threshold T:
///    below T - W/2:  reduction = 0
///    inside knee:    reduction = (1/ratio - 1) * (input_db - T + W/2)^2 / (2W)
///    above T + W/2:  reduction = (1/ratio - 1) * (input_db - T)
/// 3. Smooth with attack/release envelope follower:
///    attack_coeff = exp(-1 / (attack_time * sample_rate))
///    release_coeff = exp(-1 / (release_time * sample_rate))
/// 4. Apply gain: output = input * 10^(envelope / 20)
/// ```
///
/// # Example
/// ```ignore
/// let comp = graph.add_node(CompressorNode::new());
/// graph.param(comp, "threshold")?.set(-30.0);
/// ```
pub struct CompressorNode {
    /// Current gain reduction in dB (<= 0)
    envelope: f32,
}

impl CompressorNode {
    pub fn new() -> Self {
        Self { envelope: 0.0 }
    }

    /// Gain reduction in dB applied to the last frame
    pub fn reduction_db(&self) -> f32 {
        self.envelope
    }
}

impl Default for CompressorNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Static gain reduction (dB, <= 0) for a detected level
pub fn static_reduction(input_db: f32, threshold: f32, knee: f32, ratio: f32) -> f32 {
    let slope = 1.0 / ratio.clamp(1.0, 20.0) - 1.0;
    let over = input_db - threshold;
    let half_knee = knee.max(0.0) * 0.5;

    if over <= -half_knee {
        0.0
    } else if over < half_knee {
        let x = over + half_knee;
        slope * x * x / (2.0 * knee)
    } else {
        slope * over
    }
}

impl AudioNode for CompressorNode {
    fn process(&mut self, input: Frame, params: &[f32], context: &ProcessContext) -> Frame {
        let [threshold, knee, ratio, attack, release] = match *params {
            [t, k, r, a, rel, ..] => [t, k, r, a, rel],
            _ => [-24.0, 30.0, 12.0, 0.003, 0.25],
        };

        let level = input.peak().max(1e-10); // Prevent log(0)
        let input_db = 20.0 * level.log10();
        let target = static_reduction(input_db, threshold, knee, ratio);

        let attack_coeff = (-1.0 / (attack.max(0.0001) * context.sample_rate)).exp();
        let release_coeff = (-1.0 / (release.max(0.001) * context.sample_rate)).exp();

        // More reduction → attack, less → release
        let coeff = if target < self.envelope {
            attack_coeff
        } else {
            release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * target;

        input * 10f32.powf(self.envelope / 20.0)
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("threshold", -24.0),
            ParamSpec::new("knee", 30.0),
            ParamSpec::new("ratio", 12.0),
            ParamSpec::new("attack", 0.003),
            ParamSpec::new("release", 0.25),
        ]
    }

    fn name(&self) -> &str {
        "CompressorNode"
    }
}
