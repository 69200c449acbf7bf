/// Biquad filter node - one stereo second-order IIR section
///
/// Wraps the `biquad` crate (Direct Form II Transposed, one instance per
/// channel). Coefficients are recomputed only when a parameter actually
/// changes, and the filter state is kept across updates so sweeping the
/// frequency (wah) does not click.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz};

/// Q used by shelving filters (shelf slope of 1)
pub const SHELF_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Lowpass,
    Highpass,
    Bandpass,
    /// Gain parameter in dB
    Lowshelf,
    /// Gain parameter in dB
    Highshelf,
}

/// Coefficients with frequency and Q clamped into the valid range
///
/// Returns None if the `biquad` crate still rejects them.
fn coefficients(
    mode: FilterMode,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    gain_db: f32,
) -> Option<Coefficients<f32>> {
    let frequency = frequency.clamp(10.0, sample_rate * 0.49);
    let q = q.max(0.0001);
    let gain_db = gain_db.clamp(-40.0, 40.0);
    let filter = match mode {
        FilterMode::Lowpass => biquad::Type::LowPass,
        FilterMode::Highpass => biquad::Type::HighPass,
        FilterMode::Bandpass => biquad::Type::BandPass,
        FilterMode::Lowshelf => biquad::Type::LowShelf(gain_db),
        FilterMode::Highshelf => biquad::Type::HighShelf(gain_db),
    };
    Coefficients::<f32>::from_params(filter, sample_rate.hz(), frequency.hz(), q).ok()
}

/// Pass-through section used until valid coefficients are available
fn identity() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Biquad node with `frequency`, `q` and `gain` (dB, shelves only) parameters
///
/// # Example
/// ```ignore
/// // Wah: narrow bandpass swept by a binding
/// let wah = graph.add_node(BiquadNode::new(FilterMode::Bandpass, sample_rate, 1000.0, 10.0));
/// graph.param(wah, "frequency")?.set(1400.0);
/// ```
pub struct BiquadNode {
    mode: FilterMode,
    left: DirectForm2Transposed<f32>,
    right: DirectForm2Transposed<f32>,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
}

impl BiquadNode {
    pub fn new(mode: FilterMode, sample_rate: f32, frequency: f32, q: f32) -> Self {
        Self::with_gain(mode, sample_rate, frequency, q, 0.0)
    }

    /// Shelving filter with a gain in dB
    pub fn shelf(mode: FilterMode, sample_rate: f32, frequency: f32, gain_db: f32) -> Self {
        Self::with_gain(mode, sample_rate, frequency, SHELF_Q, gain_db)
    }

    pub fn with_gain(mode: FilterMode, sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Self {
        let coeffs = coefficients(mode, sample_rate, frequency, q, gain_db).unwrap_or_else(identity);
        Self {
            mode,
            left: DirectForm2Transposed::<f32>::new(coeffs),
            right: DirectForm2Transposed::<f32>::new(coeffs),
            frequency,
            q,
            gain_db,
            sample_rate,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    fn update(&mut self, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) {
        if frequency == self.frequency
            && q == self.q
            && gain_db == self.gain_db
            && sample_rate == self.sample_rate
        {
            return;
        }
        self.frequency = frequency;
        self.q = q;
        self.gain_db = gain_db;
        self.sample_rate = sample_rate;

        // Invalid settings keep the previous response
        if let Some(coeffs) = coefficients(self.mode, sample_rate, frequency, q, gain_db) {
            self.left.update_coefficients(coeffs);
            self.right.update_coefficients(coeffs);
        }
    }
}

impl AudioNode for BiquadNode {
    fn process(&mut self, input: Frame, params: &[f32], context: &ProcessContext) -> Frame {
        if let [frequency, q, gain_db, ..] = *params {
            self.update(frequency, q, gain_db, context.sample_rate);
        }
        Frame::new(self.left.run(input.left), self.right.run(input.right))
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("frequency", self.frequency),
            ParamSpec::new("q", self.q),
            ParamSpec::new("gain", self.gain_db),
        ]
    }

    fn name(&self) -> &str {
        "BiquadNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_rms(node: &mut BiquadNode, frequency: f32, sample_rate: f32) -> f32 {
        let ctx = ProcessContext::new(sample_rate);
        let params = [node.frequency, node.q, node.gain_db];
        let n = 8192;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (2.0 * PI * frequency * i as f32 / sample_rate).sin();
            let y = node.process(Frame::mono(x), &params, &ctx).left;
            // Skip the transient
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f32).sqrt()
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut low = BiquadNode::new(FilterMode::Lowpass, 44100.0, 800.0, 0.707);
        let mut high = BiquadNode::new(FilterMode::Lowpass, 44100.0, 800.0, 0.707);
        let pass = sine_rms(&mut low, 100.0, 44100.0);
        let stop = sine_rms(&mut high, 8000.0, 44100.0);
        assert!(pass > 0.6, "100 Hz should pass: {}", pass);
        assert!(stop < 0.05, "8 kHz should be cut: {}", stop);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let mut node = BiquadNode::new(FilterMode::Highpass, 44100.0, 4000.0, 0.707);
        let rms = sine_rms(&mut node, 200.0, 44100.0);
        assert!(rms < 0.05, "200 Hz should be cut: {}", rms);
    }

    #[test]
    fn test_low_shelf_boost() {
        let mut node = BiquadNode::shelf(FilterMode::Lowshelf, 44100.0, 500.0, 6.0);
        let rms = sine_rms(&mut node, 60.0, 44100.0);
        // +6 dB on a 0.707 RMS sine ≈ 1.41
        assert!(rms > 1.2, "low shelf should boost: {}", rms);
    }

    #[test]
    fn test_frequency_above_nyquist_is_clamped() {
        let mut node = BiquadNode::new(FilterMode::Bandpass, 44100.0, 1000.0, 1.0);
        let ctx = ProcessContext::new(44100.0);
        let out = node.process(Frame::mono(1.0), &[90000.0, 1.0, 0.0], &ctx);
        assert!(out.left.is_finite());
    }
}
