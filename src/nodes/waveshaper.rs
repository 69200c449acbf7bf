/// Wave-shaper node - static nonlinearity through a lookup table
///
/// The transfer curve is a table over the input range [-1, 1], read with
/// linear interpolation. It lives behind an `ArcSwap`: the control thread
/// builds a complete new table and swaps it in, the render thread always
/// sees either the old or the new table, never a half-written one.
use crate::audio_node::{AudioNode, Frame, ProcessContext};
use arc_swap::ArcSwap;
use std::f32::consts::PI;
use std::sync::Arc;

/// Table size of the overdrive curve
pub const CURVE_SIZE: usize = 44100;

/// Overdrive transfer curve for drive amount `k`
///
/// `curve[i] = (3 + k) * x * 20 * (π / 180) / (π + k * |x|)` with `x`
/// running linearly over [-1, 1]. Recomputed in full on every drive change.
pub fn make_distortion_curve(k: f32) -> Vec<f32> {
    let deg = PI / 180.0;
    (0..CURVE_SIZE)
        .map(|i| {
            let x = i as f32 * 2.0 / CURVE_SIZE as f32 - 1.0;
            (3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())
        })
        .collect()
}

/// Control-side handle for replacing a shaper's curve
#[derive(Clone)]
pub struct CurveHandle(Arc<ArcSwap<Vec<f32>>>);

impl CurveHandle {
    pub fn new(curve: Vec<f32>) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(curve)))
    }

    /// Swap in a complete new table
    pub fn store(&self, curve: Vec<f32>) {
        self.0.store(Arc::new(curve));
    }

    pub fn load(&self) -> Arc<Vec<f32>> {
        self.0.load_full()
    }
}

/// Read `curve` at input `x` the way the Web Audio shaper does
pub fn shape(curve: &[f32], x: f32) -> f32 {
    match curve.len() {
        0 => x,
        1 => curve[0],
        n => {
            let position = (x.clamp(-1.0, 1.0) + 1.0) * 0.5 * (n - 1) as f32;
            let index = position.floor() as usize;
            if index >= n - 1 {
                return curve[n - 1];
            }
            let frac = position - index as f32;
            curve[index] * (1.0 - frac) + curve[index + 1] * frac
        }
    }
}

pub struct WaveShaperNode {
    curve: CurveHandle,
}

impl WaveShaperNode {
    pub fn new(curve: CurveHandle) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> CurveHandle {
        self.curve.clone()
    }
}

impl AudioNode for WaveShaperNode {
    fn process(&mut self, input: Frame, _params: &[f32], _context: &ProcessContext) -> Frame {
        let curve = self.curve.0.load();
        Frame::new(shape(&curve, input.left), shape(&curve, input.right))
    }

    fn name(&self) -> &str {
        "WaveShaperNode"
    }
}
