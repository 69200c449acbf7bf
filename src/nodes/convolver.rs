/// Convolver node - uniformly partitioned FFT convolution
///
/// The impulse response is cut into partitions of `PARTITION` samples, each
/// transformed once up front. Input is gathered in blocks of the same size;
/// every completed block is transformed (overlap-save, FFT size 2 *
/// `PARTITION`) and pushed into a frequency-domain delay line, and the next
/// output block is the inverse transform of the sum of delayed input spectra
/// times IR spectra.
///
/// Output lags input by exactly one block. That latency is a real delay, so
/// the convolver reports `provides_delay` and can sit inside feedback loops.
/// Without an impulse response the node outputs silence.
use crate::audio_node::{AudioNode, Frame, ProcessContext};
use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Partition and block size in samples
pub const PARTITION: usize = 256;

/// One channel of partitioned convolution state
struct ChannelState {
    /// Frequency-domain delay line, one spectrum per partition
    history: Vec<Vec<Complex<f32>>>,
    /// Previous and current input block, back to back
    window: Vec<f32>,
    /// Output block being played back
    output: Vec<f32>,
}

impl ChannelState {
    fn new(partitions: usize, bins: usize) -> Self {
        Self {
            history: vec![vec![Complex::new(0.0, 0.0); bins]; partitions],
            window: vec![0.0; 2 * PARTITION],
            output: vec![0.0; PARTITION],
        }
    }
}

/// Convolver node with FFT-based processing
///
/// # Example
/// ```ignore
/// let ir = SyntheticImpulse::hall().impulse(sample_rate);
/// let convolver = graph.add_node(ConvolverNode::new(ir.map(|ir| ir.samples)));
/// ```
pub struct ConvolverNode {
    ir_spectra: Vec<Vec<Complex<f32>>>,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    channels: [ChannelState; 2],
    /// Write position in the history ring
    head: usize,
    /// Position within the current block
    pos: usize,
    time_buf: Vec<f32>,
    accum: Vec<Complex<f32>>,
    r2c_scratch: Vec<Complex<f32>>,
    c2r_scratch: Vec<Complex<f32>>,
}

impl ConvolverNode {
    /// Create a convolver; `None` gives a silent node
    pub fn new(impulse: Option<Arc<Vec<f32>>>) -> Self {
        let fft_size = 2 * PARTITION;
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        let mut time_buf = r2c.make_input_vec();
        let mut spectrum = r2c.make_output_vec();
        let mut r2c_scratch = r2c.make_scratch_vec();
        let c2r_scratch = c2r.make_scratch_vec();
        let bins = spectrum.len();

        // Pre-compute the spectrum of each IR partition
        let mut ir_spectra = Vec::new();
        if let Some(ir) = impulse.as_ref().filter(|ir| !ir.is_empty()) {
            // Normalize by FFT size here (realfft does not)
            let scale = 1.0 / fft_size as f32;
            for chunk in ir.chunks(PARTITION) {
                time_buf.fill(0.0);
                for (dst, &src) in time_buf.iter_mut().zip(chunk) {
                    *dst = src * scale;
                }
                let ok = r2c
                    .process_with_scratch(&mut time_buf, &mut spectrum, &mut r2c_scratch)
                    .is_ok();
                if ok {
                    ir_spectra.push(spectrum.clone());
                }
            }
        }

        let partitions = ir_spectra.len().max(1);
        Self {
            ir_spectra,
            r2c,
            c2r,
            channels: [
                ChannelState::new(partitions, bins),
                ChannelState::new(partitions, bins),
            ],
            head: 0,
            pos: 0,
            time_buf,
            accum: vec![Complex::new(0.0, 0.0); bins],
            r2c_scratch,
            c2r_scratch,
        }
    }

    /// True if an impulse response was supplied
    pub fn has_impulse(&self) -> bool {
        !self.ir_spectra.is_empty()
    }

    /// Latency in samples
    pub fn latency(&self) -> usize {
        PARTITION
    }

    fn convolve_block(&mut self) {
        let partitions = self.ir_spectra.len();
        for channel in self.channels.iter_mut() {
            self.time_buf.copy_from_slice(&channel.window);
            let forward = self.r2c.process_with_scratch(
                &mut self.time_buf,
                &mut channel.history[self.head],
                &mut self.r2c_scratch,
            );
            if forward.is_err() {
                channel.output.fill(0.0);
                continue;
            }

            // Y = Σ X[k - p] · H[p]
            self.accum.fill(Complex::new(0.0, 0.0));
            for (p, ir) in self.ir_spectra.iter().enumerate() {
                let x = &channel.history[(self.head + partitions - p) % partitions];
                for ((acc, &xi), &hi) in self.accum.iter_mut().zip(x).zip(ir) {
                    *acc += xi * hi;
                }
            }
            if let Some(first) = self.accum.first_mut() {
                first.im = 0.0;
            }
            if let Some(last) = self.accum.last_mut() {
                last.im = 0.0;
            }

            let inverse = self.c2r.process_with_scratch(
                &mut self.accum,
                &mut self.time_buf,
                &mut self.c2r_scratch,
            );
            if inverse.is_err() {
                channel.output.fill(0.0);
            } else {
                // Overlap-save: the second half is the valid linear convolution
                channel.output.copy_from_slice(&self.time_buf[PARTITION..]);
            }

            // Current block becomes the previous one
            channel.window.copy_within(PARTITION.., 0);
        }
        self.head = (self.head + 1) % partitions;
    }
}

impl AudioNode for ConvolverNode {
    fn process(&mut self, _input: Frame, _params: &[f32], _context: &ProcessContext) -> Frame {
        if !self.has_impulse() {
            return Frame::SILENCE;
        }
        Frame::new(
            self.channels[0].output[self.pos],
            self.channels[1].output[self.pos],
        )
    }

    fn commit(&mut self, input: Frame, _params: &[f32], _context: &ProcessContext) {
        if !self.has_impulse() {
            return;
        }
        self.channels[0].window[PARTITION + self.pos] = input.left;
        self.channels[1].window[PARTITION + self.pos] = input.right;
        self.pos += 1;
        if self.pos == PARTITION {
            self.pos = 0;
            self.convolve_block();
        }
    }

    fn name(&self) -> &str {
        "ConvolverNode"
    }

    fn provides_delay(&self) -> bool {
        true
    }
}
