/// Delay node - interpolated delay line with circular buffer
///
/// The delay time parameter is in seconds and may be modulated (chorus,
/// multi-head wobble). Reads use linear interpolation between neighbouring
/// samples so a moving delay time stays smooth. The effective delay is
/// clamped to at least one sample, which is what lets a delay line close a
/// feedback loop.
///
/// An inline delay (`DelayNode::inline`) writes and reads in the same frame
/// like any other node. It may run down to zero samples and does not break
/// feedback loops; modulation stages such as a chorus wobble use it.
use crate::audio_node::{AudioNode, Frame, ParamSpec, ProcessContext};

/// Delay node with modulatable delay time
///
/// # Example
/// ```ignore
/// // 450 ms echo with feedback
/// let delay = graph.add_node(DelayNode::new(sample_rate, 1.5, 0.45));
/// let feedback = graph.add_node(GainNode::new(0.4));
/// graph.connect(delay, feedback)?;
/// graph.connect(feedback, delay)?;   // fine: the loop passes through a delay
/// ```
pub struct DelayNode {
    buffer: Vec<Frame>,
    write_pos: usize,
    max_delay_samples: f32,
    delay_time: f32,
    inline: bool,
}

impl DelayNode {
    /// # Parameters
    /// - `sample_rate`: Sample rate in Hz, fixes the buffer size
    /// - `max_delay`: Maximum delay time in seconds
    /// - `delay_time`: Initial delay time in seconds
    pub fn new(sample_rate: f32, max_delay: f32, delay_time: f32) -> Self {
        let max_delay_samples = (max_delay.max(0.0) * sample_rate).ceil().max(1.0);
        // +2: one slot for the interpolation neighbour, one for the write head
        let buffer_size = max_delay_samples as usize + 2;

        Self {
            buffer: vec![Frame::SILENCE; buffer_size],
            write_pos: 0,
            max_delay_samples,
            delay_time,
            inline: false,
        }
    }

    /// Delay stage that does not count as a loop's delay element
    pub fn inline(sample_rate: f32, max_delay: f32, delay_time: f32) -> Self {
        Self {
            inline: true,
            ..Self::new(sample_rate, max_delay, delay_time)
        }
    }

    /// Get the buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Reset the delay buffer to silence
    pub fn clear_buffer(&mut self) {
        self.buffer.fill(Frame::SILENCE);
        self.write_pos = 0;
    }

    #[inline]
    fn tap(&self, samples_ago: usize) -> Frame {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - samples_ago) % len]
    }

    fn write(&mut self, input: Frame) {
        self.buffer[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// `offset` is 1 when this frame's input was already written
    fn read(&self, delay_samples: f32, offset: usize) -> Frame {
        let whole = delay_samples.floor();
        let frac = delay_samples - whole;
        let whole = whole as usize + offset;

        let a = self.tap(whole);
        let b = self.tap(whole + 1);
        a * (1.0 - frac) + b * frac
    }
}

impl AudioNode for DelayNode {
    fn process(&mut self, input: Frame, params: &[f32], context: &ProcessContext) -> Frame {
        let delay_time = params.first().copied().unwrap_or(self.delay_time);
        let delay_samples = delay_time * context.sample_rate;

        if self.inline {
            self.write(input);
            return self.read(delay_samples.clamp(0.0, self.max_delay_samples), 1);
        }
        self.read(delay_samples.clamp(1.0, self.max_delay_samples), 0)
    }

    fn commit(&mut self, input: Frame, _params: &[f32], _context: &ProcessContext) {
        if !self.inline {
            self.write(input);
        }
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("delay_time", self.delay_time)]
    }

    fn name(&self) -> &str {
        "DelayNode"
    }

    fn provides_delay(&self) -> bool {
        !self.inline
    }
}
