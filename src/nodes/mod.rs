/// Audio node implementations for pedal graphs
///
/// This module contains concrete implementations of the AudioNode trait.
///
/// # Node Categories
///
/// ## Routing
/// - [`sum::SumNode`] - Unity bus; sums everything connected to it
/// - [`gain::GainNode`] - Gain with per-sample smoothing
/// - [`pan::PanNode`] - Equal-power stereo panner
///
/// ## Sources
/// - [`oscillator::OscillatorNode`] - Sine/square/sawtooth/triangle, used as LFO
///
/// ## Filters and dynamics
/// - [`biquad::BiquadNode`] - Lowpass, highpass, bandpass, low/high shelf
/// - [`compressor::CompressorNode`] - Soft-knee dynamics compressor
/// - [`waveshaper::WaveShaperNode`] - Table lookup distortion
///
/// ## Delay-providing (may close feedback loops)
/// - [`delay::DelayNode`] - Interpolated delay line
/// - [`convolver::ConvolverNode`] - Partitioned FFT convolution
/// - [`tape::TapeNode`] - Looper tape (record, overdub, playback)
pub mod biquad;
pub mod compressor;
pub mod convolver;
pub mod delay;
pub mod gain;
pub mod oscillator;
pub mod pan;
pub mod sum;
pub mod tape;
pub mod waveshaper;
