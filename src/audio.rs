//! Real-time audio I/O using cpal
//! Works with JACK, ALSA, CoreAudio, WASAPI, etc.
//!
//! The capture callback writes the guitar signal (first input channel) into
//! a lock-free ring buffer; the playback callback owns the `BlockProcessor`,
//! pulls one block of input at a time and renders it.
//!
//! ```text
//!  input device ──► capture cb ──► HeapRb<f32> ──► playback cb ──► output device
//!                                                  (BlockProcessor)
//! ```

use crate::audio_node::Frame;
use crate::block_processor::BlockProcessor;
use crate::error::{PedalError, PedalResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{error, info, warn};

/// Blocks of capture the ring buffer can hold before dropping input
const RING_BLOCKS: usize = 8;

fn audio_error(e: impl std::fmt::Display) -> PedalError {
    PedalError::Audio(e.to_string())
}

/// An audio device and what it can do
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub name: String,
    pub input: bool,
    pub output: bool,
}

/// List the devices of the default host
pub fn list_devices() -> PedalResult<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let devices = host
        .devices()
        .map_err(audio_error)?
        .filter_map(|device| {
            let name = device.name().ok()?;
            Some(AudioDevice {
                input: device.default_input_config().is_ok(),
                output: device.default_output_config().is_ok(),
                name,
            })
        })
        .collect();
    Ok(devices)
}

/// Running duplex stream; dropping it stops audio
pub struct AudioEngine {
    sample_rate: u32,
    _input: cpal::Stream,
    _output: cpal::Stream,
}

impl AudioEngine {
    /// Sample rate of the default output device
    ///
    /// Build the graph at this rate before calling `start`.
    pub fn default_sample_rate() -> PedalResult<u32> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PedalError::Audio("no audio output device found".into()))?;
        let config = device.default_output_config().map_err(audio_error)?;
        Ok(config.sample_rate().0)
    }

    /// Open the default input and output devices and start rendering
    pub fn start(processor: BlockProcessor, block_size: usize) -> PedalResult<Self> {
        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let output_device = host
            .default_output_device()
            .ok_or_else(|| PedalError::Audio("no audio output device found".into()))?;
        let input_device = host
            .default_input_device()
            .ok_or_else(|| PedalError::Audio("no audio input device found".into()))?;
        info!(
            input = %input_device.name().map_err(audio_error)?,
            output = %output_device.name().map_err(audio_error)?,
            "audio devices"
        );

        let output_config = output_device.default_output_config().map_err(audio_error)?;
        let input_config = input_device.default_input_config().map_err(audio_error)?;
        let sample_rate = output_config.sample_rate().0;
        if input_config.sample_rate() != output_config.sample_rate() {
            warn!(
                input = input_config.sample_rate().0,
                output = sample_rate,
                "input and output sample rates differ"
            );
        }
        if (processor.sample_rate() - sample_rate as f32).abs() > 0.5 {
            warn!(
                graph = processor.sample_rate(),
                device = sample_rate,
                "graph built for a different sample rate"
            );
        }

        let ring = HeapRb::<f32>::new(block_size * RING_BLOCKS);
        let (producer, consumer) = ring.split();

        let input = match input_config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_input::<f32>(&input_device, &input_config.into(), producer)
            }
            cpal::SampleFormat::I16 => {
                Self::build_input::<i16>(&input_device, &input_config.into(), producer)
            }
            cpal::SampleFormat::U16 => {
                Self::build_input::<u16>(&input_device, &input_config.into(), producer)
            }
            format => return Err(PedalError::Audio(format!("unsupported input format {:?}", format))),
        }?;

        let output = match output_config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_output::<f32>(
                &output_device,
                &output_config.into(),
                processor,
                consumer,
                block_size,
            ),
            cpal::SampleFormat::I16 => Self::build_output::<i16>(
                &output_device,
                &output_config.into(),
                processor,
                consumer,
                block_size,
            ),
            cpal::SampleFormat::U16 => Self::build_output::<u16>(
                &output_device,
                &output_config.into(),
                processor,
                consumer,
                block_size,
            ),
            format => return Err(PedalError::Audio(format!("unsupported output format {:?}", format))),
        }?;

        input.play().map_err(audio_error)?;
        output.play().map_err(audio_error)?;
        info!("Audio streams started at {} Hz", sample_rate);

        Ok(Self {
            sample_rate,
            _input: input,
            _output: output,
        })
    }

    fn build_input<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut capture: HeapProd<f32>,
    ) -> PedalResult<cpal::Stream>
    where
        T: cpal::SizedSample,
        f32: cpal::FromSample<T>,
    {
        let channels = config.channels as usize;
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks(channels) {
                        let sample: f32 = frame[0].to_sample();
                        // Full ring: playback fell behind, drop the input
                        let _ = capture.try_push(sample);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(audio_error)
    }

    fn build_output<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut processor: BlockProcessor,
        mut capture: HeapCons<f32>,
        block_size: usize,
    ) -> PedalResult<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut input = vec![Frame::SILENCE; block_size];
        let mut output = vec![Frame::SILENCE; block_size];

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(channels * block_size) {
                        let frames = chunk.len() / channels;
                        for frame in input[..frames].iter_mut() {
                            // Underrun plays silence into the chain
                            *frame = Frame::mono(capture.try_pop().unwrap_or(0.0));
                        }
                        processor.process_block(&input[..frames], &mut output[..frames]);

                        for (samples, frame) in chunk.chunks_mut(channels).zip(&output[..frames]) {
                            for (channel, sample) in samples.iter_mut().enumerate() {
                                let value = match (channels, channel) {
                                    (1, _) => frame.mix(),
                                    (_, 0) => frame.left,
                                    (_, 1) => frame.right,
                                    _ => frame.mix(),
                                };
                                *sample = T::from_sample(value);
                            }
                        }
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(audio_error)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
