//! Impulse responses for the reverb
//!
//! Loading recorded impulse responses is the host's business; the engine
//! only asks an `ImpulseProvider` for one. The built-in provider synthesises
//! exponentially decaying noise, deterministic for a given seed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Mono impulse response at a known sample rate
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    pub name: String,
    pub sample_rate: f32,
    pub samples: Arc<Vec<f32>>,
}

impl ImpulseResponse {
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }
}

/// Supplies the reverb's impulse response
pub trait ImpulseProvider: Send + Sync {
    /// `None` if nothing is available; the reverb then runs dry only
    fn impulse(&self, sample_rate: f32) -> Option<ImpulseResponse>;
}

/// Provider that never has an impulse response
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImpulse;

impl ImpulseProvider for NoImpulse {
    fn impulse(&self, _sample_rate: f32) -> Option<ImpulseResponse> {
        None
    }
}

/// Shape of a synthetic space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Space {
    Room,
    #[default]
    Hall,
    Plate,
}

impl Space {
    /// (pre-delay, RT60, length) in seconds
    fn shape(&self) -> (f32, f32, f32) {
        match self {
            Space::Room => (0.005, 0.6, 0.8),
            Space::Hall => (0.02, 2.4, 3.0),
            Space::Plate => (0.0, 1.4, 1.8),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Space::Room => "room",
            Space::Hall => "hall",
            Space::Plate => "plate",
        }
    }
}

/// Decaying-noise impulse response, normalised to unit energy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticImpulse {
    pub space: Space,
    pub seed: u64,
}

impl SyntheticImpulse {
    pub fn new(space: Space, seed: u64) -> Self {
        Self { space, seed }
    }

    pub fn room() -> Self {
        Self::new(Space::Room, 1)
    }

    pub fn hall() -> Self {
        Self::new(Space::Hall, 1)
    }

    pub fn plate() -> Self {
        Self::new(Space::Plate, 1)
    }

    /// Generate the samples for `sample_rate`
    pub fn generate(&self, sample_rate: f32) -> Vec<f32> {
        let (pre_delay, rt60, length) = self.space.shape();
        let mut rng = fastrand::Rng::with_seed(self.seed);
        let silent = (pre_delay * sample_rate) as usize;
        let total = (length * sample_rate) as usize;
        // -60 dB after rt60 seconds
        let decay = 6.9078 / (rt60 * sample_rate);

        let mut samples = vec![0.0f32; total.max(silent + 1)];
        for (i, sample) in samples.iter_mut().enumerate().skip(silent) {
            let t = (i - silent) as f32;
            *sample = (rng.f32() * 2.0 - 1.0) * (-decay * t).exp();
        }

        let energy: f32 = samples.iter().map(|x| x * x).sum();
        if energy > 0.0 {
            let scale = 1.0 / energy.sqrt();
            samples.iter_mut().for_each(|x| *x *= scale);
        }
        samples
    }
}

impl ImpulseProvider for SyntheticImpulse {
    fn impulse(&self, sample_rate: f32) -> Option<ImpulseResponse> {
        let samples = self.generate(sample_rate);
        debug!(space = self.space.name(), frames = samples.len(), "generated impulse response");
        Some(ImpulseResponse {
            name: self.space.name().to_string(),
            sample_rate,
            samples: Arc::new(samples),
        })
    }
}
