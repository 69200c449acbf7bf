//! Board configuration
//!
//! A TOML file describing the chain and how the host should run it. Every
//! field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! sample_rate = 48000
//! block_size = 256
//! max_loop_seconds = 30.0
//! chain = ["compressor", "wah", "overdrive", "delay", "reverb", "loop"]
//!
//! [midi]
//! port = "nanoKEY"
//! looper = { loop = 121, stop = 122, clear = 123 }
//!
//! [reverb]
//! space = "plate"
//!
//! [controls.delay]
//! mix = 0.5
//! speed = 0.3
//!
//! [active]
//! wah = true
//! ```

use crate::error::{PedalError, PedalResult};
use crate::impulse::{ImpulseProvider, NoImpulse, Space, SyntheticImpulse};
use crate::pedals::{default_chain, PedalKind};
use crate::router::LooperNotes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PedalboardConfig {
    pub sample_rate: u32,
    /// Frames rendered per processor call
    pub block_size: usize,
    /// Longest take the looper can hold
    pub max_loop_seconds: f32,
    pub chain: Vec<PedalKind>,
    pub midi: MidiConfig,
    pub reverb: ReverbConfig,
    /// Initial binding values, by pedal name then binding name
    pub controls: BTreeMap<String, BTreeMap<String, f32>>,
    /// Initial bypass states, by pedal name
    pub active: BTreeMap<String, bool>,
}

/// Looper buffers are preallocated for this many seconds at most
pub const MAX_LOOP_SECONDS: f32 = 600.0;
pub const MAX_SAMPLE_RATE: u32 = 384_000;

impl Default for PedalboardConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 256,
            max_loop_seconds: 30.0,
            chain: default_chain(),
            midi: MidiConfig::default(),
            reverb: ReverbConfig::default(),
            controls: BTreeMap::new(),
            active: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MidiConfig {
    /// Substring of the input port name; first port if unset
    pub port: Option<String>,
    pub looper: LooperNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReverbConfig {
    /// false runs the reverb without an impulse response
    pub impulse: bool,
    pub space: Space,
    pub seed: u64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            impulse: true,
            space: Space::Hall,
            seed: 1,
        }
    }
}

impl ReverbConfig {
    pub fn provider(&self) -> Box<dyn ImpulseProvider> {
        if self.impulse {
            Box::new(SyntheticImpulse::new(self.space, self.seed))
        } else {
            Box::new(NoImpulse)
        }
    }
}

impl PedalboardConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> PedalResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), units = config.chain.len(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> PedalResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> PedalResult<String> {
        toml::to_string_pretty(self).map_err(|e| PedalError::InvalidConfig(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> PedalResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> PedalResult<()> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(PedalError::InvalidConfig(format!(
                "sample_rate must be in 1..={}",
                MAX_SAMPLE_RATE
            )));
        }
        if self.block_size == 0 {
            return Err(PedalError::InvalidConfig("block_size must be positive".into()));
        }
        if !(self.max_loop_seconds > 0.0 && self.max_loop_seconds <= MAX_LOOP_SECONDS) {
            return Err(PedalError::InvalidConfig(format!(
                "max_loop_seconds must be in (0, {}]",
                MAX_LOOP_SECONDS
            )));
        }
        for name in self.controls.keys().chain(self.active.keys()) {
            name.parse::<PedalKind>()?;
        }
        Ok(())
    }

    pub fn max_loop_frames(&self) -> usize {
        (self.max_loop_seconds * self.sample_rate as f32) as usize
    }
}
