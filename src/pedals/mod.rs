//! Pedal catalog
//!
//! Every pedal builds a small subgraph between one input and one output and
//! hands back an `EffectUnit`: its bypass switch, its ordered binding table
//! and, for the looper, the looper controller.
//!
//! ```text
//!            ┌──────────────── EffectUnit ────────────────┐
//!  input ──► │ bypass ─► effect nodes ─► bypass ─► output │ ──► next unit
//!            │   ▲            ▲                           │
//!            │ toggle     bindings (knobs, CC)            │
//!            └────────────────────────────────────────────┘
//! ```

pub mod boost;
pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod harmonic_tremolo;
pub mod looper;
pub mod multihead_delay;
pub mod overdrive;
pub mod reverb;
pub mod tremolo;
pub mod wah;

pub use boost::BoostPedal;
pub use chorus::ChorusPedal;
pub use compressor::CompressorPedal;
pub use delay::DelayPedal;
pub use harmonic_tremolo::HarmonicTremoloPedal;
pub use looper::LoopPedal;
pub use multihead_delay::MultiheadDelayPedal;
pub use overdrive::OverdrivePedal;
pub use reverb::ReverbPedal;
pub use tremolo::TremoloPedal;
pub use wah::WahPedal;

use crate::audio_node::NodeId;
use crate::binding::{BindingInfo, ControlBinding};
use crate::bypass::BypassSwitch;
use crate::error::{OutOfRangeWarning, PedalError, PedalResult};
use crate::graph::AudioGraph;
use crate::impulse::ImpulseProvider;
use crate::looper::LooperController;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a pedal needs while it wires itself into the graph
pub struct BuildContext<'a> {
    pub graph: &'a mut AudioGraph,
    /// 1-based chain position of the unit being built
    pub index: usize,
    pub impulses: &'a dyn ImpulseProvider,
    /// Longest loop the looper may record
    pub max_loop_frames: usize,
}

impl<'a> BuildContext<'a> {
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }
}

/// A pedal type that can assemble itself into a graph
pub trait Pedal: Send {
    fn kind(&self) -> PedalKind;

    /// Pedal-face label
    fn label(&self) -> &'static str;

    /// Wire the pedal after `input` and describe the result
    fn build(&self, context: &mut BuildContext<'_>, input: NodeId) -> PedalResult<EffectUnit>;
}

/// The assembled pedal: ports, bypass and control surface
pub struct EffectUnit {
    kind: PedalKind,
    label: &'static str,
    index: usize,
    input: NodeId,
    output: NodeId,
    bypass: Option<BypassSwitch>,
    bindings: Vec<ControlBinding>,
    continuous: Vec<usize>,
    looper: Option<LooperController>,
}

impl EffectUnit {
    pub fn new(kind: PedalKind, label: &'static str, index: usize, input: NodeId, output: NodeId) -> Self {
        Self {
            kind,
            label,
            index,
            input,
            output,
            bypass: None,
            bindings: Vec::new(),
            continuous: Vec::new(),
            looper: None,
        }
    }

    pub fn with_bypass(mut self, bypass: BypassSwitch) -> Self {
        self.bypass = Some(bypass);
        self
    }

    pub fn with_looper(mut self, looper: LooperController) -> Self {
        self.looper = Some(looper);
        self
    }

    /// Append a binding to the table
    pub fn bind(mut self, binding: ControlBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Append a binding that also follows the expression pedal
    pub fn bind_continuous(mut self, binding: ControlBinding) -> Self {
        self.continuous.push(self.bindings.len());
        self.bindings.push(binding);
        self
    }

    pub fn kind(&self) -> PedalKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn bypass(&self) -> Option<&BypassSwitch> {
        self.bypass.as_ref()
    }

    /// Units without a bypass are always active
    pub fn is_active(&self) -> bool {
        self.bypass.as_ref().map_or(true, |b| b.is_active())
    }

    /// Flip (or set) the bypass; `None` if the unit has none
    pub fn toggle(&self, state: Option<bool>) -> Option<bool> {
        self.bypass.as_ref().map(|b| b.toggle(state))
    }

    pub fn bindings(&self) -> &[ControlBinding] {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&ControlBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    /// Set a binding by name
    ///
    /// # Errors
    /// `UnknownParam` if the unit has no binding called `name`.
    pub fn set(&self, name: &str, value: f32) -> PedalResult<Option<OutOfRangeWarning>> {
        self.binding(name)
            .map(|binding| binding.apply(value))
            .ok_or_else(|| PedalError::UnknownParam {
                node: self.name().to_string(),
                param: name.to_string(),
            })
    }

    /// Bindings that follow the expression pedal
    pub fn continuous_bindings(&self) -> impl Iterator<Item = &ControlBinding> + '_ {
        self.continuous.iter().filter_map(|&i| self.bindings.get(i))
    }

    pub fn info(&self) -> Vec<BindingInfo> {
        self.bindings.iter().map(|b| b.info()).collect()
    }

    pub fn looper(&self) -> Option<&LooperController> {
        self.looper.as_ref()
    }

    pub fn looper_mut(&mut self) -> Option<&mut LooperController> {
        self.looper.as_mut()
    }

    /// Hand the looper controller over to whoever drives it
    pub fn take_looper(&mut self) -> Option<LooperController> {
        self.looper.take()
    }
}

impl fmt::Debug for EffectUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectUnit")
            .field("name", &self.name())
            .field("index", &self.index)
            .field("active", &self.is_active())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

/// Every pedal the board knows, by configuration name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PedalKind {
    Boost,
    Overdrive,
    Wah,
    Tremolo,
    HarmonicTremolo,
    Chorus,
    Delay,
    MultiheadDelay,
    Reverb,
    Compressor,
    #[serde(rename = "loop", alias = "looper")]
    Loop,
}

impl PedalKind {
    pub const ALL: [PedalKind; 11] = [
        PedalKind::Boost,
        PedalKind::Overdrive,
        PedalKind::Wah,
        PedalKind::Tremolo,
        PedalKind::HarmonicTremolo,
        PedalKind::Chorus,
        PedalKind::Delay,
        PedalKind::MultiheadDelay,
        PedalKind::Reverb,
        PedalKind::Compressor,
        PedalKind::Loop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PedalKind::Boost => "boost",
            PedalKind::Overdrive => "overdrive",
            PedalKind::Wah => "wah",
            PedalKind::Tremolo => "tremolo",
            PedalKind::HarmonicTremolo => "harmonic-tremolo",
            PedalKind::Chorus => "chorus",
            PedalKind::Delay => "delay",
            PedalKind::MultiheadDelay => "multihead-delay",
            PedalKind::Reverb => "reverb",
            PedalKind::Compressor => "compressor",
            PedalKind::Loop => "loop",
        }
    }

    /// The pedal with its factory settings
    pub fn create(&self) -> Box<dyn Pedal> {
        match self {
            PedalKind::Boost => Box::new(BoostPedal::default()),
            PedalKind::Overdrive => Box::new(OverdrivePedal::default()),
            PedalKind::Wah => Box::new(WahPedal::default()),
            PedalKind::Tremolo => Box::new(TremoloPedal::default()),
            PedalKind::HarmonicTremolo => Box::new(HarmonicTremoloPedal::default()),
            PedalKind::Chorus => Box::new(ChorusPedal::default()),
            PedalKind::Delay => Box::new(DelayPedal::default()),
            PedalKind::MultiheadDelay => Box::new(MultiheadDelayPedal::default()),
            PedalKind::Reverb => Box::new(ReverbPedal::default()),
            PedalKind::Compressor => Box::new(CompressorPedal::default()),
            PedalKind::Loop => Box::new(LoopPedal::default()),
        }
    }
}

impl fmt::Display for PedalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PedalKind {
    type Err = PedalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "looper" {
            return Ok(PedalKind::Loop);
        }
        PedalKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or(PedalError::UnknownPedal(s.to_string()))
    }
}

/// The full catalog, in board order
pub fn default_chain() -> Vec<PedalKind> {
    PedalKind::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in PedalKind::ALL {
            assert_eq!(kind.name().parse::<PedalKind>().unwrap(), kind);
            assert_eq!(kind.create().kind(), kind);
        }
        assert_eq!("Looper".parse::<PedalKind>().unwrap(), PedalKind::Loop);
        assert!(matches!(
            "fuzz".parse::<PedalKind>(),
            Err(PedalError::UnknownPedal(_))
        ));
    }
}
