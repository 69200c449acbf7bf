//! External control routing
//!
//! Units register with a `ControlRouter` once assembled. From then on two
//! kinds of event drive them:
//!
//! - a **note** carrying a chain index toggles the bypass of the unit at
//!   that position (three reserved notes press the looper's buttons instead);
//! - a **controller** value 0-127 is broadcast to every binding registered
//!   for continuous control, each mapping it onto its own domain.
//!
//! Events are handled one at a time, in the order `route` is called.

use crate::binding::ControlBinding;
use crate::bypass::BypassSwitch;
use crate::error::UnroutableControlEvent;
use crate::looper::{LooperCommand, LooperController, LooperState};
use crate::pedals::EffectUnit;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// An already-parsed external control event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Discrete event addressing a chain position
    Note { index: u8 },
    /// Continuous expression value, 0-127
    Controller { value: u8 },
}

impl ControlEvent {
    /// Interpret a raw MIDI message
    ///
    /// Note-on with non-zero velocity gives `Note`, any control change gives
    /// `Controller`; everything else is not a control event.
    pub fn from_midi(message: &[u8]) -> Option<Self> {
        match *message {
            [status, note, velocity, ..] if status & 0xF0 == 0x90 && velocity > 0 => {
                Some(ControlEvent::Note { index: note })
            }
            [status, _, value, ..] if status & 0xF0 == 0xB0 => {
                Some(ControlEvent::Controller { value: value.min(127) })
            }
            _ => None,
        }
    }
}

/// Notes that press the looper's buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperNotes {
    #[serde(rename = "loop")]
    pub loop_note: u8,
    pub stop: u8,
    pub clear: u8,
}

impl Default for LooperNotes {
    fn default() -> Self {
        Self {
            loop_note: 121,
            stop: 122,
            clear: 123,
        }
    }
}

impl LooperNotes {
    fn command(&self, note: u8) -> Option<LooperCommand> {
        if note == self.loop_note {
            Some(LooperCommand::Loop)
        } else if note == self.stop {
            Some(LooperCommand::Stop)
        } else if note == self.clear {
            Some(LooperCommand::Clear)
        } else {
            None
        }
    }
}

/// What an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Toggled { index: usize, active: bool },
    Looper { command: LooperCommand, state: LooperState },
    /// Number of bindings that received the value
    Controller { bindings: usize },
}

/// Dispatches control events to registered units
#[derive(Default)]
pub struct ControlRouter {
    toggles: Vec<(usize, BypassSwitch)>,
    continuous: Vec<ControlBinding>,
    loopers: Vec<(usize, LooperController)>,
    looper_notes: LooperNotes,
}

impl ControlRouter {
    pub fn new(looper_notes: LooperNotes) -> Self {
        Self {
            looper_notes,
            ..Self::default()
        }
    }

    /// Register a unit's bypass, continuous bindings and looper
    ///
    /// The looper controller moves into the router.
    pub fn register(&mut self, unit: &mut EffectUnit) {
        let index = unit.index();
        if let Some(bypass) = unit.bypass() {
            self.toggles.push((index, bypass.clone()));
        }
        self.continuous.extend(unit.continuous_bindings().cloned());
        if let Some(looper) = unit.take_looper() {
            self.loopers.push((index, looper));
        }
        debug!(index, unit = unit.name(), "registered with control router");
    }

    /// Apply one event
    pub fn route(&mut self, event: ControlEvent) -> Result<Routed, UnroutableControlEvent> {
        let routed = match event {
            ControlEvent::Note { index } => self.route_note(index),
            ControlEvent::Controller { value } => self.route_controller(value),
        };
        match &routed {
            Ok(routed) => debug!(?event, ?routed, "control event routed"),
            Err(unroutable) => trace!("ignored control event: {}", unroutable),
        }
        routed
    }

    fn route_note(&mut self, note: u8) -> Result<Routed, UnroutableControlEvent> {
        if let Some(command) = self.looper_notes.command(note) {
            if let Some((_, looper)) = self.loopers.first_mut() {
                let state = looper.command(command);
                return Ok(Routed::Looper { command, state });
            }
        }

        let index = note as usize;
        self.toggles
            .iter()
            .find(|(position, _)| *position == index)
            .map(|(_, bypass)| Routed::Toggled {
                index,
                active: bypass.toggle(None),
            })
            .ok_or(UnroutableControlEvent::Note(note))
    }

    fn route_controller(&self, value: u8) -> Result<Routed, UnroutableControlEvent> {
        if self.continuous.is_empty() {
            return Err(UnroutableControlEvent::Controller(value));
        }
        for binding in &self.continuous {
            binding.apply_controller(value);
        }
        Ok(Routed::Controller {
            bindings: self.continuous.len(),
        })
    }

    /// Let every looper catch up with its tape
    pub fn poll(&mut self) {
        for (_, looper) in self.loopers.iter_mut() {
            looper.poll();
        }
    }

    /// The looper registered at chain position `index`
    pub fn looper(&self, index: usize) -> Option<&LooperController> {
        self.loopers
            .iter()
            .find(|(position, _)| *position == index)
            .map(|(_, looper)| looper)
    }

    pub fn looper_mut(&mut self, index: usize) -> Option<&mut LooperController> {
        self.loopers
            .iter_mut()
            .find(|(position, _)| *position == index)
            .map(|(_, looper)| looper)
    }

    pub fn continuous_bindings(&self) -> &[ControlBinding] {
        &self.continuous
    }

    pub fn looper_notes(&self) -> LooperNotes {
        self.looper_notes
    }
}
