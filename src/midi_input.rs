//! MIDI input for pedal switching and the expression pedal
//!
//! The midir callback parses each message into a `ControlEvent` and sends it
//! over a channel; the control thread drains the channel and hands the
//! events to the `ControlRouter`.

use crate::error::{PedalError, PedalResult};
use crate::router::ControlEvent;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use std::sync::mpsc::{channel, Receiver};
use tracing::{debug, info};

/// MIDI input device info
#[derive(Debug, Clone)]
pub struct MidiInputDevice {
    pub name: String,
    pub index: usize,
}

/// A live connection to one MIDI input port
pub struct MidiControlInput {
    port_name: String,
    _connection: MidiInputConnection<()>,
    receiver: Receiver<ControlEvent>,
}

fn midi_error(e: impl std::fmt::Display) -> PedalError {
    PedalError::Midi(e.to_string())
}

impl MidiControlInput {
    /// List available MIDI input devices
    pub fn list_devices() -> PedalResult<Vec<MidiInputDevice>> {
        let midi_in = MidiInput::new("pedalboard scanner").map_err(midi_error)?;
        let devices = midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(i, port)| {
                midi_in
                    .port_name(port)
                    .ok()
                    .map(|name| MidiInputDevice { name, index: i })
            })
            .collect();
        Ok(devices)
    }

    /// Connect to the first port whose name contains `device_name`
    pub fn connect(device_name: &str) -> PedalResult<Self> {
        let midi_in = MidiInput::new("pedalboard input").map_err(midi_error)?;
        let port = midi_in
            .ports()
            .into_iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map_or(false, |n| n.contains(device_name))
            })
            .ok_or_else(|| PedalError::Midi(format!("MIDI device '{}' not found", device_name)))?;
        Self::open(midi_in, port)
    }

    /// Connect to a MIDI input device by index
    pub fn connect_by_index(index: usize) -> PedalResult<Self> {
        let midi_in = MidiInput::new("pedalboard input").map_err(midi_error)?;
        let port = midi_in
            .ports()
            .get(index)
            .cloned()
            .ok_or_else(|| PedalError::Midi(format!("MIDI device index {} not found", index)))?;
        Self::open(midi_in, port)
    }

    fn open(mut midi_in: MidiInput, port: MidiInputPort) -> PedalResult<Self> {
        let port_name = midi_in.port_name(&port).map_err(midi_error)?;
        let (sender, receiver) = channel::<ControlEvent>();

        midi_in.ignore(Ignore::Sysex | Ignore::Time);

        let connection = midi_in
            .connect(
                &port,
                "pedalboard-control",
                move |_timestamp_us, message, _| {
                    if let Some(event) = ControlEvent::from_midi(message) {
                        // Receiver gone means the board is shutting down
                        let _ = sender.send(event);
                    }
                },
                (),
            )
            .map_err(midi_error)?;

        info!(port = %port_name, "MIDI input connected");
        Ok(Self {
            port_name,
            _connection: connection,
            receiver,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Next pending event, if any (non-blocking)
    pub fn try_recv(&self) -> Option<ControlEvent> {
        self.receiver.try_recv().ok()
    }

    /// Every pending event, in arrival order
    pub fn drain(&self) -> Vec<ControlEvent> {
        let events: Vec<ControlEvent> = self.receiver.try_iter().collect();
        if !events.is_empty() {
            debug!(count = events.len(), "MIDI events received");
        }
        events
    }
}
