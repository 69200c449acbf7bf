//! Looper state machine
//!
//! `Looper` is a pure transition function: given an input (a user command or
//! an event reported by the tape) it returns the next state and the tape
//! commands to issue. `LooperController` wires it to a `TapeNode` through
//! `TapeQueues`.
//!
//! ```text
//!  empty --loop--> recording --take ready--> idle (looping)
//!                                              |  ^
//!                                         loop |  | take ready (layer done)
//!                                              v  |
//!               prepared --layer started--> recording (overdub)
//! ```
//!
//! Stop requests wait for a boundary: a take being recorded finishes first,
//! playback pauses at the next wrap. `clear` resets everything from any
//! state. The machine only moves on events that say what the tape did, so
//! a wrap racing a button press cannot be mistaken for a layer start.

use crate::nodes::tape::{TapeCommand, TapeEvent, TapeQueues};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperState {
    Empty,
    Recording,
    /// Overdub armed, waiting for the loop boundary
    Prepared,
    Idle,
    /// Stop requested, waiting for the take or the loop boundary
    Ceasing,
}

impl fmt::Display for LooperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LooperState::Empty => "empty",
            LooperState::Recording => "recording",
            LooperState::Prepared => "prepared",
            LooperState::Idle => "idle",
            LooperState::Ceasing => "ceasing",
        };
        f.write_str(name)
    }
}

/// User-facing looper buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperCommand {
    Loop,
    Stop,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperInput {
    Command(LooperCommand),
    Event(TapeEvent),
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LooperState,
    pub actions: Vec<TapeCommand>,
}

/// Looper FSM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Looper {
    state: LooperState,
    playing: bool,
    has_take: bool,
    /// True while the tape writes a layer over playback
    overdubbing: bool,
}

impl Default for Looper {
    fn default() -> Self {
        Self::new()
    }
}

impl Looper {
    pub fn new() -> Self {
        Self {
            state: LooperState::Empty,
            playing: false,
            has_take: false,
            overdubbing: false,
        }
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_take(&self) -> bool {
        self.has_take
    }

    pub fn is_overdubbing(&self) -> bool {
        self.overdubbing
    }

    /// Step the machine and return what the tape has to do
    pub fn handle(&mut self, input: LooperInput) -> Transition {
        use LooperCommand::*;
        use LooperInput::{Command, Event};
        use LooperState::*;
        use TapeCommand as Tape;

        let mut actions = Vec::new();
        let next = match (self.state, input) {
            (_, Command(Clear)) => {
                self.playing = false;
                self.has_take = false;
                self.overdubbing = false;
                actions.push(Tape::Discard);
                Empty
            }

            (Empty, Command(Loop)) => {
                actions.push(Tape::StartRecording);
                Recording
            }
            (Empty, _) => Empty,

            // Finish the take or layer; the tape reports when it is done
            (Recording, Command(Loop)) => {
                actions.push(Tape::StopRecording);
                Recording
            }
            (Recording, Command(Stop)) => {
                actions.push(Tape::StopRecording);
                if self.playing {
                    actions.push(Tape::PauseAtWrap);
                }
                Ceasing
            }
            (Recording, Event(TapeEvent::TakeReady { .. })) => {
                self.has_take = true;
                if self.overdubbing {
                    // Layer closed at the wrap and is looping already
                    self.overdubbing = false;
                } else {
                    self.playing = true;
                    actions.push(Tape::StartPlayback);
                }
                Idle
            }
            (Recording, Event(TapeEvent::TakeEmpty)) => Empty,
            (Recording, Event(_)) => Recording,

            (Idle, Command(Loop)) => {
                if !self.playing {
                    self.playing = true;
                    actions.push(Tape::Rewind);
                    actions.push(Tape::StartPlayback);
                }
                actions.push(Tape::ArmOverdub);
                Prepared
            }
            (Idle, Command(Stop)) => {
                if self.playing {
                    actions.push(Tape::PauseAtWrap);
                    Ceasing
                } else {
                    self.playing = true;
                    actions.push(Tape::Rewind);
                    actions.push(Tape::StartPlayback);
                    Idle
                }
            }
            (Idle, Event(TapeEvent::TakeReady { .. })) => {
                self.has_take = true;
                Idle
            }
            (Idle, Event(TapeEvent::LayerStarted)) => {
                // Disarm arrived after the boundary; finish the layer without input
                actions.push(Tape::StopRecording);
                Idle
            }
            (Idle, Event(TapeEvent::Paused)) => {
                self.playing = false;
                Idle
            }
            (Idle, Event(TapeEvent::TakeEmpty)) => Idle,

            (Prepared, Event(TapeEvent::LayerStarted)) => {
                self.overdubbing = true;
                Recording
            }
            (Prepared, Command(Loop)) => {
                actions.push(Tape::Disarm);
                Idle
            }
            (Prepared, Command(Stop)) => {
                actions.push(Tape::Disarm);
                actions.push(Tape::PauseAtWrap);
                Ceasing
            }
            (Prepared, Event(_)) => Prepared,

            (Ceasing, Event(TapeEvent::TakeReady { .. })) => {
                self.has_take = true;
                self.overdubbing = false;
                if self.playing {
                    // Playback stops at the same boundary
                    Ceasing
                } else {
                    Idle
                }
            }
            (Ceasing, Event(TapeEvent::TakeEmpty)) => {
                if self.has_take {
                    Idle
                } else {
                    Empty
                }
            }
            (Ceasing, Event(TapeEvent::LayerStarted)) => {
                actions.push(Tape::StopRecording);
                Ceasing
            }
            (Ceasing, Event(TapeEvent::Paused)) => {
                self.playing = false;
                self.overdubbing = false;
                Idle
            }
            (Ceasing, Command(_)) => Ceasing,
        };

        if next != self.state {
            debug!(from = %self.state, to = %next, ?input, "looper transition");
        }
        self.state = next;
        Transition { next, actions }
    }
}

/// Control-side looper: FSM plus the queues to its tape
pub struct LooperController {
    queues: Arc<TapeQueues>,
    looper: Looper,
}

impl LooperController {
    pub fn new(queues: Arc<TapeQueues>) -> Self {
        Self {
            queues,
            looper: Looper::new(),
        }
    }

    /// Apply any events the tape has reported since the last call
    pub fn poll(&mut self) -> LooperState {
        let dropped = self.queues.take_dropped();
        if dropped > 0 {
            warn!(dropped, state = %self.looper.state(), "looper tape events lost");
        }
        while let Some(event) = self.queues.try_event() {
            self.step(LooperInput::Event(event));
        }
        self.looper.state()
    }

    /// Handle a button press
    pub fn command(&mut self, command: LooperCommand) -> LooperState {
        self.poll();
        self.step(LooperInput::Command(command));
        self.looper.state()
    }

    fn step(&mut self, input: LooperInput) {
        let transition = self.looper.handle(input);
        for action in transition.actions {
            if !self.queues.send(action) {
                warn!(?action, "looper command queue full, command dropped");
            }
        }
    }

    pub fn state(&self) -> LooperState {
        self.looper.state()
    }

    pub fn looper(&self) -> &Looper {
        &self.looper
    }
}
