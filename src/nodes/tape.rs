//! Looper tape - record, loop and overdub on the render thread
//!
//! The tape owns two preallocated buffers: the take being looped and the
//! one being recorded. The control thread drives it with `TapeCommand`s and
//! learns about progress from `TapeEvent`s; both travel through bounded
//! lock-free queues, so the render thread never waits.
//!
//! Overdubs are sample-accurate: `ArmOverdub` makes the tape start a new
//! layer exactly when playback next wraps. The layer records the playing
//! take plus the live input for one full loop and then replaces the take,
//! so layers accumulate. `PauseAtWrap` stops playback at the same kind of
//! boundary. Every event names what the tape actually did, so the
//! controller never has to guess which wrap started a layer.

use crate::audio_node::{AudioNode, Frame, ProcessContext};
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const QUEUE_CAPACITY: usize = 64;

/// Control → render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeCommand {
    /// Record a fresh take
    StartRecording,
    /// Finish the current take or layer
    StopRecording,
    /// Start an overdub layer at the next playback wrap
    ArmOverdub,
    /// Cancel a pending overdub
    Disarm,
    /// Play the take from the current position, looping
    StartPlayback,
    /// Pause and rewind when playback next reaches the end of the take
    PauseAtWrap,
    /// Move playback back to the start of the take
    Rewind,
    /// Stop everything and forget the take
    Discard,
}

/// Render → control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeEvent {
    /// A take or layer finished and is now the one being looped
    TakeReady { frames: usize },
    /// Recording stopped before a single frame was captured
    TakeEmpty,
    /// An armed overdub began at the loop boundary
    LayerStarted,
    /// A `PauseAtWrap` took effect; playback sits at frame zero
    Paused,
}

/// Queues shared by a tape node and its controller
pub struct TapeQueues {
    commands: ArrayQueue<TapeCommand>,
    events: ArrayQueue<TapeEvent>,
    dropped: AtomicUsize,
}

impl TapeQueues {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            commands: ArrayQueue::new(QUEUE_CAPACITY),
            events: ArrayQueue::new(QUEUE_CAPACITY),
            dropped: AtomicUsize::new(0),
        })
    }

    /// Queue a command; returns false if the queue is full
    pub fn send(&self, command: TapeCommand) -> bool {
        self.commands.push(command).is_ok()
    }

    pub fn try_event(&self) -> Option<TapeEvent> {
        self.events.pop()
    }

    /// Events lost to a full queue since the last call
    pub fn take_dropped(&self) -> usize {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    fn emit(&self, event: TapeEvent) {
        if self.events.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recording {
    Off,
    /// First take, grows until stopped or full
    Take,
    /// Layer over the playing take; `live` = false once stop was requested
    Layer { live: bool },
}

/// Looper tape node
///
/// Output is the playback signal only; route the dry signal around it.
pub struct TapeNode {
    queues: Arc<TapeQueues>,
    take: Vec<Frame>,
    record: Vec<Frame>,
    capacity: usize,
    position: usize,
    playing: bool,
    armed: bool,
    pause_at_wrap: bool,
    recording: Recording,
}

impl TapeNode {
    /// `max_frames` bounds the take length; both buffers are allocated here
    pub fn new(queues: Arc<TapeQueues>, max_frames: usize) -> Self {
        let capacity = max_frames.max(1);
        Self {
            queues,
            take: Vec::with_capacity(capacity),
            record: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            playing: false,
            armed: false,
            pause_at_wrap: false,
            recording: Recording::Off,
        }
    }

    /// Frames in the looped take
    pub fn take_len(&self) -> usize {
        self.take.len()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording != Recording::Off
    }

    fn apply(&mut self, command: TapeCommand) {
        match command {
            TapeCommand::StartRecording => {
                if self.recording == Recording::Off {
                    self.record.clear();
                    self.recording = Recording::Take;
                }
            }
            TapeCommand::StopRecording => match self.recording {
                Recording::Take => self.finish_take(),
                // Finish the layer at the wrap without further input
                Recording::Layer { .. } => self.recording = Recording::Layer { live: false },
                Recording::Off => {}
            },
            TapeCommand::ArmOverdub => self.armed = !self.take.is_empty(),
            TapeCommand::Disarm => self.armed = false,
            TapeCommand::StartPlayback => self.playing = !self.take.is_empty(),
            TapeCommand::PauseAtWrap => {
                if self.playing {
                    self.pause_at_wrap = true;
                } else {
                    self.position = 0;
                    self.queues.emit(TapeEvent::Paused);
                }
            }
            TapeCommand::Rewind => self.position = 0,
            TapeCommand::Discard => {
                self.take.clear();
                self.record.clear();
                self.position = 0;
                self.playing = false;
                self.armed = false;
                self.pause_at_wrap = false;
                self.recording = Recording::Off;
            }
        }
    }

    fn finish_take(&mut self) {
        self.recording = Recording::Off;
        if self.record.is_empty() {
            self.queues.emit(TapeEvent::TakeEmpty);
            return;
        }
        std::mem::swap(&mut self.take, &mut self.record);
        self.record.clear();
        self.position = 0;
        self.queues.emit(TapeEvent::TakeReady {
            frames: self.take.len(),
        });
    }

    fn wrap(&mut self) {
        self.position = 0;
        if let Recording::Layer { .. } = self.recording {
            // Layer holds the old take plus the new input: loop it from now on
            std::mem::swap(&mut self.take, &mut self.record);
            self.recording = Recording::Off;
            self.queues.emit(TapeEvent::TakeReady {
                frames: self.take.len(),
            });
        }
        if self.pause_at_wrap {
            self.pause_at_wrap = false;
            self.armed = false;
            self.playing = false;
            self.queues.emit(TapeEvent::Paused);
        } else if self.armed {
            self.armed = false;
            // Within capacity: no allocation
            self.record.clear();
            self.record.resize(self.take.len(), Frame::SILENCE);
            self.recording = Recording::Layer { live: true };
            self.queues.emit(TapeEvent::LayerStarted);
        }
    }
}

impl AudioNode for TapeNode {
    fn process(&mut self, input: Frame, _params: &[f32], _context: &ProcessContext) -> Frame {
        while let Some(command) = self.queues.commands.pop() {
            self.apply(command);
        }

        if self.recording == Recording::Take {
            self.record.push(input);
            if self.record.len() >= self.capacity {
                self.finish_take();
            }
        }

        if !self.playing || self.take.is_empty() {
            return Frame::SILENCE;
        }

        let out = self.take[self.position];
        if let Recording::Layer { live } = self.recording {
            let layer = if live { out + input } else { out };
            self.record[self.position] = layer;
        }

        self.position += 1;
        if self.position >= self.take.len() {
            self.wrap();
        }
        out
    }

    fn name(&self) -> &str {
        "TapeNode"
    }

    fn stop(&mut self) {
        self.playing = false;
        self.recording = Recording::Off;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(tape: &mut TapeNode, input: &[f32]) -> Vec<f32> {
        let ctx = ProcessContext::new(1000.0);
        input
            .iter()
            .map(|&x| tape.process(Frame::mono(x), &[], &ctx).left)
            .collect()
    }

    fn drain(queues: &TapeQueues) -> Vec<TapeEvent> {
        std::iter::from_fn(|| queues.try_event()).collect()
    }

    #[test]
    fn test_record_then_loop() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);

        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0, 2.0, 3.0]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        let out = feed(&mut tape, &[0.0; 7]);

        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
        // Plain wraps are not reported
        assert_eq!(drain(&queues), vec![TapeEvent::TakeReady { frames: 3 }]);
    }

    #[test]
    fn test_empty_take_is_reported() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);

        // Start and stop land in the same frame: nothing was captured
        queues.send(TapeCommand::StartRecording);
        queues.send(TapeCommand::StopRecording);
        feed(&mut tape, &[1.0; 3]);

        assert_eq!(drain(&queues), vec![TapeEvent::TakeEmpty]);
        assert!(!tape.is_recording());
        assert_eq!(tape.take_len(), 0);

        // A later take records normally
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0; 3]);
        queues.send(TapeCommand::StopRecording);
        feed(&mut tape, &[0.0]);
        assert_eq!(drain(&queues), vec![TapeEvent::TakeReady { frames: 3 }]);
    }

    #[test]
    fn test_layer_started_only_when_layer_begins() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0; 4]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        // Two unarmed wraps, then playback sits at frame 2
        feed(&mut tape, &[0.0; 10]);
        assert_eq!(drain(&queues), vec![TapeEvent::TakeReady { frames: 4 }]);

        queues.send(TapeCommand::ArmOverdub);
        feed(&mut tape, &[0.0]);
        assert!(drain(&queues).is_empty(), "armed tape waits for the boundary");
        assert!(!tape.is_recording());

        feed(&mut tape, &[0.0]);
        assert_eq!(drain(&queues), vec![TapeEvent::LayerStarted]);
        assert!(tape.is_recording());
    }

    #[test]
    fn test_pause_at_wrap() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0, 2.0, 3.0, 4.0]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        feed(&mut tape, &[0.0]);
        drain(&queues);

        queues.send(TapeCommand::PauseAtWrap);
        let out = feed(&mut tape, &[0.0; 5]);
        assert_eq!(out, vec![2.0, 3.0, 4.0, 0.0, 0.0]);
        assert_eq!(drain(&queues), vec![TapeEvent::Paused]);
        assert!(!tape.is_playing());

        // Resumes from the top
        queues.send(TapeCommand::StartPlayback);
        assert_eq!(feed(&mut tape, &[0.0; 2]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_pause_at_wrap_cancels_armed_layer() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0; 3]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        feed(&mut tape, &[0.0]);
        drain(&queues);

        queues.send(TapeCommand::ArmOverdub);
        queues.send(TapeCommand::PauseAtWrap);
        feed(&mut tape, &[0.0; 4]);
        assert_eq!(drain(&queues), vec![TapeEvent::Paused]);
        assert!(!tape.is_recording());
    }

    #[test]
    fn test_full_event_queue_counts_drops() {
        let queues = TapeQueues::new();
        for _ in 0..QUEUE_CAPACITY + 3 {
            queues.emit(TapeEvent::Paused);
        }
        assert_eq!(queues.take_dropped(), 3);
        assert_eq!(queues.take_dropped(), 0);
        assert_eq!(drain(&queues).len(), QUEUE_CAPACITY);
    }

    #[test]
    fn test_overdub_starts_at_wrap_and_accumulates() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 100);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0, 1.0, 1.0, 1.0]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        feed(&mut tape, &[0.0, 0.0]);

        // Armed mid-loop: the layer must begin at the next wrap
        queues.send(TapeCommand::ArmOverdub);
        feed(&mut tape, &[5.0, 5.0]);
        assert!(!tape.is_recording() || tape.position == 0);

        // One full loop of overdub: old take stays audible underneath
        let during = feed(&mut tape, &[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(during, vec![1.0, 1.0, 1.0, 1.0]);

        let after = feed(&mut tape, &[0.0; 4]);
        assert_eq!(after, vec![1.5, 1.5, 1.5, 1.5]);
        assert!(drain(&queues).contains(&TapeEvent::TakeReady { frames: 4 }));
    }

    #[test]
    fn test_take_stops_when_full() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 4);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0; 10]);
        assert_eq!(tape.take_len(), 4);
        assert!(!tape.is_recording());
    }

    #[test]
    fn test_discard_forgets_take() {
        let queues = TapeQueues::new();
        let mut tape = TapeNode::new(queues.clone(), 16);
        queues.send(TapeCommand::StartRecording);
        feed(&mut tape, &[1.0; 3]);
        queues.send(TapeCommand::StopRecording);
        queues.send(TapeCommand::StartPlayback);
        feed(&mut tape, &[0.0]);

        queues.send(TapeCommand::Discard);
        let out = feed(&mut tape, &[0.0; 3]);
        assert_eq!(out, vec![0.0; 3]);
        assert_eq!(tape.take_len(), 0);
        assert!(!tape.is_playing());
    }
}
