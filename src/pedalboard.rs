//! The assembled board: render side and control side
//!
//! `Pedalboard::new` builds the graph from a configuration, assembles the
//! chain, registers every unit with a `ControlRouter` and turns the graph
//! into a `BlockProcessor`. `into_parts` then splits it for the two threads:
//!
//! ```text
//!   audio thread                      control thread
//! ┌────────────────┐  SharedParam   ┌──────────────────────┐
//! │ BlockProcessor │ ◄──────────────│ PedalboardControl    │
//! │  (nodes)       │  tape queues   │  chain + router      │ ◄── ControlEvent
//! │                │ ◄─────────────►│                      │
//! └────────────────┘                └──────────────────────┘
//! ```

use crate::block_processor::{BlockProcessor, RunFlag};
use crate::chain::{AssemblyFailure, ChainAssembly, EffectChain};
use crate::config::PedalboardConfig;
use crate::error::{OutOfRangeWarning, PedalError, PedalResult, UnroutableControlEvent};
use crate::graph::AudioGraph;
use crate::impulse::ImpulseProvider;
use crate::pedals::{Pedal, PedalKind};
use crate::router::{ControlEvent, ControlRouter, LooperNotes, Routed};
use tracing::{info, warn};

/// Everything the board needs besides the pedals themselves
pub struct BoardSettings<'a> {
    pub sample_rate: f32,
    pub impulses: &'a dyn ImpulseProvider,
    pub max_loop_frames: usize,
    pub looper_notes: LooperNotes,
}

pub struct Pedalboard {
    processor: BlockProcessor,
    control: PedalboardControl,
}

impl Pedalboard {
    /// Build the board a configuration describes
    ///
    /// Pedals that fail to assemble are skipped and listed in
    /// `PedalboardControl::failures`.
    ///
    /// # Errors
    /// `InvalidConfig` for out-of-range settings; `UnknownParam` /
    /// `UnknownPedal` for control overrides naming things that do not exist.
    pub fn new(config: &PedalboardConfig) -> PedalResult<Self> {
        config.validate()?;
        let impulses = config.reverb.provider();
        let pedals: Vec<Box<dyn Pedal>> = config.chain.iter().map(|kind| kind.create()).collect();
        let board = Self::with_pedals(
            &pedals,
            BoardSettings {
                sample_rate: config.sample_rate as f32,
                impulses: impulses.as_ref(),
                max_loop_frames: config.max_loop_frames(),
                looper_notes: config.midi.looper,
            },
        )?;

        for (name, controls) in &config.controls {
            let kind: PedalKind = name.parse()?;
            for unit in board.control.chain.units().iter().filter(|u| u.kind() == kind) {
                for (binding, &value) in controls {
                    if let Some(warning) = unit.set(binding, value)? {
                        warn!("configured {}", warning);
                    }
                }
            }
        }
        for (name, &active) in &config.active {
            let kind: PedalKind = name.parse()?;
            for unit in board.control.chain.units().iter().filter(|u| u.kind() == kind) {
                unit.toggle(Some(active));
            }
        }
        Ok(board)
    }

    /// Build a board from explicit pedals
    pub fn with_pedals(pedals: &[Box<dyn Pedal>], settings: BoardSettings<'_>) -> PedalResult<Self> {
        let mut graph = AudioGraph::new(settings.sample_rate);
        let ChainAssembly { mut chain, failures } = EffectChain::assemble(
            &mut graph,
            pedals,
            settings.impulses,
            settings.max_loop_frames,
        );

        let mut router = ControlRouter::new(settings.looper_notes);
        for unit in chain.units_mut() {
            router.register(unit);
        }

        let run_flag = RunFlag::new();
        let nodes = graph.node_count();
        let processor = BlockProcessor::with_run_flag(graph, run_flag.clone())?;
        info!(
            units = chain.len(),
            failed = failures.len(),
            nodes,
            sample_rate = settings.sample_rate,
            "pedalboard ready"
        );

        Ok(Self {
            processor,
            control: PedalboardControl {
                chain,
                router,
                run_flag,
                failures,
            },
        })
    }

    pub fn processor_mut(&mut self) -> &mut BlockProcessor {
        &mut self.processor
    }

    pub fn control(&self) -> &PedalboardControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut PedalboardControl {
        &mut self.control
    }

    /// Split into the render half and the control half
    pub fn into_parts(self) -> (BlockProcessor, PedalboardControl) {
        (self.processor, self.control)
    }
}

/// Control-thread handle: knobs, switches, events, teardown
pub struct PedalboardControl {
    chain: EffectChain,
    router: ControlRouter,
    run_flag: RunFlag,
    failures: Vec<AssemblyFailure>,
}

impl PedalboardControl {
    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    pub fn router(&self) -> &ControlRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ControlRouter {
        &mut self.router
    }

    pub fn failures(&self) -> &[AssemblyFailure] {
        &self.failures
    }

    /// Apply an external control event
    pub fn route(&mut self, event: ControlEvent) -> Result<Routed, UnroutableControlEvent> {
        self.router.route(event)
    }

    /// Process looper events reported by the render thread
    pub fn poll(&mut self) {
        self.router.poll();
    }

    /// Set binding `name` of the unit at `index`
    pub fn set(&self, index: usize, name: &str, value: f32) -> PedalResult<Option<OutOfRangeWarning>> {
        let unit = self
            .chain
            .unit(index)
            .ok_or_else(|| PedalError::UnknownPedal(format!("#{}", index)))?;
        unit.set(name, value)
    }

    /// Flip the bypass of the unit at `index`
    pub fn toggle(&self, index: usize) -> Option<bool> {
        self.chain.unit(index).and_then(|unit| unit.toggle(None))
    }

    /// Tear the chain down: every node stops, the output goes silent
    pub fn deactivate(&self) {
        info!("pedalboard deactivated");
        self.run_flag.stop();
    }

    pub fn is_running(&self) -> bool {
        self.run_flag.is_running()
    }
}
