//! Effect chain orchestrator
//!
//! Threads the source through the pedals in list order, `source → unit 1 →
//! … → unit n → sink`, assigning 1-based indices by list position. A pedal
//! that fails to assemble is rolled back out of the graph and skipped; its
//! index stays unoccupied and the failure is reported. The order is fixed
//! once assembled.

use crate::audio_node::NodeId;
use crate::error::PedalError;
use crate::graph::AudioGraph;
use crate::impulse::ImpulseProvider;
use crate::nodes::sum::SumNode;
use crate::pedals::{BuildContext, EffectUnit, Pedal, PedalKind};
use tracing::{info, warn};

/// A pedal that could not be assembled
#[derive(Debug)]
pub struct AssemblyFailure {
    pub index: usize,
    pub kind: PedalKind,
    pub error: PedalError,
}

/// The assembled, ordered units
#[derive(Debug)]
pub struct EffectChain {
    source: NodeId,
    sink: NodeId,
    units: Vec<EffectUnit>,
}

/// Result of `EffectChain::assemble`
#[derive(Debug)]
pub struct ChainAssembly {
    pub chain: EffectChain,
    pub failures: Vec<AssemblyFailure>,
}

impl EffectChain {
    /// Build every pedal into `graph` and mark the sink as the graph output
    ///
    /// # Example
    /// ```ignore
    /// let pedals: Vec<Box<dyn Pedal>> = vec![Box::new(BoostPedal::default()), Box::new(DelayPedal::default())];
    /// let ChainAssembly { chain, failures } = EffectChain::assemble(&mut graph, &pedals, &NoImpulse, 44100 * 30);
    /// assert!(failures.is_empty());
    /// ```
    pub fn assemble(
        graph: &mut AudioGraph,
        pedals: &[Box<dyn Pedal>],
        impulses: &dyn ImpulseProvider,
        max_loop_frames: usize,
    ) -> ChainAssembly {
        let source = graph.add_source();
        let mut current = source;
        let mut units = Vec::with_capacity(pedals.len());
        let mut failures = Vec::new();

        for (position, pedal) in pedals.iter().enumerate() {
            let index = position + 1;
            let checkpoint = graph.checkpoint();
            let mut context = BuildContext {
                graph: &mut *graph,
                index,
                impulses,
                max_loop_frames,
            };
            match pedal.build(&mut context, current) {
                Ok(unit) => {
                    info!(index, pedal = %pedal.kind(), active = unit.is_active(), "unit assembled");
                    current = unit.output();
                    units.push(unit);
                }
                Err(error) => {
                    graph.rollback(checkpoint);
                    warn!(index, pedal = %pedal.kind(), "skipping unit: {}", error);
                    failures.push(AssemblyFailure {
                        index,
                        kind: pedal.kind(),
                        error,
                    });
                }
            }
        }

        let sink = graph.add_node(SumNode::named("sink"));
        if let Err(error) = graph.connect(current, sink).and_then(|_| graph.set_output(sink)) {
            warn!("could not connect sink: {}", error);
        }

        ChainAssembly {
            chain: EffectChain {
                source,
                sink,
                units,
            },
            failures,
        }
    }

    /// Assemble factory-default pedals of the given kinds
    pub fn from_kinds(
        graph: &mut AudioGraph,
        kinds: &[PedalKind],
        impulses: &dyn ImpulseProvider,
        max_loop_frames: usize,
    ) -> ChainAssembly {
        let pedals: Vec<Box<dyn Pedal>> = kinds.iter().map(|kind| kind.create()).collect();
        Self::assemble(graph, &pedals, impulses, max_loop_frames)
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn units(&self) -> &[EffectUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [EffectUnit] {
        &mut self.units
    }

    /// Unit at 1-based chain position `index`
    pub fn unit(&self, index: usize) -> Option<&EffectUnit> {
        self.units.iter().find(|unit| unit.index() == index)
    }

    pub fn unit_mut(&mut self, index: usize) -> Option<&mut EffectUnit> {
        self.units.iter_mut().find(|unit| unit.index() == index)
    }

    /// First unit of a kind
    pub fn find(&self, kind: PedalKind) -> Option<&EffectUnit> {
        self.units.iter().find(|unit| unit.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
