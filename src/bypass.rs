//! Bypass switching for effect units
//!
//! A switch owns two gains, `dry` and `wet`, that are always complementary:
//! active means dry 0 / wet 1, bypassed means dry 1 / wet 0. The gains
//! smooth their own changes, so flipping them is click-free.
//!
//! Two wirings:
//! - **hard**: `input → dry → out` and `effect → wet → out`. The wet path
//!   is silent while bypassed.
//! - **tailed**: `input → dry → out` and `input → send → effect → return → out`.
//!   The toggled gain is the *send*; the return is never muted, so echoes and
//!   reverb already inside the effect keep decaying after the unit is
//!   switched off.

use crate::audio_node::NodeId;
use crate::error::PedalResult;
use crate::graph::AudioGraph;
use crate::nodes::gain::GainNode;
use crate::nodes::sum::SumNode;
use crate::param::ParamRef;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassVariant {
    Hard,
    Tailed,
}

/// Nodes created by a tailed bypass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailedPorts {
    /// Feed the effect from here
    pub send: NodeId,
    /// Connect the effect output here
    pub ret: NodeId,
    /// Combined output of the unit
    pub output: NodeId,
}

/// Click-free active/bypassed switch
#[derive(Clone)]
pub struct BypassSwitch {
    active: Arc<AtomicBool>,
    dry: ParamRef,
    wet: ParamRef,
    variant: BypassVariant,
}

impl BypassSwitch {
    /// Hard bypass around an effect whose output is `wet_output`
    ///
    /// Returns the combined output node and the switch.
    pub fn hard(
        graph: &mut AudioGraph,
        input: NodeId,
        wet_output: NodeId,
        active: bool,
    ) -> PedalResult<(NodeId, BypassSwitch)> {
        let (dry_gain, wet_gain) = gains(active);
        let dry = graph.add_node(GainNode::new(dry_gain));
        let wet = graph.add_node(GainNode::new(wet_gain));
        let output = graph.add_node(SumNode::named("bypass-out"));

        graph.connect(input, dry)?;
        graph.connect(wet_output, wet)?;
        graph.connect(dry, output)?;
        graph.connect(wet, output)?;

        let switch = BypassSwitch {
            active: Arc::new(AtomicBool::new(active)),
            dry: graph.param(dry, "gain")?,
            wet: graph.param(wet, "gain")?,
            variant: BypassVariant::Hard,
        };
        Ok((output, switch))
    }

    /// Tailed bypass; wire the effect from `ports.send` to `ports.ret`
    pub fn tailed(
        graph: &mut AudioGraph,
        input: NodeId,
        active: bool,
    ) -> PedalResult<(TailedPorts, BypassSwitch)> {
        let (dry_gain, send_gain) = gains(active);
        let dry = graph.add_node(GainNode::new(dry_gain));
        let send = graph.add_node(GainNode::new(send_gain));
        let ret = graph.add_node(SumNode::named("fx-return"));
        let output = graph.add_node(SumNode::named("bypass-out"));

        graph.connect(input, dry)?;
        graph.connect(input, send)?;
        graph.connect(dry, output)?;
        graph.connect(ret, output)?;

        let switch = BypassSwitch {
            active: Arc::new(AtomicBool::new(active)),
            dry: graph.param(dry, "gain")?,
            wet: graph.param(send, "gain")?,
            variant: BypassVariant::Tailed,
        };
        Ok((TailedPorts { send, ret, output }, switch))
    }

    /// Build either variant; for `Tailed` the effect runs between the
    /// returned send and return nodes
    pub fn create(
        graph: &mut AudioGraph,
        input: NodeId,
        active: bool,
        variant: BypassVariant,
        wire_effect: impl FnOnce(&mut AudioGraph, NodeId) -> PedalResult<NodeId>,
    ) -> PedalResult<(NodeId, BypassSwitch)> {
        match variant {
            BypassVariant::Hard => {
                let wet_output = wire_effect(graph, input)?;
                Self::hard(graph, input, wet_output, active)
            }
            BypassVariant::Tailed => {
                let (ports, switch) = Self::tailed(graph, input, active)?;
                let wet_output = wire_effect(graph, ports.send)?;
                graph.connect(wet_output, ports.ret)?;
                Ok((ports.output, switch))
            }
        }
    }

    /// Flip, or set to `state`; returns the new state
    pub fn toggle(&self, state: Option<bool>) -> bool {
        let active = state.unwrap_or(!self.is_active());
        self.active.store(active, Ordering::Release);
        let (dry, wet) = gains(active);
        self.dry.set(dry);
        self.wet.set(wet);
        debug!(active, variant = ?self.variant, "bypass toggled");
        active
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn variant(&self) -> BypassVariant {
        self.variant
    }

    pub fn dry(&self) -> &ParamRef {
        &self.dry
    }

    /// The wet gain (the send gain for tailed switches)
    pub fn wet(&self) -> &ParamRef {
        &self.wet
    }
}

/// (dry, wet) for a state
fn gains(active: bool) -> (f32, f32) {
    if active {
        (0.0, 1.0)
    } else {
        (1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gains_complementary_through_toggles() {
        let mut graph = AudioGraph::new(44100.0);
        let input = graph.add_source();
        let effect = graph.add_node(GainNode::new(2.0));
        graph.connect(input, effect).unwrap();
        let (_, switch) = BypassSwitch::hard(&mut graph, input, effect, false).unwrap();

        for state in [None, None, Some(true), Some(true), Some(false), None] {
            switch.toggle(state);
            assert_eq!(switch.dry().get() + switch.wet().get(), 1.0);
            assert_eq!(switch.wet().get(), if switch.is_active() { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_double_toggle_restores() {
        let mut graph = AudioGraph::new(44100.0);
        let input = graph.add_source();
        let (_, switch) = BypassSwitch::tailed(&mut graph, input, true).unwrap();
        let before = switch.is_active();
        switch.toggle(None);
        switch.toggle(None);
        assert_eq!(switch.is_active(), before);
        assert_eq!(switch.variant(), BypassVariant::Tailed);
    }

    #[test]
    fn test_create_tailed_wires_effect_between_send_and_return() {
        let mut graph = AudioGraph::new(44100.0);
        let input = graph.add_source();
        let mut effect_node = None;
        let (output, _) = BypassSwitch::create(&mut graph, input, true, BypassVariant::Tailed, |g, send| {
            let effect = g.add_node(GainNode::new(0.5));
            g.connect(send, effect)?;
            effect_node = Some(effect);
            Ok(effect)
        })
        .unwrap();
        let effect = effect_node.unwrap();
        assert!(graph
            .connections()
            .iter()
            .any(|c| c.source == effect && c.destination.node() != output));
    }
}
