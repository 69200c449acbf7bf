//! Control bindings: named, range-checked handles onto live parameters
//!
//! Every effect unit exposes a fixed, ordered table of bindings. A binding
//! clamps whatever it is given to its domain and writes the result; it
//! never fails. The same binding serves knobs (`apply`), knob drags
//! (`nudge`) and MIDI expression pedals (`apply_controller`).

use crate::error::OutOfRangeWarning;
use crate::nodes::waveshaper::CurveHandle;
use crate::param::{ParamRef, SharedParam};
use tracing::debug;

/// What a binding writes to
#[derive(Clone)]
pub enum BindingTarget {
    /// One parameter
    Param(ParamRef),
    /// A mix knob: `dry` gets `1 - v`, `wet` gets `v`
    Complementary { dry: ParamRef, wet: ParamRef },
    /// The same value to several parameters
    Linked(Vec<ParamRef>),
    /// Rebuild a wave-shaper table from the value
    Curve {
        curve: CurveHandle,
        value: SharedParam,
        build: fn(f32) -> Vec<f32>,
    },
}

impl BindingTarget {
    fn write(&self, value: f32) {
        match self {
            BindingTarget::Param(param) => param.set(value),
            BindingTarget::Complementary { dry, wet } => {
                dry.set(1.0 - value);
                wet.set(value);
            }
            BindingTarget::Linked(params) => {
                for param in params {
                    param.set(value);
                }
            }
            BindingTarget::Curve {
                curve,
                value: stored,
                build,
            } => {
                stored.set(value);
                curve.store(build(value));
            }
        }
    }

    fn read(&self) -> f32 {
        match self {
            BindingTarget::Param(param) => param.get(),
            BindingTarget::Complementary { wet, .. } => wet.get(),
            BindingTarget::Linked(params) => params.first().map(|p| p.get()).unwrap_or(0.0),
            BindingTarget::Curve { value, .. } => value.get(),
        }
    }
}

/// Snapshot of a binding for display
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

/// A parameter bound to an external scalar with a domain and step
///
/// # Example
/// ```ignore
/// let mix = ControlBinding::bind("mix", BindingTarget::Param(param), 0.0..=1.0, 0.01);
/// mix.apply(5.0);   // stored value is 1.0, returns Some(OutOfRangeWarning)
/// ```
#[derive(Clone)]
pub struct ControlBinding {
    name: String,
    target: BindingTarget,
    min: f32,
    max: f32,
    step: f32,
    conversion: Option<fn(f32) -> f32>,
}

impl ControlBinding {
    pub fn bind(
        name: impl Into<String>,
        target: BindingTarget,
        domain: std::ops::RangeInclusive<f32>,
        step: f32,
    ) -> Self {
        let (min, max) = domain.into_inner();
        Self {
            name: name.into(),
            target,
            min: min.min(max),
            max: max.max(min),
            step: step.abs(),
            conversion: None,
        }
    }

    /// Shorthand for a single-parameter binding
    pub fn param(
        name: impl Into<String>,
        param: ParamRef,
        domain: std::ops::RangeInclusive<f32>,
        step: f32,
    ) -> Self {
        Self::bind(name, BindingTarget::Param(param), domain, step)
    }

    /// On/off switch (0 or 1)
    pub fn switch(name: impl Into<String>, param: ParamRef) -> Self {
        Self::param(name, param, 0.0..=1.0, 1.0).with_conversion(f32::round)
    }

    /// Apply `conversion` to incoming values before clamping
    pub fn with_conversion(mut self, conversion: fn(f32) -> f32) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn target(&self) -> &BindingTarget {
        &self.target
    }

    /// Current stored value
    pub fn value(&self) -> f32 {
        self.target.read()
    }

    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            name: self.name.clone(),
            value: self.value(),
            min: self.min,
            max: self.max,
            step: self.step,
        }
    }

    /// Clamp to the domain and write
    ///
    /// Returns a warning if the value had to be clamped; the clamped value is
    /// written either way.
    pub fn apply(&self, value: f32) -> Option<OutOfRangeWarning> {
        let converted = match self.conversion {
            Some(convert) => convert(value),
            None => value,
        };
        self.write_clamped(value, converted)
    }

    fn write_clamped(&self, requested: f32, value: f32) -> Option<OutOfRangeWarning> {
        let applied = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
        self.target.write(applied);

        if applied == value {
            return None;
        }
        let warning = OutOfRangeWarning {
            binding: self.name.clone(),
            requested,
            applied,
        };
        debug!("{}", warning);
        Some(warning)
    }

    /// Map a 0-127 controller value linearly onto the domain
    pub fn controller_value(&self, controller: u8) -> f32 {
        self.min + (controller as f32 / 127.0) * (self.max - self.min)
    }

    /// Write a 0-127 controller value, mapped linearly onto the domain
    pub fn apply_controller(&self, controller: u8) -> Option<OutOfRangeWarning> {
        self.write_clamped(controller as f32, self.controller_value(controller))
    }

    /// One knob-drag increment: a fiftieth of the range end, at least one step
    ///
    /// The increment is `max / 50`, or `-min / 50` for domains reaching
    /// below zero.
    pub fn nudge(&self, up: bool) -> Option<OutOfRangeWarning> {
        let span = if self.min < 0.0 {
            self.min / -50.0
        } else {
            self.max / 50.0
        };
        let diff = span.max(self.step);
        let value = self.value();
        self.write_clamped(value, if up { value + diff } else { value - diff })
    }

    /// Round to the nearest step above `min`
    pub fn snap(&self, value: f32) -> f32 {
        if self.step <= 0.0 {
            return value.clamp(self.min, self.max);
        }
        let steps = ((value - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AudioGraph;
    use crate::nodes::gain::GainNode;
    use crate::nodes::waveshaper::make_distortion_curve;

    fn gain_param(graph: &mut AudioGraph, value: f32) -> ParamRef {
        let node = graph.add_node(GainNode::new(value));
        graph.param(node, "gain").unwrap()
    }

    #[test]
    fn test_apply_clamps_both_ends() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 0.5);
        let binding = ControlBinding::param("level", param.clone(), 0.0..=1.0, 0.01);

        let warning = binding.apply(5.0).expect("clamped value should warn");
        assert_eq!(param.get(), 1.0);
        assert_eq!(warning.applied, 1.0);
        assert_eq!(warning.requested, 5.0);

        assert!(binding.apply(-5.0).is_some());
        assert_eq!(param.get(), 0.0);

        assert!(binding.apply(0.25).is_none());
        assert_eq!(param.get(), 0.25);
    }

    #[test]
    fn test_nan_goes_to_min() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 0.5);
        let binding = ControlBinding::param("level", param.clone(), 0.2..=1.0, 0.01);
        assert!(binding.apply(f32::NAN).is_some());
        assert_eq!(param.get(), 0.2);
    }

    #[test]
    fn test_controller_maps_linearly() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 1000.0);
        let binding = ControlBinding::param("filter", param.clone(), 100.0..=1500.0, 20.0);

        binding.apply_controller(64);
        let expected = 100.0 + (64.0 / 127.0) * 1400.0;
        assert!((param.get() - expected).abs() < 1e-3);

        binding.apply_controller(0);
        assert_eq!(param.get(), 100.0);
        binding.apply_controller(127);
        assert!((param.get() - 1500.0).abs() < 1e-3);
    }

    #[test]
    fn test_complementary_mix() {
        let mut graph = AudioGraph::new(44100.0);
        let dry = gain_param(&mut graph, 1.0);
        let wet = gain_param(&mut graph, 0.0);
        let binding = ControlBinding::bind(
            "mix",
            BindingTarget::Complementary {
                dry: dry.clone(),
                wet: wet.clone(),
            },
            0.0..=1.0,
            0.01,
        );
        binding.apply(0.3);
        assert!((dry.get() - 0.7).abs() < 1e-6);
        assert!((wet.get() - 0.3).abs() < 1e-6);
        assert!((binding.value() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_nudge_uses_fiftieth_of_range() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 1.0);
        let binding = ControlBinding::param("boost", param.clone(), 0.0..=3.0, 0.01);
        binding.nudge(true);
        assert!((param.get() - 1.06).abs() < 1e-5);

        // Domain below zero: -min / 50
        let bass = gain_param(&mut graph, 0.0);
        let bass = ControlBinding::param("bass", bass, -4.0..=5.0, 0.25);
        bass.nudge(false);
        // 4 / 50 = 0.08 < step 0.25
        assert!((bass.value() + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_switch_rounds() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 1.0);
        let on = ControlBinding::switch("on", param.clone());
        on.apply(0.2);
        assert_eq!(param.get(), 0.0);
        on.apply(0.7);
        assert_eq!(param.get(), 1.0);
    }

    #[test]
    fn test_curve_binding_rebuilds_table() {
        let curve = CurveHandle::new(make_distortion_curve(15.0));
        let binding = ControlBinding::bind(
            "drive",
            BindingTarget::Curve {
                curve: curve.clone(),
                value: SharedParam::new(15.0),
                build: make_distortion_curve,
            },
            0.0..=100.0,
            0.01,
        );
        binding.apply(80.0);
        assert_eq!(binding.value(), 80.0);
        assert_eq!(*curve.load(), make_distortion_curve(80.0));
    }

    #[test]
    fn test_snap() {
        let mut graph = AudioGraph::new(44100.0);
        let param = gain_param(&mut graph, 0.0);
        let binding = ControlBinding::param("tone", param, 200.0..=6000.0, 200.0);
        assert_eq!(binding.snap(3290.0), 3200.0);
        assert_eq!(binding.snap(9999.0), 6000.0);
    }
}
