//! # Pedalboard - Guitar Effect Chains
//!
//! A routing, modulation and control-binding engine for a chain of guitar
//! pedals. Each pedal assembles a small audio subgraph (filters, delays,
//! shapers, convolution, a looper tape) between one input and one output;
//! the chain threads them in order and every unit exposes a bypass switch
//! and a table of named control bindings.
//!
//! ## Core Features
//!
//! - **Validated graph**: every connection is checked; a loop must pass
//!   through a delay-providing node or it is rejected
//! - **LFO modulation**: oscillators driving parameters at audio rate,
//!   including antiphase pairs sharing one frequency
//! - **Bypass switching**: hard (dry/wet flip) and tailed (echoes ring out)
//! - **Control bindings**: knob values mapped onto parameter domains,
//!   complementary dry/wet pairs, linked groups, curve regeneration
//! - **Looper**: record, overdub, stop and clear over a merged tape node
//! - **MIDI control**: notes toggle pedals, a controller sweeps expression
//!   targets
//!
//! ## Quick Start
//!
//! ```ignore
//! use pedalboard::{Frame, Pedalboard, PedalboardConfig, ControlEvent};
//!
//! let config = PedalboardConfig::from_toml_str(r#"chain = ["wah", "delay"]"#)?;
//! let (mut processor, mut control) = Pedalboard::new(&config)?.into_parts();
//!
//! control.route(ControlEvent::Note { index: 1 })?; // wah on
//! control.route(ControlEvent::Controller { value: 64 })?; // sweep
//!
//! let input = vec![Frame::mono(0.1); 256];
//! let mut output = vec![Frame::SILENCE; 256];
//! processor.process_block(&input, &mut output);
//! ```

pub mod audio;
pub mod audio_node;
pub mod binding;
pub mod block_processor;
pub mod bypass;
pub mod chain;
pub mod config;
pub mod dependency_graph;
pub mod error;
pub mod graph;
pub mod impulse;
pub mod looper;
pub mod midi_input;
pub mod modulation;
pub mod nodes;
pub mod param;
pub mod pedalboard;
pub mod pedals;
pub mod router;

pub use audio_node::{AudioNode, Frame, NodeId};
pub use binding::{BindingInfo, BindingTarget, ControlBinding};
pub use block_processor::{BlockProcessor, RunFlag};
pub use bypass::{BypassSwitch, TailedPorts};
pub use chain::{AssemblyFailure, ChainAssembly, EffectChain};
pub use config::PedalboardConfig;
pub use error::{
    GraphCycleError, MissingResourceWarning, OutOfRangeWarning, PedalError, PedalResult,
    UnroutableControlEvent,
};
pub use graph::AudioGraph;
pub use impulse::{ImpulseProvider, ImpulseResponse, NoImpulse, Space, SyntheticImpulse};
pub use looper::{Looper, LooperCommand, LooperController, LooperState};
pub use modulation::{AntiphaseLfo, Lfo, LfoSettings};
pub use param::{ParamRef, SharedParam};
pub use pedalboard::{BoardSettings, Pedalboard, PedalboardControl};
pub use pedals::{BuildContext, EffectUnit, Pedal, PedalKind};
pub use router::{ControlEvent, ControlRouter, LooperNotes, Routed};
