//! Lock-free parameter storage
//!
//! Each node parameter is an `f32` stored as bits in an `AtomicU32`. The
//! control thread writes, the render thread reads, nobody waits.

use crate::audio_node::NodeId;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One live scalar shared between control and render threads
#[derive(Clone)]
pub struct SharedParam(Arc<AtomicU32>);

impl SharedParam {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// True when both handles point at the same storage
    pub fn same_as(&self, other: &SharedParam) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedParam({})", self.get())
    }
}

/// Handle to a named parameter of a node in an `AudioGraph`
///
/// Obtained from `AudioGraph::param`. Setting it only updates the stored
/// value; the render thread picks it up on the next frame.
#[derive(Debug, Clone)]
pub struct ParamRef {
    node: NodeId,
    index: usize,
    name: &'static str,
    value: SharedParam,
}

impl ParamRef {
    pub(crate) fn new(node: NodeId, index: usize, name: &'static str, value: SharedParam) -> Self {
        Self {
            node,
            index,
            name,
            value,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Base value (without modulation)
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    pub fn set(&self, value: f32) {
        self.value.set(value);
    }

    pub fn shared(&self) -> &SharedParam {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_param_roundtrip_across_clones() {
        let param = SharedParam::new(0.25);
        let other = param.clone();
        other.set(-3.5);
        assert_eq!(param.get(), -3.5);
        assert!(param.same_as(&other));
        assert!(!param.same_as(&SharedParam::new(-3.5)));
    }

    #[test]
    fn test_shared_param_across_threads() {
        let param = SharedParam::new(0.0);
        let writer = param.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..1000 {
                writer.set(i as f32);
            }
        });
        handle.join().unwrap();
        assert_eq!(param.get(), 999.0);
    }
}
