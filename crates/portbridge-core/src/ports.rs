//! Capture/playback port sets and their all-or-nothing registration.
//!
//! A [`PortSet`] maps logical channel indices to host ports for one
//! [`Direction`]. Port sets are only ever produced by [`register_all`], which
//! either returns both sets fully registered or rolls back every port it
//! created and returns the registration error.
//!
//! ## Naming
//!
//! Ports are named `capture_<n>` and `playback_<n>` with `n` starting at 1,
//! contiguous, in channel order.
//!
//! ## Rollback
//!
//! Registration runs inside a guard that owns the partially built sets. If
//! the guard is dropped before it commits (a registration failed, or the
//! caller unwound), it releases everything registered so far: capture
//! first, then playback.

use crate::graph::{PortFlow, PortGraph, PortId};
use crate::{Error, Result};

/// Logical direction of a port set, from the adapter's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Audio captured by the device and fed into the host graph.
    Capture,
    /// Audio taken from the host graph and played by the device.
    Playback,
}

impl Direction {
    /// Port name prefix for this direction.
    pub fn prefix(self) -> &'static str {
        match self {
            Direction::Capture => "capture",
            Direction::Playback => "playback",
        }
    }

    /// Host-side flow of ports in this direction.
    ///
    /// Capture ports produce audio into the graph, so the host sees them as
    /// outputs; playback ports are inputs.
    pub fn flow(self) -> PortFlow {
        match self {
            Direction::Capture => PortFlow::Output,
            Direction::Playback => PortFlow::Input,
        }
    }
}

/// Name of the port for zero-based channel `index` in `direction`.
pub fn port_name(direction: Direction, index: usize) -> String {
    format!("{}_{}", direction.prefix(), index + 1)
}

/// Ordered host port handles for one direction.
///
/// Slots are emptied as ports are released, so releasing twice never
/// unregisters a port twice.
#[derive(Debug, PartialEq, Eq)]
pub struct PortSet {
    direction: Direction,
    slots: Vec<Option<PortId>>,
}

impl PortSet {
    fn with_capacity(direction: Direction, channels: usize) -> Self {
        Self {
            direction,
            slots: Vec::with_capacity(channels),
        }
    }

    /// Direction of every port in this set.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of channel slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the set has no channel slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Port bound to channel `index`, if the slot is still populated.
    pub fn port(&self, index: usize) -> Option<PortId> {
        self.slots.get(index).copied().flatten()
    }

    /// Handles of the populated slots, in channel order.
    pub fn ids(&self) -> impl Iterator<Item = PortId> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    /// Whether every slot holds a port.
    pub fn is_fully_registered(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Whether every slot is empty.
    pub fn is_released(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Empty the slots whose ports the host no longer has registered.
    ///
    /// Returns the number of slots cleared. Nothing is unregistered.
    pub fn prune(&mut self, graph: &dyn PortGraph) -> usize {
        let mut cleared = 0;
        for slot in &mut self.slots {
            if let Some(port) = *slot
                && !graph.is_registered(port)
            {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Unregister every populated slot in channel order and empty it.
    ///
    /// Empty slots are skipped. An unregister failure is logged and the
    /// sweep continues. Returns the number of ports unregistered.
    pub fn release(&mut self, graph: &dyn PortGraph) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(port) = slot.take() else {
                continue;
            };
            match graph.unregister_port(port) {
                Ok(()) => {
                    tracing::debug!(port = %port_name(self.direction, index), "port unregistered");
                    released += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        port = %port_name(self.direction, index),
                        error = %e,
                        "failed to unregister port"
                    );
                }
            }
        }
        released
    }
}

/// Registration in progress. Rolls back on drop unless committed.
struct Registration<'g> {
    graph: &'g dyn PortGraph,
    capture: PortSet,
    playback: PortSet,
    committed: bool,
}

impl<'g> Registration<'g> {
    fn new(graph: &'g dyn PortGraph, capture: usize, playback: usize) -> Self {
        Self {
            graph,
            capture: PortSet::with_capacity(Direction::Capture, capture),
            playback: PortSet::with_capacity(Direction::Playback, playback),
            committed: false,
        }
    }

    fn register(&mut self, direction: Direction, count: usize) -> Result<()> {
        for index in 0..count {
            let name = port_name(direction, index);
            let port = self
                .graph
                .register_port(&name, direction.flow())
                .map_err(|source| Error::Registration {
                    port: name.clone(),
                    source,
                })?;
            tracing::debug!(port = %name, id = %port, flow = %direction.flow(), "port registered");

            let set = match direction {
                Direction::Capture => &mut self.capture,
                Direction::Playback => &mut self.playback,
            };
            set.slots.push(Some(port));
        }
        Ok(())
    }

    fn commit(mut self) -> (PortSet, PortSet) {
        self.committed = true;
        let capture = std::mem::replace(
            &mut self.capture,
            PortSet::with_capacity(Direction::Capture, 0),
        );
        let playback = std::mem::replace(
            &mut self.playback,
            PortSet::with_capacity(Direction::Playback, 0),
        );
        (capture, playback)
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let released = release_all(self.graph, &mut self.capture, &mut self.playback);
        tracing::warn!(released, "port registration rolled back");
    }
}

/// Register `capture` capture ports and `playback` playback ports.
///
/// Capture ports are registered first, then playback ports, each in channel
/// order. On the first failure the remaining registrations are skipped, every
/// port registered so far is unregistered, and the error is returned. No
/// retries are attempted.
pub fn register_all(
    graph: &dyn PortGraph,
    capture: usize,
    playback: usize,
) -> Result<(PortSet, PortSet)> {
    let mut registration = Registration::new(graph, capture, playback);
    registration.register(Direction::Capture, capture)?;
    registration.register(Direction::Playback, playback)?;
    Ok(registration.commit())
}

/// Release both sets: every populated capture slot, then every populated
/// playback slot, each iterated over its own length.
///
/// Returns the number of ports unregistered.
pub fn release_all(graph: &dyn PortGraph, capture: &mut PortSet, playback: &mut PortSet) -> usize {
    capture.release(graph) + playback.release(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;
    use crate::memory::MemoryGraph;

    #[test]
    fn names_are_one_based() {
        assert_eq!(port_name(Direction::Capture, 0), "capture_1");
        assert_eq!(port_name(Direction::Playback, 9), "playback_10");
    }

    #[test]
    fn capture_ports_are_host_outputs() {
        assert_eq!(Direction::Capture.flow(), PortFlow::Output);
        assert_eq!(Direction::Playback.flow(), PortFlow::Input);
    }

    #[test]
    fn register_all_populates_both_sets() {
        let graph = MemoryGraph::new();
        let (capture, playback) = register_all(&graph, 2, 3).unwrap();

        assert_eq!(capture.len(), 2);
        assert_eq!(playback.len(), 3);
        assert!(capture.is_fully_registered());
        assert!(playback.is_fully_registered());
        assert_eq!(
            graph.port_names(),
            vec!["capture_1", "capture_2", "playback_1", "playback_2", "playback_3"]
        );
        for port in graph.ports() {
            let expected = if port.name.starts_with("capture") {
                PortFlow::Output
            } else {
                PortFlow::Input
            };
            assert_eq!(port.flow, expected, "{}", port.name);
        }
    }

    #[test]
    fn zero_channels_is_valid() {
        let graph = MemoryGraph::new();
        let (capture, playback) = register_all(&graph, 0, 0).unwrap();
        assert!(capture.is_empty());
        assert!(playback.is_empty());
        assert!(graph.ports().is_empty());
    }

    #[test]
    fn playback_failure_rolls_back_capture_first() {
        let graph = MemoryGraph::new();
        graph.refuse_port("playback_2");

        let err = register_all(&graph, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration { ref port, source: GraphError::Refused(_) } if port == "playback_2"
        ));
        assert!(graph.ports().is_empty());

        // capture_1, capture_2, then playback_1
        assert_eq!(
            graph.unregister_log(),
            vec![PortId(1), PortId(2), PortId(3)]
        );
    }

    #[test]
    fn release_skips_empty_slots() {
        let graph = MemoryGraph::new();
        let (mut capture, mut playback) = register_all(&graph, 2, 2).unwrap();

        assert_eq!(release_all(&graph, &mut capture, &mut playback), 4);
        assert!(capture.is_released());
        assert!(playback.is_released());
        assert_eq!(release_all(&graph, &mut capture, &mut playback), 0);
        assert_eq!(graph.unregister_log().len(), 4);
    }

    #[test]
    fn prune_clears_ports_removed_by_host() {
        let graph = MemoryGraph::new();
        let (mut capture, _playback) = register_all(&graph, 3, 0).unwrap();
        let second = capture.port(1).unwrap();

        graph.unregister_port(second).unwrap();
        assert_eq!(capture.prune(&graph), 1);
        assert_eq!(capture.port(1), None);
        assert!(capture.port(0).is_some());
        assert!(!capture.is_fully_registered());
    }

    #[test]
    fn playback_released_by_its_own_count() {
        let graph = MemoryGraph::new();
        let (mut capture, mut playback) = register_all(&graph, 1, 4).unwrap();
        release_all(&graph, &mut capture, &mut playback);
        assert!(playback.is_released());
        assert!(graph.ports().is_empty());
    }
}
