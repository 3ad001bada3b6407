//! In-process host graph.
//!
//! [`MemoryGraph`] implements [`PortGraph`] entirely in memory. It is used by
//! the `portbridge` CLI to bring up an adapter without a running audio server
//! and by the test suites, which rely on its fault injection
//! ([`refuse_port`](MemoryGraph::refuse_port)) and its unregister log.

use crate::graph::{GraphError, PortFlow, PortGraph, PortId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};

/// A port currently registered in a [`MemoryGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPort {
    /// Handle issued at registration.
    pub id: PortId,
    /// Short port name (without client prefix).
    pub name: String,
    /// Direction from the host's perspective.
    pub flow: PortFlow,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    ports: BTreeMap<PortId, RegisteredPort>,
    refused: HashSet<String>,
    unregistered: Vec<PortId>,
    active: bool,
}

/// In-memory [`PortGraph`] for one client session.
#[derive(Debug)]
pub struct MemoryGraph {
    physical_outputs: Vec<String>,
    physical_inputs: Vec<String>,
    buffer_size: u32,
    sample_rate: u32,
    max_ports: Option<usize>,
    state: Mutex<State>,
}

impl MemoryGraph {
    /// Create a graph with no physical ports, 512-frame blocks at 48 kHz.
    pub fn new() -> Self {
        Self {
            physical_outputs: Vec::new(),
            physical_inputs: Vec::new(),
            buffer_size: 512,
            sample_rate: 48000,
            max_ports: None,
            state: Mutex::new(State {
                active: true,
                ..State::default()
            }),
        }
    }

    /// Expose `outputs` physical capture sources and `inputs` physical
    /// playback sinks, named `system:capture_N` / `system:playback_N`.
    pub fn with_physical_ports(mut self, outputs: usize, inputs: usize) -> Self {
        self.physical_outputs = (1..=outputs).map(|i| format!("system:capture_{i}")).collect();
        self.physical_inputs = (1..=inputs).map(|i| format!("system:playback_{i}")).collect();
        self
    }

    /// Set the host block size in frames.
    pub fn with_buffer_size(mut self, frames: u32) -> Self {
        self.buffer_size = frames;
        self
    }

    /// Set the host sample rate in Hz.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Refuse registrations once `max` ports are registered.
    pub fn with_port_limit(mut self, max: usize) -> Self {
        self.max_ports = Some(max);
        self
    }

    /// Make every future registration of `name` fail.
    pub fn refuse_port(&self, name: impl Into<String>) {
        self.state.lock().refused.insert(name.into());
    }

    /// Ports currently registered, in registration order.
    pub fn ports(&self) -> Vec<RegisteredPort> {
        self.state.lock().ports.values().cloned().collect()
    }

    /// Names of the ports currently registered, in registration order.
    pub fn port_names(&self) -> Vec<String> {
        self.state.lock().ports.values().map(|p| p.name.clone()).collect()
    }

    /// Every handle passed to a successful unregister, in call order.
    pub fn unregister_log(&self) -> Vec<PortId> {
        self.state.lock().unregistered.clone()
    }

    /// Host-side teardown: drop every port of this client and deactivate it.
    ///
    /// This is what the host does on client shutdown before the adapter is
    /// destroyed. Ports removed here do not appear in the unregister log.
    pub fn close_client(&self) {
        let mut state = self.state.lock();
        state.ports.clear();
        state.active = false;
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PortGraph for MemoryGraph {
    fn register_port(&self, name: &str, flow: PortFlow) -> Result<PortId, GraphError> {
        let mut state = self.state.lock();

        if !state.active {
            return Err(GraphError::ClientInactive);
        }
        if state.refused.contains(name) {
            return Err(GraphError::Refused(format!("registration of '{name}' refused")));
        }
        if state.ports.values().any(|p| p.name == name) {
            return Err(GraphError::NameInUse(name.to_string()));
        }
        if let Some(max) = self.max_ports
            && state.ports.len() >= max
        {
            return Err(GraphError::Exhausted(max));
        }

        state.next_id += 1;
        let id = PortId(state.next_id);
        state.ports.insert(
            id,
            RegisteredPort {
                id,
                name: name.to_string(),
                flow,
            },
        );
        Ok(id)
    }

    fn unregister_port(&self, port: PortId) -> Result<(), GraphError> {
        let mut state = self.state.lock();
        if state.ports.remove(&port).is_none() {
            return Err(GraphError::UnknownPort(port));
        }
        state.unregistered.push(port);
        Ok(())
    }

    fn physical_ports(&self, flow: PortFlow) -> Vec<String> {
        match flow {
            PortFlow::Output => self.physical_outputs.clone(),
            PortFlow::Input => self.physical_inputs.clone(),
        }
    }

    fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_registered(&self, port: PortId) -> bool {
        self.state.lock().ports.contains_key(&port)
    }
}
