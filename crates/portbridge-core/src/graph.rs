//! Host port-graph abstraction.
//!
//! The host audio engine owns a namespace of named, directional audio ports.
//! The adapter only ever consumes a handful of operations on that namespace:
//! register, unregister, count physical ports, and read the engine's block
//! size and sample rate. [`PortGraph`] captures exactly that surface so the
//! rest of the crate never depends on a particular host API.
//!
//! ## Direction convention
//!
//! [`PortFlow`] is expressed from the *host's* perspective:
//!
//! - [`PortFlow::Output`]: the port produces audio into the graph. Capture
//!   ports are registered as outputs, and physical outputs are capture
//!   sources (microphones, line inputs of the sound card).
//! - [`PortFlow::Input`]: the port consumes audio from the graph. Playback
//!   ports are registered as inputs, and physical inputs are playback sinks.

use std::fmt;

/// Direction of a port, as seen by the host graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortFlow {
    /// The port consumes audio from the graph.
    Input,
    /// The port produces audio into the graph.
    Output,
}

impl fmt::Display for PortFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortFlow::Input => f.pad("input"),
            PortFlow::Output => f.pad("output"),
        }
    }
}

/// Opaque handle to a port registered in the host graph.
///
/// The host, not the adapter, is the source of truth for port identity; a
/// `PortId` is only meaningful to the graph that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u64);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port#{}", self.0)
    }
}

/// Reasons a host graph refuses a port operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A port with this name is already registered by the client.
    #[error("port name already in use: {0}")]
    NameInUse(String),

    /// The host has no room for another port.
    #[error("port limit reached ({0} ports)")]
    Exhausted(usize),

    /// The client session is closed or otherwise unusable.
    #[error("host client is not active")]
    ClientInactive,

    /// The handle does not refer to a port owned by this client.
    #[error("unknown port: {0}")]
    UnknownPort(PortId),

    /// Host-specific refusal.
    #[error("host refused port operation: {0}")]
    Refused(String),
}

/// The subset of a host audio engine's client API used by the adapter.
///
/// Implementations wrap one client session of the host. Methods take `&self`
/// because host client handles are shared between the control thread and
/// teardown paths; implementations provide their own interior synchronization.
pub trait PortGraph: Send + Sync {
    /// Register a new audio port named `name` with direction `flow`.
    fn register_port(&self, name: &str, flow: PortFlow) -> Result<PortId, GraphError>;

    /// Unregister a port previously returned by [`register_port`](Self::register_port).
    fn unregister_port(&self, port: PortId) -> Result<(), GraphError>;

    /// Names of the hardware-backed ports with direction `flow`.
    ///
    /// Only the length of the result is used by the adapter.
    fn physical_ports(&self, flow: PortFlow) -> Vec<String>;

    /// Host processing block size in frames.
    fn buffer_size(&self) -> u32;

    /// Host sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Whether `port` is still registered with the host.
    fn is_registered(&self, port: PortId) -> bool;
}
