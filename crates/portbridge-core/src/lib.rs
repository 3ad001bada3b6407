//! Port-set lifecycle and backend device contract for portbridge.
//!
//! This crate provides:
//!
//! - **Host graph abstraction**: [`PortGraph`], the register/unregister/query
//!   surface of a host audio engine, plus [`MemoryGraph`], an in-process
//!   implementation
//! - **Port sets**: [`register_all`] and [`release_all`], all-or-nothing
//!   registration of `capture_N` / `playback_N` ports
//! - **Device contract**: [`BackendDevice`], the object-safe open/close/process
//!   interface every backend implements
//! - **Adapter**: [`IoAdapter`], which owns one device and its port sets
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portbridge_core::{IoAdapter, MemoryGraph};
//! use std::sync::Arc;
//!
//! let graph = Arc::new(MemoryGraph::new().with_physical_ports(2, 2));
//! let mut adapter = IoAdapter::new(graph.clone(), Box::new(my_device), 2, 2)?;
//! adapter.open()?;
//! // host runs, calling adapter.process(...) once per block
//! adapter.close()?;
//! ```

mod adapter;
mod device;
mod graph;
mod memory;
mod ports;

pub use adapter::IoAdapter;
pub use device::{BackendDevice, DeviceConfig, DeviceError};
pub use graph::{GraphError, PortFlow, PortGraph, PortId};
pub use memory::{MemoryGraph, RegisteredPort};
pub use ports::{Direction, PortSet, port_name, register_all, release_all};

/// Error types for adapter construction and lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host refused to register a port. Every port registered before it
    /// has already been released.
    #[error("failed to register port '{port}': {source}")]
    Registration {
        /// Name of the port that could not be registered.
        port: String,
        /// Reason given by the host.
        #[source]
        source: GraphError,
    },

    /// The backend device failed to open or close.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl Error {
    /// Nonzero integer status for host boundaries.
    pub fn status(&self) -> i32 {
        match self {
            Error::Registration { .. } => 1,
            Error::Device(e) => e.status(),
        }
    }
}

/// Convenience result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
