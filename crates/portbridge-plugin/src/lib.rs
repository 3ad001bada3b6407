//! Host entry points for portbridge audio adapters.
//!
//! This crate is the boundary a host engine talks to when it loads the
//! adapter as an in-process client:
//!
//! | Host call | Function |
//! |-----------|----------|
//! | load with init string | [`initialize`] / [`initialize_status`] |
//! | per-block callback | [`AdapterHandle::process`] |
//! | unload | [`finalize`] |
//!
//! `initialize` sizes the adapter from the host's physical port counts
//! (never below two channels per direction), builds the
//! configured backend device, registers the adapter's ports and opens the
//! device. It either returns a running [`AdapterHandle`] or an error with
//! nothing left registered.
//!
//! # Example
//!
//! ```rust,ignore
//! use portbridge_core::MemoryGraph;
//! use portbridge_plugin::{finalize, initialize};
//! use std::sync::Arc;
//!
//! let graph = Arc::new(MemoryGraph::new().with_physical_ports(2, 2));
//! let handle = initialize(graph.clone(), r#"device = "virtual""#)?;
//! // ...host runs...
//! graph.close_client();
//! finalize(Some(handle));
//! ```

mod entry;

pub use entry::{
    AdapterHandle, ChannelCounts, STEREO_FLOOR, derive_channels, finalize, initialize,
    initialize_status, initialize_with, select_device,
};

use portbridge_config::ConfigError;
use portbridge_core::DeviceError;

/// Errors reported to the host when loading fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The init string or configuration file is invalid.
    #[error("invalid adapter configuration: {0}")]
    Config(#[from] ConfigError),

    /// Port registration failed; no ports were left registered.
    #[error(transparent)]
    Adapter(#[from] portbridge_core::Error),

    /// The backend device failed to open; the adapter was unloaded.
    #[error("device failed to open: {0}")]
    Open(#[source] DeviceError),
}

impl Error {
    /// Nonzero integer status for hosts that only understand codes.
    pub fn status(&self) -> i32 {
        match self {
            Error::Config(_) => 1,
            Error::Adapter(e) => e.status(),
            Error::Open(e) => e.status(),
        }
    }
}

/// Convenience result type for entry points.
pub type Result<T> = std::result::Result<T, Error>;
