//! Backend devices for portbridge adapters.
//!
//! This crate provides the concrete [`BackendDevice`](portbridge_core::BackendDevice)
//! variants an adapter can own:
//!
//! - **Hardware**: [`CpalDevice`], the platform sound card through cpal
//!   (ALSA, CoreAudio, WASAPI)
//! - **Virtual**: [`VirtualDevice`], a software loopback with no external I/O
//!
//! Other backends, such as network transports, only need to implement the
//! trait to be driven by the same adapter.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portbridge_core::{BackendDevice, DeviceConfig};
//! use portbridge_io::CpalDevice;
//!
//! let mut device = CpalDevice::new(DeviceConfig::default(), Some("USB".into()));
//! device.open()?;
//! ```

mod cpal_device;
mod interleave;
mod virtual_device;

pub use cpal_device::CpalDevice;
pub use virtual_device::VirtualDevice;
