//! Configuration for portbridge adapters.
//!
//! The host hands the adapter an init string at load time. This crate turns
//! that string (or a TOML file) into an [`AdapterConfig`], which selects the
//! backend [`DeviceKind`] and, for hardware, which sound card to open.
//!
//! # Example
//!
//! ```rust
//! use portbridge_config::{AdapterConfig, DeviceKind};
//!
//! let config = AdapterConfig::parse(r#"device = "virtual""#).unwrap();
//! assert_eq!(config.device, DeviceKind::Virtual);
//! assert!(config.device_name.is_none());
//! ```

mod adapter_config;
mod error;

pub use adapter_config::{AdapterConfig, DeviceKind};
pub use error::ConfigError;
